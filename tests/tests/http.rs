use std::{rc::Rc, sync::Arc};

use folio_client::{
    api::{
        self, CommentId, ListQuery, ModelName, ObjectId, Ordering, ReactionKind, Scope, SortField,
        ToggleAction,
    },
    ArticleStore, ClientConfig, CommentStore, FetchError, HttpTransport, MutationCoordinator,
    Reactions, SubmitError, TransportError,
};
use folio_mock_server::{spawn, MockServer};
use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::Mutex;

fn client() -> (Rc<HttpTransport>, ArticleStore<HttpTransport>, CommentStore<HttpTransport>) {
    tests::init_tracing();
    let mut rng = StdRng::seed_from_u64(42);
    let seed = tests::seed(&mut rng, 3, 10);
    let server = MockServer::from_seed(seed).unwrap();
    let addr = spawn(Arc::new(Mutex::new(server))).unwrap();
    let config = ClientConfig::new(format!("http://{addr}/api/"));
    let transport = Rc::new(HttpTransport::new(&config).unwrap());
    (
        transport.clone(),
        ArticleStore::new(transport.clone()),
        CommentStore::new(transport),
    )
}

#[tokio::test]
async fn comments_over_http() {
    let (transport, _, store) = client();
    assert!(transport.api_base().ends_with("/api"));
    let scope = Scope::new("bookinfo", 2);
    let tree = store.read(&scope).await.unwrap();
    assert_eq!(tree.len(), 10);

    let coord = MutationCoordinator::new(store.clone());
    let parent = tree.roots()[0].id;
    let reply = coord
        .submit(&scope, "over the wire", "", Some(parent))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply.nickname, api::DEFAULT_NICKNAME);
    let tree = store.read(&scope).await.unwrap();
    assert_eq!(tree.len(), 11);
    assert_eq!(tree.find(parent).unwrap().replies[0].id, reply.id);

    let err = coord
        .submit(&scope, "lost", "", Some(CommentId(-1)))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::ValidationRejected(api::Error::Invalid(_))));

    let err = coord
        .submit(&Scope::new("novel", 1), "nowhere", "", None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SubmitError::ValidationRejected(api::Error::ScopeNotFound(String::from("novel")))
    );
}

#[tokio::test]
async fn articles_and_reactions_over_http() {
    let (_, articles, _) = client();
    let page = articles
        .list("papers", &ListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.count, 3);
    assert_eq!(page.next, None);

    let err = articles
        .list("papers", &ListQuery::page(2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FetchError::Transport {
            source: TransportError::Api(api::Error::NotFound(_)),
            ..
        }
    ));

    let before = articles.article("papers", ObjectId(1)).await.unwrap();
    let reactions = Reactions::new(articles.clone());
    let paper = ModelName::new("paper");
    let r = reactions
        .toggle(&paper, ObjectId(1), ReactionKind::Like)
        .await
        .unwrap();
    assert_eq!(r.action, ToggleAction::Created);
    let after = articles.article("papers", ObjectId(1)).await.unwrap();
    assert_eq!(after.likes, before.likes + 1);
    assert_eq!(after.total_views, before.total_views + 1);
}

#[tokio::test]
async fn article_search_and_ordering_over_http() {
    let (_, articles, _) = client();
    let by_views = ListQuery::default().ordering(Ordering::desc(SortField::TotalViews));
    let all = articles.list("news", &by_views).await.unwrap();
    assert_eq!(all.count, 3);
    let views = all
        .results
        .iter()
        .map(|a| a.total_views)
        .collect::<Vec<_>>();
    assert!(views.windows(2).all(|w| w[0] >= w[1]), "{views:?}");

    let target = articles.article("news", all.results[2].id).await.unwrap();
    let word = target.title.split_whitespace().last().unwrap();
    let found = articles
        .list("news", &by_views.clone().search(&word.to_uppercase()))
        .await
        .unwrap();
    assert!(found.results.iter().any(|a| a.id == target.id));

    let none = ListQuery::default().search("zzzz-no-such-word");
    assert_eq!(articles.list("news", &none).await.unwrap().count, 0);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let config = ClientConfig::new("http://127.0.0.1:9/api");
    let store = CommentStore::new(Rc::new(HttpTransport::new(&config).unwrap()));
    let scope = Scope::new("news", 1);
    let _attached = store.attach(scope.clone());
    let err = store.load(&scope).await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::Transport {
            source: TransportError::Network(_),
            ..
        }
    ));
    assert_eq!(store.snapshot(&scope).unwrap().error, Some(err));
}
