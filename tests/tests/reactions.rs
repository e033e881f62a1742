use folio_client::{
    api::{Category, ListQuery, ModelName, ObjectId, ReactionKind, Scope, ToggleAction},
    FetchError,
};
use folio_mock_server::{Call, MockServer, Seed};
use rand::{rngs::StdRng, SeedableRng};
use tests::{article, Fixture};

fn server_with_news() -> MockServer {
    let mut rng = StdRng::seed_from_u64(7);
    let news = Category::by_key("news").unwrap();
    MockServer::from_seed(Seed {
        articles: vec![article(&mut rng, news, 1), article(&mut rng, news, 2)],
        comments: Vec::new(),
    })
    .unwrap()
}

#[tokio::test]
async fn like_twice_creates_then_removes() {
    let f = Fixture::new(server_with_news());
    let reactions = f.reactions();
    let news = ModelName::new("news");

    let first = reactions
        .toggle(&news, ObjectId(1), ReactionKind::Like)
        .await
        .unwrap();
    assert_eq!(first.action, ToggleAction::Created);
    assert_eq!(reactions.current(&news, ObjectId(1)), first.current);
    assert_eq!(first.likes, Some(1));

    let second = reactions
        .toggle(&news, ObjectId(1), ReactionKind::Like)
        .await
        .unwrap();
    assert_eq!(second.action, ToggleAction::Removed);
    assert_eq!(reactions.current(&news, ObjectId(1)), None);
    assert_eq!(second.likes, Some(0));
}

#[tokio::test]
async fn counts_come_from_the_server() {
    let f = Fixture::new(server_with_news());
    let other = Fixture::with_session(f.server.clone(), "someone else");
    let news = ModelName::new("news");

    assert_eq!(f.articles.article("news", ObjectId(2)).await.unwrap().likes, 0);
    other
        .reactions()
        .toggle(&news, ObjectId(2), ReactionKind::Like)
        .await
        .unwrap();
    // not invalidated on this client yet
    assert_eq!(f.articles.article("news", ObjectId(2)).await.unwrap().likes, 0);

    let reactions = f.reactions();
    reactions
        .toggle(&news, ObjectId(2), ReactionKind::Dislike)
        .await
        .unwrap();
    let a = f.articles.article("news", ObjectId(2)).await.unwrap();
    assert_eq!((a.likes, a.dislikes), (1, 1));
    assert_eq!(reactions.current(&news, ObjectId(2)), Some(ReactionKind::Dislike));

    let page = f.articles
        .list("news", &ListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.count, 2);
    let fetches = f
        .transport
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::FetchArticle("news", ObjectId(2))))
        .count();
    assert_eq!(fetches, 2);
}

#[tokio::test]
async fn unknown_objects() {
    let f = Fixture::new(server_with_news());
    let reactions = f.reactions();
    assert!(reactions
        .toggle(&ModelName::new("news"), ObjectId(9), ReactionKind::Like)
        .await
        .is_err());
    assert!(reactions
        .toggle(&ModelName::new("novel"), ObjectId(1), ReactionKind::Like)
        .await
        .is_err());
    assert!(matches!(
        f.articles.article("novels", ObjectId(1)).await,
        Err(FetchError::ScopeNotFound(_))
    ));
    // comments of unknown models are simply empty
    let tree = f.store.read(&Scope::new("novel", 1)).await.unwrap();
    assert!(tree.is_empty());
}
