use folio_client::{
    api::{self, CommentId, Draft, Scope, DEFAULT_NICKNAME},
    render, CommentRenderer, CommentSection, OutlineRenderer, ReplyTarget, SubmitError,
    TransportError,
};
use folio_mock_server::{Call, MockServer};
use rand::{rngs::StdRng, SeedableRng};
use tests::{ancestry_depths, thread, Fixture};

fn seeded(comments: usize) -> (Fixture, Vec<folio_mock_server::SeedComment>) {
    let mut rng = StdRng::seed_from_u64(comments as u64);
    let thread = thread(&mut rng, &Scope::new("news", 1), 1, comments);
    let seed = folio_mock_server::Seed {
        articles: Vec::new(),
        comments: thread.clone(),
    };
    (Fixture::new(MockServer::from_seed(seed).unwrap()), thread)
}

#[tokio::test]
async fn top_level_submit_sends_default_nickname_and_invalidates() {
    let f = Fixture::new(MockServer::new());
    let scope = Scope::new("news", 1);
    let _attached = f.store.attach(scope.clone());
    f.store.read(&scope).await.unwrap();

    f.coordinator()
        .submit(&scope, "hello", "", None)
        .await
        .unwrap();

    let posted = f
        .transport
        .calls()
        .into_iter()
        .find_map(|c| match c {
            Call::PostComment(d) => Some(d),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        serde_json::to_value(&posted).unwrap(),
        serde_json::json!({
            "model": "news",
            "object_id": 1,
            "content": "hello",
            "nickname": DEFAULT_NICKNAME,
            "parent": null,
        })
    );
    assert!(f.store.snapshot(&scope).unwrap().stale);
    let tree = f.store.read(&scope).await.unwrap();
    assert_eq!(tree.roots()[0].nickname, DEFAULT_NICKNAME);
    assert_eq!(tree.roots()[0].content, "hello");
}

#[tokio::test]
async fn reply_renders_under_its_parent() {
    let f = Fixture::new(MockServer::new());
    let scope = Scope::new("news", 1);
    let coord = f.coordinator();
    let mut ids = Vec::new();
    for i in 0..5 {
        let c = coord
            .submit(&scope, &format!("c{i}"), "", None)
            .await
            .unwrap()
            .unwrap();
        ids.push(c.id);
    }
    let five = ids[4];
    let reply = coord
        .submit(&scope, "a reply", "ann", Some(five))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply.parent_id, Some(five));
    assert!(matches!(
        f.transport.calls().last(),
        Some(Call::PostComment(Draft { parent: Some(p), .. })) if *p == five
    ));

    let tree = f.store.read(&scope).await.unwrap();
    let parent = tree.find(five).unwrap();
    assert_eq!(parent.replies.len(), 1);
    assert_eq!(parent.replies[0].id, reply.id);
    assert_eq!(tree.depth_of(reply.id), Some(1));

    let out = OutlineRenderer::render(&tree);
    let parent_line = out.targets.iter().position(|t| t.id == five).unwrap();
    assert_eq!(out.targets[parent_line + 1].id, reply.id);
    assert!(out.lines[parent_line + 1].starts_with("  ann"));
}

#[tokio::test]
async fn blank_content_is_never_sent() {
    let f = Fixture::new(MockServer::new());
    let scope = Scope::new("news", 1);
    let section = CommentSection::new(&f.store, scope.clone());
    section.compose_mut().set_content("   \n");
    assert_eq!(section.submit().await, Ok(None));
    assert_eq!(f.coordinator().submit(&scope, "", "bob", None).await, Ok(None));
    assert_eq!(f.transport.writes(), 0);
}

#[tokio::test]
async fn compose_is_cleared_on_success_and_kept_on_failure() {
    let (f, thread) = seeded(6);
    let scope = Scope::new("news", 1);
    let section = CommentSection::new(&f.store, scope.clone());
    section.refresh().await.unwrap();
    let target = ReplyTarget::to(&thread[2].comment);

    {
        let mut compose = section.compose_mut();
        compose.set_content("first try");
        compose.reply_to(target.clone());
    }
    f.transport
        .fail_next(TransportError::Api(api::Error::Unknown(String::from("db down"))));
    let err = section.submit().await.unwrap_err();
    assert!(matches!(err, SubmitError::Transient(_)));
    assert!(err.is_retryable());
    assert_eq!(section.compose().content(), "first try");
    assert_eq!(section.compose().reply_target(), Some(&target));
    assert_eq!(section.compose().error(), Some(&err));

    let posted = section.submit().await.unwrap().unwrap();
    assert_eq!(posted.parent_id, Some(target.id));
    assert_eq!(section.compose().content(), "");
    assert_eq!(section.compose().reply_target(), None);
    assert_eq!(section.compose().error(), None);
    // exactly one request per attempt
    assert_eq!(f.transport.writes(), 2);
}

#[tokio::test]
async fn rejected_reply_is_not_retryable() {
    let f = Fixture::new(MockServer::new());
    let err = f
        .coordinator()
        .submit(&Scope::new("news", 1), "hi", "", Some(CommentId(404)))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::ValidationRejected(api::Error::Invalid(_))));
    assert!(!err.is_retryable());
    assert_eq!(f.transport.writes(), 1);
}

#[tokio::test]
async fn held_comment_disappears_on_refetch() {
    let (f, _) = seeded(3);
    let scope = Scope::new("news", 1);
    let _attached = f.store.attach(scope.clone());
    f.store.read(&scope).await.unwrap();
    f.server.borrow_mut().set_moderation(true);

    let held = f
        .coordinator()
        .submit(&scope, "awaiting review", "", None)
        .await
        .unwrap()
        .unwrap();
    assert!(f.store.cached(&scope).unwrap().find(held.id).is_some());

    let tree = f.store.read(&scope).await.unwrap();
    assert!(tree.find(held.id).is_none());
    assert_eq!(tree.len(), 3);
}

#[tokio::test]
async fn flat_and_nested_payloads_give_the_same_tree() {
    let (f, _) = seeded(40);
    let scope = Scope::new("news", 1);
    let nested = f.store.load(&scope).await.unwrap();
    f.server.borrow_mut().set_flat_payloads(true);
    let flat = f.store.load(&scope).await.unwrap();
    assert_eq!(nested.len(), 40);
    assert_eq!(
        OutlineRenderer::render(&nested).text(),
        OutlineRenderer::render(&flat).text()
    );
}

#[derive(Default)]
struct Depths {
    seen: Vec<(CommentId, usize)>,
    parents: Vec<(CommentId, Option<CommentId>)>,
}

impl CommentRenderer for Depths {
    fn comment(&mut self, comment: &api::Comment, depth: usize, _reply: ReplyTarget) {
        self.seen.push((comment.id, depth));
        self.parents.push((comment.id, comment.parent_id));
    }
}

#[tokio::test]
async fn render_depth_is_the_ancestor_count() {
    for size in [1, 10, 80] {
        let (f, thread) = seeded(size);
        let expected = ancestry_depths(&thread);
        let tree = f.store.read(&Scope::new("news", 1)).await.unwrap();

        let mut r = Depths::default();
        render(&tree, &mut r);
        assert_eq!(r.seen.len(), size);
        for (id, depth) in &r.seen {
            assert_eq!(expected[id], *depth, "depth of comment {id}");
        }
        for (pos, (_, parent)) in r.parents.iter().enumerate() {
            if let Some(p) = parent {
                let parent_pos = r.seen.iter().position(|(id, _)| id == p).unwrap();
                assert!(parent_pos < pos, "comment rendered before its parent");
            }
        }
    }
}
