use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
};

use async_trait::async_trait;
use futures::channel::oneshot;

use crate::{
    api::{
        self, Article, ArticleSummary, Category, Comment, CommentId, Draft, ListQuery, ObjectId,
        Page, Scope, Timestamp, ToggleRequest, ToggleResponse, PAGE_SIZE,
    },
    Transport, TransportError,
};

type FetchResult = Result<Vec<Comment>, TransportError>;

/// Transport whose answers are decided by the test
///
/// Comment fetches stay pending until `respond` is called for them, unless a
/// canned answer was set with `serve_comments` or `fail_fetches`.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    fetch_count: Cell<usize>,
    canned: RefCell<Option<FetchResult>>,
    pending: RefCell<Vec<Option<oneshot::Sender<FetchResult>>>>,

    pub posts: RefCell<Vec<Draft>>,
    /// While set, posted comments never get an answer
    pub hold_posts: Cell<bool>,
    pub post_results: RefCell<VecDeque<Result<Comment, TransportError>>>,

    pub toggles: RefCell<Vec<ToggleRequest>>,
    pub toggle_results: RefCell<VecDeque<Result<ToggleResponse, TransportError>>>,

    pub articles: RefCell<Vec<Article>>,
    pub article_fetches: Cell<usize>,
    pub list_fetches: Cell<usize>,
    pub list_queries: RefCell<Vec<ListQuery>>,
}

impl ScriptedTransport {
    pub fn serve_comments(&self, comments: Vec<Comment>) {
        *self.canned.borrow_mut() = Some(Ok(comments));
    }

    pub fn fail_fetches(&self, err: TransportError) {
        *self.canned.borrow_mut() = Some(Err(err));
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.get()
    }

    /// Answers the `idx`-th pending fetch, returns false if nobody awaits it
    pub fn respond(&self, idx: usize, res: FetchResult) -> bool {
        let sender = self
            .pending
            .borrow_mut()
            .get_mut(idx)
            .and_then(Option::take);
        match sender {
            Some(sender) => sender.send(res).is_ok(),
            None => false,
        }
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn fetch_comments(&self, _scope: &Scope) -> Result<Vec<Comment>, TransportError> {
        self.fetch_count.set(self.fetch_count.get() + 1);
        if let Some(res) = self.canned.borrow().clone() {
            return res;
        }
        let (sender, receiver) = oneshot::channel();
        self.pending.borrow_mut().push(Some(sender));
        receiver
            .await
            .unwrap_or_else(|_| Err(TransportError::Network(String::from("dropped"))))
    }

    async fn post_comment(&self, draft: &Draft) -> Result<Comment, TransportError> {
        self.posts.borrow_mut().push(draft.clone());
        if self.hold_posts.get() {
            futures::future::pending::<()>().await;
        }
        if let Some(res) = self.post_results.borrow_mut().pop_front() {
            return res;
        }
        Ok(Comment {
            id: CommentId(100 + self.posts.borrow().len() as i64),
            nickname: draft.nickname.clone(),
            content: draft.content.clone(),
            created_at: Timestamp::now(),
            parent_id: draft.parent,
            replies: Vec::new(),
        })
    }

    async fn toggle_reaction(&self, req: &ToggleRequest) -> Result<ToggleResponse, TransportError> {
        self.toggles.borrow_mut().push(req.clone());
        self.toggle_results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network(String::from("no scripted answer"))))
    }

    async fn fetch_article(
        &self,
        _category: &Category,
        id: ObjectId,
    ) -> Result<Article, TransportError> {
        self.article_fetches.set(self.article_fetches.get() + 1);
        self.articles
            .borrow()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| TransportError::Api(api::Error::NotFound(format!("article {id}"))))
    }

    async fn fetch_articles(
        &self,
        _category: &Category,
        query: &ListQuery,
    ) -> Result<Page<ArticleSummary>, TransportError> {
        self.list_fetches.set(self.list_fetches.get() + 1);
        self.list_queries.borrow_mut().push(query.clone());
        let articles = self.articles.borrow();
        let found = articles
            .iter()
            .filter(|a| query.matches(&[&a.title, &a.content, &a.author]))
            .collect::<Vec<_>>();
        let skip = (query.page.max(1) as usize - 1) * PAGE_SIZE;
        Ok(Page {
            count: found.len(),
            next: None,
            previous: None,
            results: found
                .into_iter()
                .skip(skip)
                .take(PAGE_SIZE)
                .map(ArticleSummary::from)
                .collect(),
        })
    }
}

pub(crate) fn article(id: i64, likes: u64) -> Article {
    Article {
        id: ObjectId(id),
        title: format!("article {id}"),
        content: String::new(),
        author: String::new(),
        source: String::new(),
        total_views: 0,
        today_views: 0,
        likes,
        dislikes: 0,
        created_at: None,
        updated_at: None,
        model: None,
        image_url: None,
        pdf_url: None,
    }
}
