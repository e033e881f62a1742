use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use async_trait::async_trait;
use folio_client::{
    api::{
        Article, ArticleSummary, Category, Comment, Draft, Error, ListQuery, ObjectId, Page,
        Scope, ToggleRequest, ToggleResponse,
    },
    Transport, TransportError,
};

use crate::{MockServer, SessionKey};

/// A request as received by a `MockTransport`
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    FetchComments(Scope),
    PostComment(Draft),
    ToggleReaction(ToggleRequest),
    FetchArticle(&'static str, ObjectId),
    FetchArticles(&'static str, ListQuery),
}

impl Call {
    pub fn is_write(&self) -> bool {
        matches!(self, Call::PostComment(_) | Call::ToggleReaction(_))
    }
}

/// Talks to a `MockServer` in the same thread, without going through HTTP
///
/// Answers still go through their JSON form, so that the client sees exactly
/// what it would have parsed off the wire.
pub struct MockTransport {
    server: Rc<RefCell<MockServer>>,
    session: SessionKey,
    calls: RefCell<Vec<Call>>,
    faults: RefCell<VecDeque<TransportError>>,
}

impl MockTransport {
    pub fn new(server: Rc<RefCell<MockServer>>, session: SessionKey) -> MockTransport {
        MockTransport {
            server,
            session,
            calls: RefCell::new(Vec::new()),
            faults: RefCell::new(VecDeque::new()),
        }
    }

    pub fn server(&self) -> &Rc<RefCell<MockServer>> {
        &self.server
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn writes(&self) -> usize {
        self.calls.borrow().iter().filter(|c| c.is_write()).count()
    }

    /// Makes the next request fail with `err` without reaching the server
    pub fn fail_next(&self, err: TransportError) {
        self.faults.borrow_mut().push_back(err);
    }

    fn record(&self, call: Call) -> Result<(), TransportError> {
        tracing::debug!(?call, "mock transport received call");
        self.calls.borrow_mut().push(call);
        match self.faults.borrow_mut().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn over_the_wire<R>(res: Result<R, Error>) -> Result<R, TransportError>
where
    R: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    match res {
        Ok(data) => {
            let body =
                serde_json::to_vec(&data).map_err(|e| TransportError::Malformed(e.to_string()))?;
            serde_json::from_slice(&body).map_err(|e| TransportError::Malformed(e.to_string()))
        }
        Err(err) => {
            let parsed = Error::parse(err.status_code(), &err.contents());
            Err(TransportError::Api(parsed.unwrap_or_else(|e| {
                tracing::warn!("error did not survive serialization: {e:#}");
                err
            })))
        }
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn fetch_comments(&self, scope: &Scope) -> Result<Vec<Comment>, TransportError> {
        self.record(Call::FetchComments(scope.clone()))?;
        over_the_wire(Ok(self.server.borrow().fetch_comments(scope)))
    }

    async fn post_comment(&self, draft: &Draft) -> Result<Comment, TransportError> {
        self.record(Call::PostComment(draft.clone()))?;
        over_the_wire(self.server.borrow_mut().post_comment(draft.clone()))
    }

    async fn toggle_reaction(
        &self,
        req: &ToggleRequest,
    ) -> Result<ToggleResponse, TransportError> {
        self.record(Call::ToggleReaction(req.clone()))?;
        let res = self
            .server
            .borrow_mut()
            .toggle_reaction(&self.session, req.clone());
        over_the_wire(res)
    }

    async fn fetch_article(
        &self,
        category: &Category,
        id: ObjectId,
    ) -> Result<Article, TransportError> {
        self.record(Call::FetchArticle(category.api_path, id))?;
        over_the_wire(self.server.borrow_mut().article(category.api_path, id))
    }

    async fn fetch_articles(
        &self,
        category: &Category,
        query: &ListQuery,
    ) -> Result<Page<ArticleSummary>, TransportError> {
        self.record(Call::FetchArticles(category.api_path, query.clone()))?;
        over_the_wire(self.server.borrow().articles(category.api_path, query))
    }
}
