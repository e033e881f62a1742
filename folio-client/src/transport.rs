use async_trait::async_trait;

use crate::{
    api::{
        Article, ArticleSummary, Category, Comment, Draft, ListQuery, ObjectId, Page, Scope,
        ToggleRequest, ToggleResponse,
    },
    TransportError,
};

/// The remote service, as seen by the stores
///
/// Futures are not required to be `Send`: everything runs on a single
/// cooperative thread, which is also what a browser target provides.
#[async_trait(?Send)]
pub trait Transport {
    /// `GET /comments/?model=..&id=..`, flat or pre-nested
    async fn fetch_comments(&self, scope: &Scope) -> Result<Vec<Comment>, TransportError>;

    /// `POST /comments/`
    async fn post_comment(&self, draft: &Draft) -> Result<Comment, TransportError>;

    /// `POST /reactions/toggle/`
    async fn toggle_reaction(&self, req: &ToggleRequest) -> Result<ToggleResponse, TransportError>;

    /// `GET /articles/{api_path}/{id}/`
    async fn fetch_article(
        &self,
        category: &Category,
        id: ObjectId,
    ) -> Result<Article, TransportError>;

    /// `GET /articles/{api_path}/?page=..&search=..&ordering=..`
    async fn fetch_articles(
        &self,
        category: &Category,
        query: &ListQuery,
    ) -> Result<Page<ArticleSummary>, TransportError>;
}
