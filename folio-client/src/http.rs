use async_trait::async_trait;

use crate::{
    api::{
        self, Article, ArticleSummary, Category, Comment, Draft, ListQuery, ObjectId, Page, Scope,
        ToggleRequest, ToggleResponse,
    },
    ClientConfig, Transport, TransportError,
};

/// Talks to the real REST API over HTTP
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: String,
}

impl HttpTransport {
    pub fn new(cfg: &ClientConfig) -> anyhow::Result<HttpTransport> {
        let builder = reqwest::Client::builder();
        // not supported by the browser backend of reqwest
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(cfg.timeout);
        Ok(HttpTransport {
            client: builder.build()?,
            base: cfg.api_base.clone(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }
}

fn from_reqwest(e: reqwest::Error) -> TransportError {
    match e.is_decode() {
        true => TransportError::Malformed(e.to_string()),
        false => TransportError::Network(e.to_string()),
    }
}

async fn decode<R>(resp: reqwest::Result<reqwest::Response>) -> Result<R, TransportError>
where
    R: for<'de> serde::Deserialize<'de>,
{
    let resp = resp.map_err(from_reqwest)?;
    let status = resp.status();
    let body = resp.bytes().await.map_err(from_reqwest)?;
    if !status.is_success() {
        let err = api::Error::parse(status, &body).unwrap_or_else(|e| {
            tracing::warn!(?status, "unreadable error response: {e:#}");
            match status.is_server_error() {
                true => api::Error::Unknown(format!("server answered {status}")),
                false => api::Error::Invalid(format!("server answered {status}")),
            }
        });
        return Err(TransportError::Api(err));
    }
    serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(?status, "failed to parse data from server: {e}");
        TransportError::Malformed(e.to_string())
    })
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn fetch_comments(&self, scope: &Scope) -> Result<Vec<Comment>, TransportError> {
        let id = scope.object_id.to_string();
        let req = self
            .client
            .get(self.url("comments/"))
            .query(&[("model", scope.model.as_str()), ("id", id.as_str())]);
        decode(req.send().await).await
    }

    async fn post_comment(&self, draft: &Draft) -> Result<Comment, TransportError> {
        let req = self.client.post(self.url("comments/")).json(draft);
        decode(req.send().await).await
    }

    async fn toggle_reaction(
        &self,
        toggle: &ToggleRequest,
    ) -> Result<ToggleResponse, TransportError> {
        let req = self.client.post(self.url("reactions/toggle/")).json(toggle);
        decode(req.send().await).await
    }

    async fn fetch_article(
        &self,
        category: &Category,
        id: ObjectId,
    ) -> Result<Article, TransportError> {
        let req = self
            .client
            .get(self.url(&format!("articles/{}/{}/", category.api_path, id)));
        decode(req.send().await).await
    }

    async fn fetch_articles(
        &self,
        category: &Category,
        query: &ListQuery,
    ) -> Result<Page<ArticleSummary>, TransportError> {
        let req = self
            .client
            .get(self.url(&format!("articles/{}/", category.api_path)))
            .query(query);
        decode(req.send().await).await
    }
}
