use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use folio_client::api::{
    Article, ArticleSummary, Comment, Draft, Error, ListQuery, ModelName, ObjectId, Ordering, Page,
    Scope, ToggleRequest, ToggleResponse,
};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::{MockServer, SessionKey};

pub type SharedServer = Arc<Mutex<MockServer>>;

/// Header identifying the visitor for reactions, in lieu of a session cookie
pub const SESSION_HEADER: &str = "x-session-key";

const ANONYMOUS_SESSION: &str = "anonymous";

/// An API error, sent back with its status code and JSON contents
#[derive(Debug)]
pub struct ErrorResponse(pub Error);

impl From<Error> for ErrorResponse {
    fn from(e: Error) -> ErrorResponse {
        ErrorResponse(e)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        tracing::info!("returning error to client: {}", self.0);
        (
            self.0.status_code(),
            [(header::CONTENT_TYPE, "application/json")],
            self.0.contents(),
        )
            .into_response()
    }
}

/// Routes of the REST API, under `/api`
pub fn router(server: SharedServer) -> Router {
    Router::new()
        .route("/api/comments/", get(list_comments).post(create_comment))
        .route("/api/reactions/toggle/", post(toggle_reaction))
        .route("/api/articles/:api_path/", get(list_articles))
        .route("/api/articles/:api_path/:id/", get(get_article))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

/// Serves `server` on an ephemeral local port, in the background
pub fn spawn(server: SharedServer) -> anyhow::Result<SocketAddr> {
    let listener =
        std::net::TcpListener::bind("127.0.0.1:0").context("binding ephemeral port")?;
    listener
        .set_nonblocking(true)
        .context("setting listener non-blocking")?;
    let addr = listener.local_addr().context("getting bound address")?;
    let serve = axum::Server::from_tcp(listener)
        .context("building server")?
        .serve(router(server).into_make_service());
    tokio::spawn(async move {
        if let Err(err) = serve.await {
            tracing::error!(?err, "mock server stopped");
        }
    });
    tracing::info!("mock server listening on {addr}");
    Ok(addr)
}

#[derive(serde::Deserialize)]
struct CommentQuery {
    model: ModelName,
    id: ObjectId,
}

async fn list_comments(
    State(server): State<SharedServer>,
    Query(q): Query<CommentQuery>,
) -> Json<Vec<Comment>> {
    let scope = Scope {
        model: q.model,
        object_id: q.id,
    };
    Json(server.lock().await.fetch_comments(&scope))
}

async fn create_comment(
    State(server): State<SharedServer>,
    Json(draft): Json<Draft>,
) -> Result<(StatusCode, Json<Comment>), ErrorResponse> {
    let comment = server.lock().await.post_comment(draft)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn toggle_reaction(
    State(server): State<SharedServer>,
    headers: HeaderMap,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, ErrorResponse> {
    let session = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(ANONYMOUS_SESSION);
    let resp = server
        .lock()
        .await
        .toggle_reaction(&SessionKey::new(session), req)?;
    Ok(Json(resp))
}

#[derive(serde::Deserialize)]
struct ListParams {
    page: Option<u32>,
    search: Option<String>,
    ordering: Option<String>,
}

impl ListParams {
    /// Unknown orderings are ignored, like the real backend does
    fn query(self) -> ListQuery {
        let ordering = self.ordering.and_then(|o| match o.parse::<Ordering>() {
            Ok(o) => Some(o),
            Err(e) => {
                tracing::debug!("ignoring ordering: {e}");
                None
            }
        });
        ListQuery::page(self.page.unwrap_or(1))
            .search(self.search.as_deref().unwrap_or(""))
            .ordering(ordering.unwrap_or_default())
    }
}

async fn list_articles(
    State(server): State<SharedServer>,
    Path(api_path): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<ArticleSummary>>, ErrorResponse> {
    let query = params.query();
    Ok(Json(server.lock().await.articles(&api_path, &query)?))
}

async fn get_article(
    State(server): State<SharedServer>,
    Path((api_path, id)): Path<(String, ObjectId)>,
) -> Result<Json<Article>, ErrorResponse> {
    Ok(Json(server.lock().await.article(&api_path, id)?))
}
