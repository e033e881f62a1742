mod articles;
pub use articles::ArticleStore;

mod compose;
pub use compose::{CommentSection, Compose, COMPOSE_PLACEHOLDER};

mod config;
pub use config::{ClientConfig, DEFAULT_API_BASE, DEFAULT_TIMEOUT};

mod coordinator;
pub use coordinator::MutationCoordinator;

mod error;
pub use error::{FetchError, SubmitError, TransportError};

mod http;
pub use http::HttpTransport;

mod reactions;
pub use reactions::Reactions;

mod render;
pub use render::{
    render, render_with_limit, CommentRenderer, OutlineRenderer, ReplyTarget, MAX_RENDER_DEPTH,
};

mod store;
pub use store::{CommentStore, ScopeGuard, ScopeView};

mod transport;
pub use transport::Transport;

mod tree;
pub use tree::{CommentTree, Iter, MAX_PAYLOAD_DEPTH};

#[cfg(test)]
mod testing;

pub mod api {
    pub use folio_api::*;
}
