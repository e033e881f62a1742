use crate::{
    api::{Comment, CommentId, Draft, Scope},
    CommentStore, SubmitError, Transport, TransportError,
};

/// Turns user input into comments on the server, keeping the store in sync
pub struct MutationCoordinator<T> {
    store: CommentStore<T>,
}

impl<T> Clone for MutationCoordinator<T> {
    fn clone(&self) -> Self {
        MutationCoordinator {
            store: self.store.clone(),
        }
    }
}

impl<T: Transport> MutationCoordinator<T> {
    pub fn new(store: CommentStore<T>) -> MutationCoordinator<T> {
        MutationCoordinator { store }
    }

    pub fn store(&self) -> &CommentStore<T> {
        &self.store
    }

    /// Posts a comment, or a reply if `parent` is set
    ///
    /// Returns `Ok(None)` without contacting the server if `content` is blank.
    /// Exactly one request is sent otherwise, failures are never retried.
    pub async fn submit(
        &self,
        scope: &Scope,
        content: &str,
        nickname: &str,
        parent: Option<CommentId>,
    ) -> Result<Option<Comment>, SubmitError> {
        let draft = match Draft::new(scope, content, nickname, parent) {
            Some(draft) => draft,
            None => {
                tracing::debug!(%scope, "ignoring blank comment");
                return Ok(None);
            }
        };
        draft.validate().map_err(SubmitError::ValidationRejected)?;

        let comment = match self.store.transport().post_comment(&draft).await {
            Ok(comment) => comment,
            Err(e) => {
                tracing::warn!(%scope, ?parent, "failed posting comment: {e}");
                if let TransportError::Malformed(_) = e {
                    // the server accepted the request, the comment may exist
                    self.store.invalidate(scope);
                }
                return Err(SubmitError::from(e));
            }
        };
        tracing::info!(%scope, id = %comment.id, ?parent, "posted comment");
        self.store.splice(scope, comment.clone());
        self.store.invalidate(scope);
        Ok(Some(comment))
    }
}
