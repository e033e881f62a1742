use std::{cell::RefCell, collections::HashMap};

use crate::{
    api::{ModelName, ObjectId, ReactionKind, ToggleRequest, ToggleResponse},
    ArticleStore, Transport, TransportError,
};

/// The like/dislike state of this session, as last reported by the server
///
/// Counts are never adjusted here: the article caches are invalidated instead
/// so that the next read shows the server's numbers.
pub struct Reactions<T> {
    articles: ArticleStore<T>,
    current: RefCell<HashMap<(ModelName, ObjectId), ReactionKind>>,
}

impl<T: Transport> Reactions<T> {
    pub fn new(articles: ArticleStore<T>) -> Reactions<T> {
        Reactions {
            articles,
            current: RefCell::new(HashMap::new()),
        }
    }

    pub fn current(&self, model: &ModelName, id: ObjectId) -> Option<ReactionKind> {
        self.current.borrow().get(&(model.clone(), id)).copied()
    }

    pub async fn toggle(
        &self,
        model: &ModelName,
        id: ObjectId,
        kind: ReactionKind,
    ) -> Result<ToggleResponse, TransportError> {
        let req = ToggleRequest {
            model: model.clone(),
            id,
            kind,
        };
        let resp = match self.articles.transport().toggle_reaction(&req).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(%model, %id, ?kind, "failed toggling reaction: {e}");
                return Err(e);
            }
        };
        tracing::info!(
            %model,
            %id,
            action = ?resp.action,
            current = ?resp.current,
            "toggled reaction"
        );

        {
            let mut current = self.current.borrow_mut();
            match resp.resulting_reaction() {
                Some(r) => current.insert((model.clone(), id), r),
                None => current.remove(&(model.clone(), id)),
            };
        }
        self.articles.invalidate_object(model, id);
        Ok(resp)
    }
}
