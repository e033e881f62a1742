use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

use crate::{
    api::{Comment, Scope},
    render, CommentRenderer, CommentStore, FetchError, MutationCoordinator, ReplyTarget,
    ScopeGuard, ScopeView, SubmitError, Transport,
};

pub const COMPOSE_PLACEHOLDER: &str = "写下你的评论...";

/// State of the comment input box
#[derive(Clone, Debug, Default)]
pub struct Compose {
    content: String,
    nickname: String,
    reply_to: Option<ReplyTarget>,
    error: Option<SubmitError>,
    submitting: bool,
}

impl Compose {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn reply_target(&self) -> Option<&ReplyTarget> {
        self.reply_to.as_ref()
    }

    /// Why the last submission failed, cleared on the next attempt
    pub fn error(&self) -> Option<&SubmitError> {
        self.error.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_nickname(&mut self, nickname: impl Into<String>) {
        self.nickname = nickname.into();
    }

    pub fn reply_to(&mut self, target: ReplyTarget) {
        self.reply_to = Some(target);
    }

    /// Goes back to commenting at top level, keeping whatever was typed
    pub fn cancel_reply(&mut self) {
        self.reply_to = None;
    }

    pub fn placeholder(&self) -> String {
        match &self.reply_to {
            Some(t) => format!("回复 {}...", t.label),
            None => String::from(COMPOSE_PLACEHOLDER),
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.content.trim().is_empty()
    }
}

/// One mounted comment area: keeps its scope attached for as long as it lives
pub struct CommentSection<T> {
    guard: ScopeGuard<T>,
    coordinator: MutationCoordinator<T>,
    compose: Rc<RefCell<Compose>>,
}

impl<T: Transport> CommentSection<T> {
    pub fn new(store: &CommentStore<T>, scope: Scope) -> CommentSection<T> {
        CommentSection {
            guard: store.attach(scope),
            coordinator: MutationCoordinator::new(store.clone()),
            compose: Rc::new(RefCell::new(Compose::default())),
        }
    }

    pub fn scope(&self) -> &Scope {
        self.guard.scope()
    }

    pub fn store(&self) -> &CommentStore<T> {
        self.coordinator.store()
    }

    pub fn compose(&self) -> Ref<'_, Compose> {
        self.compose.borrow()
    }

    /// Must not be held across an await of this section's methods
    pub fn compose_mut(&self) -> RefMut<'_, Compose> {
        self.compose.borrow_mut()
    }

    pub fn view(&self) -> Option<ScopeView> {
        self.store().snapshot(self.scope())
    }

    /// Makes sure the comments are loaded and fresh
    pub async fn refresh(&self) -> Result<(), FetchError> {
        self.store().read(self.scope()).await.map(|_| ())
    }

    /// Renders the cached comments, returns false if there are none yet
    pub fn render<R: CommentRenderer>(&self, renderer: &mut R) -> bool {
        match self.store().cached(self.scope()) {
            Some(tree) => {
                render(&tree, renderer);
                true
            }
            None => false,
        }
    }

    /// Submits what is in the compose box
    ///
    /// On success the content and reply target are cleared, on failure they
    /// are kept and the error is recorded for display.
    pub async fn submit(&self) -> Result<Option<Comment>, SubmitError> {
        let (content, nickname, parent) = {
            let mut compose = self.compose.borrow_mut();
            if compose.submitting {
                tracing::debug!(scope = %self.scope(), "submission already in progress");
                return Ok(None);
            }
            compose.submitting = true;
            compose.error = None;
            let parent = compose.reply_to.as_ref().map(|t| t.id);
            (compose.content.clone(), compose.nickname.clone(), parent)
        };

        let in_progress = Submitting(&self.compose);
        let res = self
            .coordinator
            .submit(self.scope(), &content, &nickname, parent)
            .await;
        drop(in_progress);

        let mut compose = self.compose.borrow_mut();
        match &res {
            Ok(Some(_)) => {
                compose.content.clear();
                compose.reply_to = None;
            }
            Ok(None) => (),
            Err(e) => compose.error = Some(e.clone()),
        }
        res
    }
}

/// Clears the submitting flag when the submission ends, even if its future
/// is dropped before completing
struct Submitting<'a>(&'a RefCell<Compose>);

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().submitting = false;
    }
}
