use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

use futures::future::{AbortHandle, Abortable};

use crate::{
    api::{Comment, Scope},
    CommentTree, FetchError, Transport, TransportError,
};

struct ScopeState {
    /// Identifies this attachment of the scope: a response for a released
    /// scope must not land in a later re-attachment of it
    lease: u64,
    watchers: usize,

    tree: Option<Rc<CommentTree>>,
    stale: bool,
    error: Option<FetchError>,

    /// Sequence number of the last load issued
    last_issued: u64,
    /// Sequence number of the load whose result is in `tree`, 0 if none
    applied: u64,
    /// Loads with a sequence number up to this one were issued before the
    /// last invalidation
    invalidated_at: u64,
    in_flight: BTreeMap<u64, AbortHandle>,
}

impl ScopeState {
    fn new(lease: u64) -> ScopeState {
        ScopeState {
            lease,
            watchers: 0,
            tree: None,
            stale: false,
            error: None,
            last_issued: 0,
            applied: 0,
            invalidated_at: 0,
            in_flight: BTreeMap::new(),
        }
    }
}

#[derive(Default)]
struct Shared {
    scopes: HashMap<Scope, ScopeState>,
    last_lease: u64,
}

impl Shared {
    fn state(&mut self, scope: &Scope) -> &mut ScopeState {
        let last_lease = &mut self.last_lease;
        self.scopes.entry(scope.clone()).or_insert_with(|| {
            *last_lease += 1;
            ScopeState::new(*last_lease)
        })
    }
}

/// Read-only view of what the store knows about a scope
#[derive(Clone, Debug)]
pub struct ScopeView {
    pub tree: Option<Rc<CommentTree>>,
    pub stale: bool,
    pub loading: bool,
    /// Error of the last failed load, until a load succeeds
    pub error: Option<FetchError>,
}

/// Per-scope cache of comment trees
///
/// State is kept while the scope is attached or has loads in flight: loading
/// a scope nobody attached fetches it without caching the result. Cloning
/// gives another handle on the same cache.
pub struct CommentStore<T> {
    transport: Rc<T>,
    shared: Rc<RefCell<Shared>>,
}

impl<T> Clone for CommentStore<T> {
    fn clone(&self) -> Self {
        CommentStore {
            transport: self.transport.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<T> CommentStore<T> {
    pub fn new(transport: Rc<T>) -> CommentStore<T> {
        CommentStore {
            transport,
            shared: Rc::new(RefCell::new(Shared::default())),
        }
    }

    pub fn transport(&self) -> &Rc<T> {
        &self.transport
    }

    /// Keeps the scope's state alive until the returned guard is dropped
    pub fn attach(&self, scope: Scope) -> ScopeGuard<T> {
        self.shared.borrow_mut().state(&scope).watchers += 1;
        ScopeGuard {
            store: self.clone(),
            scope,
        }
    }

    fn detach(&self, scope: &Scope) {
        let now_unwatched = match self.shared.borrow_mut().scopes.get_mut(scope) {
            Some(st) => {
                st.watchers = st.watchers.saturating_sub(1);
                st.watchers == 0
            }
            None => false,
        };
        if now_unwatched {
            self.release(scope);
        }
    }

    /// Drops everything known about `scope` and aborts its in-flight loads
    pub fn release(&self, scope: &Scope) {
        let removed = self.shared.borrow_mut().scopes.remove(scope);
        if let Some(st) = removed {
            tracing::debug!(%scope, in_flight = st.in_flight.len(), "releasing comment scope");
            for handle in st.in_flight.into_values() {
                handle.abort();
            }
        }
    }

    /// Marks the scope stale, so that the next `read` fetches it again
    pub fn invalidate(&self, scope: &Scope) {
        if let Some(st) = self.shared.borrow_mut().scopes.get_mut(scope) {
            tracing::debug!(%scope, "invalidating comments");
            st.stale = true;
            st.invalidated_at = st.last_issued;
        }
    }

    /// Inserts a comment the server just created into the cached tree,
    /// returning whether there was a tree to insert it into
    pub fn splice(&self, scope: &Scope, comment: Comment) -> bool {
        let mut shared = self.shared.borrow_mut();
        match shared.scopes.get_mut(scope).and_then(|st| st.tree.as_mut()) {
            Some(tree) => Rc::make_mut(tree).insert(comment),
            None => false,
        }
    }

    pub fn cached(&self, scope: &Scope) -> Option<Rc<CommentTree>> {
        self.shared
            .borrow()
            .scopes
            .get(scope)
            .and_then(|st| st.tree.clone())
    }

    pub fn snapshot(&self, scope: &Scope) -> Option<ScopeView> {
        self.shared.borrow().scopes.get(scope).map(|st| ScopeView {
            tree: st.tree.clone(),
            stale: st.stale,
            loading: !st.in_flight.is_empty(),
            error: st.error.clone(),
        })
    }
}

impl<T: Transport> CommentStore<T> {
    /// Fetches the scope's comments from the server
    ///
    /// If a more recently issued load already landed, its tree is kept and
    /// returned instead of this (older) response.
    pub async fn load(&self, scope: &Scope) -> Result<Rc<CommentTree>, FetchError> {
        let (seq, lease, registration) = {
            let mut shared = self.shared.borrow_mut();
            let st = shared.state(scope);
            st.last_issued += 1;
            let (handle, registration) = AbortHandle::new_pair();
            st.in_flight.insert(st.last_issued, handle);
            (st.last_issued, st.lease, registration)
        };
        tracing::debug!(%scope, seq, "loading comments");
        let res = Abortable::new(self.transport.fetch_comments(scope), registration).await;

        let mut shared = self.shared.borrow_mut();
        let st = match shared.scopes.get_mut(scope) {
            Some(st) if st.lease == lease => st,
            _ => {
                tracing::debug!(%scope, seq, "scope released while loading, dropping response");
                return Err(FetchError::Abandoned(scope.clone()));
            }
        };
        st.in_flight.remove(&seq);
        let res = match res {
            Ok(res) => apply(st, scope, seq, res),
            Err(_aborted) => Err(FetchError::Abandoned(scope.clone())),
        };
        if st.watchers == 0 && st.in_flight.is_empty() {
            tracing::debug!(%scope, "no one watches this scope, dropping its state");
            shared.scopes.remove(scope);
        }
        res
    }

    /// Returns the cached tree if it is fresh, loads it otherwise
    pub async fn read(&self, scope: &Scope) -> Result<Rc<CommentTree>, FetchError> {
        let fresh = self
            .shared
            .borrow()
            .scopes
            .get(scope)
            .filter(|st| !st.stale)
            .and_then(|st| st.tree.clone());
        match fresh {
            Some(tree) => Ok(tree),
            None => self.load(scope).await,
        }
    }
}

fn apply(
    st: &mut ScopeState,
    scope: &Scope,
    seq: u64,
    res: Result<Vec<Comment>, TransportError>,
) -> Result<Rc<CommentTree>, FetchError> {
    if seq < st.applied {
        if let Some(tree) = &st.tree {
            tracing::debug!(%scope, seq, applied = st.applied, "discarding superseded response");
            return Ok(tree.clone());
        }
    }
    match res {
        Ok(payload) => {
            let tree = Rc::new(CommentTree::from_payload(payload));
            tracing::debug!(%scope, seq, comments = tree.len(), "loaded comments");
            st.tree = Some(tree.clone());
            st.applied = seq;
            st.stale = seq <= st.invalidated_at;
            st.error = None;
            Ok(tree)
        }
        Err(e) => {
            tracing::warn!(%scope, seq, "failed loading comments: {e}");
            let err = FetchError::transport(format!("comments of {scope}"), e);
            st.error = Some(err.clone());
            Err(err)
        }
    }
}

/// Keeps a scope attached to its store; dropping it releases the scope when
/// nothing else watches it
pub struct ScopeGuard<T> {
    store: CommentStore<T>,
    scope: Scope,
}

impl<T> ScopeGuard<T> {
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

impl<T> Drop for ScopeGuard<T> {
    fn drop(&mut self) {
        self.store.detach(&self.scope)
    }
}
