//! Backend context lifecycle and the context registry.
//!
//! A context is one opened instance of a backend: the backend's opaque
//! per-instance state, a monotonically increasing id, a reference count
//! starting at one, and the URI that opened it. The registry owns every
//! live context; an entry leaves the registry only when its reference
//! count reaches zero, and ids are never reused while the registry
//! lives.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::backend::{ContextOps, StoreBackend};
use crate::error::{StoreError, StoreResult};
use crate::indexing::IndexingContext;
use crate::types::ContextId;

/// One opened backend instance.
pub struct BackendContext {
    backend: Arc<dyn StoreBackend>,
    ops: Arc<Mutex<Box<dyn ContextOps>>>,
    id: ContextId,
    ref_count: u32,
    uri: String,
    indexing: Option<Arc<Mutex<IndexingContext>>>,
}

impl core::fmt::Debug for BackendContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BackendContext")
            .field("id", &self.id)
            .field("ref_count", &self.ref_count)
            .field("uri", &self.uri)
            .field("has_indexing", &self.indexing.is_some())
            .finish_non_exhaustive()
    }
}

impl BackendContext {
    /// The backend this context belongs to.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn StoreBackend> {
        &self.backend
    }

    /// The per-instance operations handle.
    ///
    /// The handle carries its own lock: one session owns the context,
    /// so the lock is uncontended; it exists so the registry lock does
    /// not span backend I/O.
    #[must_use]
    pub fn ops(&self) -> Arc<Mutex<Box<dyn ContextOps>>> {
        Arc::clone(&self.ops)
    }

    /// This context's id.
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Current reference count.
    #[must_use]
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// The URI the context was opened with.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The indexing context associated with this backend context.
    #[must_use]
    pub fn indexing(&self) -> Option<Arc<Mutex<IndexingContext>>> {
        self.indexing.clone()
    }

    /// Associates an indexing context.
    pub fn set_indexing(&mut self, indexing: Arc<Mutex<IndexingContext>>) {
        self.indexing = Some(indexing);
    }
}

/// Outcome of a release operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The reference count dropped but stayed above zero.
    Decremented(u32),
    /// The last reference went away; the context was torn down.
    Removed,
    /// The id named no live context; the release was ignored.
    Ignored,
}

/// The collection of live backend contexts, addressable by id or by
/// exact URI.
///
/// The registry itself carries no lock: the owning store serializes
/// all mutations under its single registry mutex.
#[derive(Default)]
pub struct ContextRegistry {
    contexts: HashMap<ContextId, BackendContext>,
    next_id: u32,
}

impl ContextRegistry {
    /// Creates an empty registry. The first allocated id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            contexts: HashMap::new(),
            next_id: 1,
        }
    }

    /// Wraps freshly created backend state into a registered context
    /// with reference count 1, returning the new id.
    pub fn insert(
        &mut self,
        backend: Arc<dyn StoreBackend>,
        ops: Box<dyn ContextOps>,
        uri: impl Into<String>,
    ) -> ContextId {
        let id = ContextId::new(self.next_id);
        self.next_id += 1;

        let uri = uri.into();
        debug!(context = %id, uri = %uri, backend = backend.name(), "created context");
        self.contexts.insert(
            id,
            BackendContext {
                backend,
                ops: Arc::new(Mutex::new(ops)),
                id,
                ref_count: 1,
                uri,
                indexing: None,
            },
        );
        id
    }

    /// Looks up a context by id.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] — an expected miss, not an exception.
    pub fn lookup_by_id(&self, id: ContextId) -> StoreResult<&BackendContext> {
        self.contexts.get(&id).ok_or(StoreError::NotFound)
    }

    /// Mutable lookup by id.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown id.
    pub fn lookup_by_id_mut(&mut self, id: ContextId) -> StoreResult<&mut BackendContext> {
        self.contexts.get_mut(&id).ok_or(StoreError::NotFound)
    }

    /// Looks up a context by exact URI match.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no live context was opened with
    /// this URI.
    pub fn lookup_by_uri(&self, uri: &str) -> StoreResult<&BackendContext> {
        self.contexts
            .values()
            .find(|ctx| ctx.uri == uri)
            .ok_or(StoreError::NotFound)
    }

    /// Increments a context's reference count.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown id.
    pub fn add_ref(&mut self, id: ContextId) -> StoreResult<u32> {
        self.add_ref_count(id, 1)
    }

    /// Bulk reference-count adjustment for batch-opened handles that
    /// share one physical context.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown id.
    pub fn add_ref_count(&mut self, id: ContextId, delta: u32) -> StoreResult<u32> {
        let ctx = self.lookup_by_id_mut(id)?;
        ctx.ref_count = ctx.ref_count.saturating_add(delta);
        Ok(ctx.ref_count)
    }

    /// Decrements a context's reference count, tearing the context down
    /// when it reaches zero.
    ///
    /// Releasing an id that is not registered is a logged no-op rather
    /// than registry corruption.
    #[must_use = "the caller may need to know whether the context was torn down"]
    pub fn release(&mut self, id: ContextId) -> ReleaseOutcome {
        let Some(ctx) = self.contexts.get_mut(&id) else {
            warn!(context = %id, "release of unknown context ignored");
            return ReleaseOutcome::Ignored;
        };

        ctx.ref_count -= 1;
        if ctx.ref_count > 0 {
            return ReleaseOutcome::Decremented(ctx.ref_count);
        }

        // Dropping the entry drops the backend's per-instance state.
        if let Some(ctx) = self.contexts.remove(&id) {
            debug!(context = %id, uri = %ctx.uri, "context released");
        }
        ReleaseOutcome::Removed
    }

    /// Number of live contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether no context is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{QueryMode, TableKind};

    struct FakeBackend;
    struct FakeContext;
    impl ContextOps for FakeContext {}

    impl StoreBackend for FakeBackend {
        fn name(&self) -> &str {
            "fake"
        }
        fn description(&self) -> &str {
            "fake"
        }
        fn uri_namespace(&self) -> &str {
            "fake://"
        }
        fn supports_query_mode(&self, _table: TableKind, _mode: QueryMode) -> bool {
            true
        }
        fn create_context(&self, _uri: &str) -> StoreResult<Box<dyn ContextOps>> {
            Ok(Box::new(FakeContext))
        }
    }

    fn insert(registry: &mut ContextRegistry, uri: &str) -> ContextId {
        registry.insert(Arc::new(FakeBackend), Box::new(FakeContext), uri)
    }

    #[test]
    fn ids_are_monotonic_and_distinct() {
        let mut registry = ContextRegistry::new();
        let a = insert(&mut registry, "fake://a");
        let b = insert(&mut registry, "fake://b");
        let c = insert(&mut registry, "fake://c");
        assert!(a < b && b < c);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn released_ids_are_not_reused() {
        let mut registry = ContextRegistry::new();
        let a = insert(&mut registry, "fake://a");
        assert_eq!(registry.release(a), ReleaseOutcome::Removed);
        let b = insert(&mut registry, "fake://b");
        assert_ne!(a, b);
    }

    #[test]
    fn uri_lookup_tracks_lifetime() {
        let mut registry = ContextRegistry::new();
        let id = insert(&mut registry, "fake://inbox");
        assert_eq!(registry.lookup_by_uri("fake://inbox").unwrap().id(), id);

        let _ = registry.add_ref(id).unwrap();
        assert_eq!(registry.release(id), ReleaseOutcome::Decremented(1));
        assert!(registry.lookup_by_uri("fake://inbox").is_ok());

        assert_eq!(registry.release(id), ReleaseOutcome::Removed);
        assert!(registry
            .lookup_by_uri("fake://inbox")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn release_of_unknown_id_is_a_no_op() {
        let mut registry = ContextRegistry::new();
        let id = insert(&mut registry, "fake://a");
        assert_eq!(registry.release(id), ReleaseOutcome::Removed);
        // Double release: nothing to corrupt.
        assert_eq!(registry.release(id), ReleaseOutcome::Ignored);
        assert!(registry.is_empty());
    }

    #[test]
    fn add_ref_count_bulk_adjustment() {
        let mut registry = ContextRegistry::new();
        let id = insert(&mut registry, "fake://a");
        assert_eq!(registry.add_ref_count(id, 3).unwrap(), 4);
        for expected in [3, 2, 1] {
            assert_eq!(registry.release(id), ReleaseOutcome::Decremented(expected));
        }
        assert_eq!(registry.release(id), ReleaseOutcome::Removed);
    }

    #[test]
    fn ref_lookup_miss_is_not_found() {
        let mut registry = ContextRegistry::new();
        assert!(registry.add_ref(ContextId::new(7)).unwrap_err().is_not_found());
        assert!(registry.lookup_by_id(ContextId::new(7)).unwrap_err().is_not_found());
    }
}
