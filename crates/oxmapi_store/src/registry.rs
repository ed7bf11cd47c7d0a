//! Backend registration and URI-namespace lookup.

use std::sync::Arc;

use tracing::debug;

use crate::backend::StoreBackend;
use crate::error::{StoreError, StoreResult};

/// The set of registered backends, keyed by URI namespace.
#[derive(Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn StoreBackend>>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a backend and runs its one-time `init`.
    ///
    /// # Errors
    ///
    /// [`StoreError::AlreadyExists`] if a backend with the same name or
    /// namespace is already registered (the registration is a no-op);
    /// any error the backend's `init` reports.
    pub fn register(&mut self, backend: Arc<dyn StoreBackend>) -> StoreResult<()> {
        if self
            .backends
            .iter()
            .any(|b| b.name() == backend.name() || b.uri_namespace() == backend.uri_namespace())
        {
            return Err(StoreError::already_exists(backend.name()));
        }
        backend.init()?;
        debug!(
            name = backend.name(),
            namespace = backend.uri_namespace(),
            "registered storage backend"
        );
        self.backends.push(backend);
        Ok(())
    }

    /// Selects the backend whose namespace matches the URI's scheme.
    ///
    /// # Errors
    ///
    /// [`StoreError::NoBackend`] when no registered namespace prefixes
    /// the URI.
    pub fn by_uri(&self, uri: &str) -> StoreResult<Arc<dyn StoreBackend>> {
        self.backends
            .iter()
            .find(|b| uri.starts_with(b.uri_namespace()))
            .cloned()
            .ok_or_else(|| StoreError::NoBackend {
                uri: uri.to_string(),
            })
    }

    /// Looks up a backend by its registered name.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown name.
    pub fn by_name(&self, name: &str) -> StoreResult<Arc<dyn StoreBackend>> {
        self.backends
            .iter()
            .find(|b| b.name() == name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// Number of registered backends.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether no backend has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
