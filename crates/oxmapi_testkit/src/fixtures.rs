//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores and
//! common session scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use oxmapi_props::{NameResolver, Property, PropertyName, PropertyTag, Row};
use oxmapi_store::{ContextId, FolderId, InMemoryBackend, Store, ROOT_FOLDER};

/// A store with the in-memory backend registered and one context open.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    /// The context opened at construction.
    pub ctx: ContextId,
}

impl TestStore {
    /// Creates a store with one context on `oxmem://test/store`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_uri("oxmem://test/store")
    }

    /// Creates a store with one context on the given URI.
    ///
    /// # Panics
    ///
    /// Panics when the URI is outside the in-memory namespace.
    #[must_use]
    pub fn with_uri(uri: &str) -> Self {
        let mut store = Store::new();
        store
            .register_backend(Arc::new(InMemoryBackend::new()))
            .expect("register in-memory backend");
        let ctx = store.add_context(uri).expect("open test context");
        Self { store, ctx }
    }

    /// Creates a folder under the root with the given name, returning
    /// its id.
    ///
    /// # Panics
    ///
    /// Panics when the backend rejects the folder.
    pub fn folder(&self, fid: u64, name: &str) -> FolderId {
        let id = FolderId::new(fid);
        self.store
            .mkdir(self.ctx, ROOT_FOLDER, id, &named_row(name))
            .expect("create folder");
        id
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a fresh store and opened context.
///
/// # Example
///
/// ```rust
/// use oxmapi_testkit::with_test_store;
///
/// with_test_store(|store, ctx| {
///     assert!(store.context_ref_count(ctx).unwrap() == 1);
/// });
/// ```
pub fn with_test_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store, ContextId) -> R,
{
    let fixture = TestStore::new();
    f(&fixture.store, fixture.ctx)
}

/// Builds a row carrying a display name.
#[must_use]
pub fn named_row(name: &str) -> Row {
    let mut row = Row::new();
    row.upsert(Property::new(0x3001, name));
    row
}

/// A name resolver backed by a fixed map, for named-property tests.
#[derive(Debug, Default)]
pub struct StaticNameResolver {
    names: HashMap<u16, PropertyName>,
}

impl StaticNameResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a named-range identifier to its resolution.
    #[must_use]
    pub fn with(mut self, id: u16, name: PropertyName) -> Self {
        self.names.insert(id, name);
        self
    }
}

impl NameResolver for StaticNameResolver {
    fn resolve(&self, tag: PropertyTag) -> Option<PropertyName> {
        self.names.get(&tag.id()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_opens_a_context() {
        with_test_store(|store, ctx| {
            assert_eq!(store.context_ref_count(ctx).unwrap(), 1);
            assert_eq!(
                store.search_context_by_uri("oxmem://test/store").unwrap(),
                ctx
            );
        });
    }

    #[test]
    fn folder_helper_creates_a_named_child() {
        let fixture = TestStore::new();
        let inbox = fixture.folder(0x10, "Inbox");
        assert_eq!(
            fixture
                .get_fid_by_name(fixture.ctx, ROOT_FOLDER, "Inbox")
                .unwrap(),
            inbox
        );
    }

    #[test]
    fn static_resolver_resolves_configured_ids() {
        use oxmapi_props::PropType;

        let resolver = StaticNameResolver::new().with(0x8520, PropertyName::Numeric(0x1234));
        let tag = PropertyTag::new(0x8520, PropType::Long);
        assert_eq!(resolver.resolve(tag), Some(PropertyName::Numeric(0x1234)));
        assert_eq!(
            resolver.resolve(PropertyTag::new(0x8999, PropType::Long)),
            None
        );
    }
}
