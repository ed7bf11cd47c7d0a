//! # OXMAPI Store
//!
//! Pluggable storage backend layer for the OXMAPI messaging core.
//!
//! This crate provides:
//! - The backend contract ([`StoreBackend`], [`ContextOps`]) mapping
//!   folder/message/attachment operations onto a physical store
//! - A URI-namespace-keyed backend registry
//! - The context manager: reference-counted backend instances,
//!   addressable by id or URI ([`Store`], [`ContextRegistry`])
//! - The indexing subsystem mapping stable folder/message ids to
//!   backend-local paths ([`IndexingContext`])
//! - An in-memory reference backend ([`InMemoryBackend`])
//!
//! All operations are synchronous, blocking calls. The registry mutex
//! inside [`Store`] is the only lock the design requires; each opened
//! context belongs to exactly one session.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use oxmapi_store::{InMemoryBackend, Store};
//!
//! let mut store = Store::new();
//! store.register_backend(Arc::new(InMemoryBackend::new())).unwrap();
//!
//! let ctx = store.add_context("oxmem://alice/store").unwrap();
//! assert_eq!(store.search_context_by_uri("oxmem://alice/store").unwrap(), ctx);
//! store.release_context(ctx);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod context;
mod error;
mod indexing;
mod memory;
mod registry;
mod store;
mod types;

pub use backend::{AttachmentId, ContextOps, StoreBackend, TableHandle};
pub use context::{BackendContext, ContextRegistry, ReleaseOutcome};
pub use error::{StoreError, StoreResult};
pub use indexing::{IndexingContext, IndexingRegistry};
pub use memory::{InMemoryBackend, ROOT_FOLDER, STATUS_FOLDER_NOT_EMPTY};
pub use registry::BackendRegistry;
pub use store::Store;
pub use types::{
    ContextId, DeleteMode, FolderId, Message, MessageId, ObjectKind, QueryMode, RecipientChange,
    RecipientOp, RelOp, Restriction, SaveMode, SortOrder, SortOrderSet, TableKind,
};
