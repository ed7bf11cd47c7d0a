//! The store facade: one storage session.
//!
//! A [`Store`] owns the backend registry, the context registry and the
//! indexing registry for the lifetime of one storage session. Callers
//! resolve URIs to context ids once, then address every operation by
//! context id. Registry state is shared process-wide; all of its
//! mutations are serialized under a single mutex, the only lock this
//! layer requires. Backend calls themselves run outside that lock: a
//! context belongs to one session and carries its own uncontended
//! handle lock, so a backend blocked on physical I/O never stalls
//! unrelated sessions.

use std::io;
use std::sync::Arc;

use oxmapi_props::{PropertyTag, PropertyValue, Row, TagList};
use parking_lot::Mutex;
use tracing::debug;

use crate::backend::{AttachmentId, ContextOps, StoreBackend, TableHandle};
use crate::context::{BackendContext, ContextRegistry, ReleaseOutcome};
use crate::error::{StoreError, StoreResult};
use crate::indexing::IndexingRegistry;
use crate::registry::BackendRegistry;
use crate::types::{
    ContextId, DeleteMode, FolderId, Message, MessageId, ObjectKind, QueryMode, RecipientChange,
    Restriction, SaveMode, SortOrderSet, TableKind,
};

struct StoreInner {
    contexts: ContextRegistry,
    indexing: IndexingRegistry,
}

/// One storage session: registered backends plus the live contexts and
/// indexing state opened through them.
pub struct Store {
    backends: BackendRegistry,
    inner: Mutex<StoreInner>,
}

impl Store {
    /// Creates a store with no backends registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backends: BackendRegistry::new(),
            inner: Mutex::new(StoreInner {
                contexts: ContextRegistry::new(),
                indexing: IndexingRegistry::new(),
            }),
        }
    }

    /// Registers a backend. Registration happens during setup, before
    /// contexts are opened.
    ///
    /// # Errors
    ///
    /// See [`BackendRegistry::register`].
    pub fn register_backend(&mut self, backend: Arc<dyn StoreBackend>) -> StoreResult<()> {
        self.backends.register(backend)
    }

    // -- context management ------------------------------------------

    /// Opens a context for a URI, selecting the backend whose namespace
    /// matches the URI's scheme. The new context starts with reference
    /// count 1.
    ///
    /// # Errors
    ///
    /// [`StoreError::NoBackend`] for an unmatched scheme; any error the
    /// backend's `create_context` reports.
    pub fn add_context(&self, uri: &str) -> StoreResult<ContextId> {
        let backend = self.backends.by_uri(uri)?;
        let ops = backend.create_context(uri)?;
        let id = self.inner.lock().contexts.insert(backend, ops, uri);
        Ok(id)
    }

    /// Increments a context's reference count.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown id.
    pub fn add_ref(&self, id: ContextId) -> StoreResult<u32> {
        self.inner.lock().contexts.add_ref(id)
    }

    /// Bulk reference-count adjustment for batch-opened handles that
    /// share one physical context.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown id.
    pub fn add_ref_count(&self, id: ContextId, delta: u32) -> StoreResult<u32> {
        self.inner.lock().contexts.add_ref_count(id, delta)
    }

    /// Releases one reference to a context; the backend instance is
    /// torn down when the last reference goes away. Releasing an
    /// unknown id is a logged no-op.
    pub fn release_context(&self, id: ContextId) -> ReleaseOutcome {
        self.inner.lock().contexts.release(id)
    }

    /// Finds the live context opened with exactly this URI.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no live context matches.
    pub fn search_context_by_uri(&self, uri: &str) -> StoreResult<ContextId> {
        self.inner.lock().contexts.lookup_by_uri(uri).map(BackendContext::id)
    }

    /// Current reference count of a context.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown id.
    pub fn context_ref_count(&self, id: ContextId) -> StoreResult<u32> {
        self.inner
            .lock()
            .contexts
            .lookup_by_id(id)
            .map(BackendContext::ref_count)
    }

    // -- indexing ----------------------------------------------------

    /// Associates a context with a user's indexing state, creating the
    /// indexing context on first use.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown context id.
    pub fn add_context_indexing(&self, username: &str, id: ContextId) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        let indexing = inner.indexing.add(username);
        let ctx = inner.contexts.lookup_by_id_mut(id)?;
        ctx.set_indexing(indexing);
        debug!(context = %id, username, "indexing attached");
        Ok(())
    }

    /// Records a folder id in the context's indexing state, resolving
    /// the backend-local path once.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotInitialized`] when no indexing is attached;
    /// [`StoreError::AlreadyExists`] for a duplicate mapping.
    pub fn indexing_add_fid(&self, id: ContextId, fid: FolderId) -> StoreResult<()> {
        let (ops, indexing) = self.ops_and_indexing(id)?;
        let uri = ops.lock().path_of(fid.as_u64(), ObjectKind::Folder)?;
        let result = indexing.lock().add_fid(fid, uri);
        result
    }

    /// Removes a folder id from the context's indexing state.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotInitialized`] when no indexing is attached;
    /// [`StoreError::NotFound`] for an unmapped id.
    pub fn indexing_del_fid(
        &self,
        id: ContextId,
        fid: FolderId,
        mode: DeleteMode,
    ) -> StoreResult<()> {
        let (_, indexing) = self.ops_and_indexing(id)?;
        let result = indexing.lock().del_fid(fid, mode);
        result
    }

    /// Records a message id in the context's indexing state.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Store::indexing_add_fid`].
    pub fn indexing_add_mid(&self, id: ContextId, mid: MessageId) -> StoreResult<()> {
        let (ops, indexing) = self.ops_and_indexing(id)?;
        let uri = ops.lock().path_of(mid.as_u64(), ObjectKind::Message)?;
        let result = indexing.lock().add_mid(mid, uri);
        result
    }

    /// Removes a message id from the context's indexing state, softly
    /// or permanently.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Store::indexing_del_fid`].
    pub fn indexing_del_mid(
        &self,
        id: ContextId,
        mid: MessageId,
        mode: DeleteMode,
    ) -> StoreResult<()> {
        let (_, indexing) = self.ops_and_indexing(id)?;
        let result = indexing.lock().del_mid(mid, mode);
        result
    }

    /// Enumerates every folder id reachable from a root through the
    /// context's indexing state, avoiding per-step backend resolution.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotInitialized`] when no indexing is attached;
    /// [`StoreError::NotFound`] for an unmapped root.
    pub fn folders_list(&self, id: ContextId, root: FolderId) -> StoreResult<Vec<FolderId>> {
        let (_, indexing) = self.ops_and_indexing(id)?;
        let list = indexing.lock().folder_list(root)?;
        Ok(list)
    }

    // -- folder operations -------------------------------------------

    /// Creates a folder under a parent.
    ///
    /// # Errors
    ///
    /// Backend-defined; unknown context ids are [`StoreError::NotFound`].
    pub fn mkdir(
        &self,
        id: ContextId,
        parent: FolderId,
        fid: FolderId,
        properties: &Row,
    ) -> StoreResult<()> {
        self.ops_of(id)?.lock().mkdir(parent, fid, properties)
    }

    /// Removes a folder.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn rmdir(&self, id: ContextId, parent: FolderId, fid: FolderId) -> StoreResult<()> {
        self.ops_of(id)?.lock().rmdir(parent, fid)
    }

    /// Opens a folder for enumeration.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn opendir(&self, id: ContextId, parent: FolderId, fid: FolderId) -> StoreResult<()> {
        self.ops_of(id)?.lock().opendir(parent, fid)
    }

    /// Closes the folder opened last.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn closedir(&self, id: ContextId) -> StoreResult<()> {
        self.ops_of(id)?.lock().closedir()
    }

    /// Counts a folder's child folders.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn folder_count(&self, id: ContextId, fid: FolderId) -> StoreResult<u32> {
        self.ops_of(id)?.lock().readdir_count(fid, TableKind::Folders)
    }

    /// Counts a folder's messages in the given message table.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidParameter`] for a non-message table.
    pub fn message_count(
        &self,
        id: ContextId,
        fid: FolderId,
        table: TableKind,
    ) -> StoreResult<u32> {
        if !matches!(table, TableKind::Messages | TableKind::FaiMessages) {
            return Err(StoreError::invalid_parameter(
                "message_count takes a message table",
            ));
        }
        self.ops_of(id)?.lock().readdir_count(fid, table)
    }

    /// Reads one property of one row of a folder's table, enforcing the
    /// backend's advertised query modes before dispatch.
    ///
    /// # Errors
    ///
    /// [`StoreError::QueryModeNotSupported`] when the backend does not
    /// advertise the mode for this table; otherwise backend-defined.
    pub fn get_table_property(
        &self,
        id: ContextId,
        fid: FolderId,
        table: TableKind,
        mode: QueryMode,
        position: u32,
        tag: PropertyTag,
    ) -> StoreResult<PropertyValue> {
        let (backend, ops) = self.backend_and_ops(id)?;
        if !backend.supports_query_mode(table, mode) {
            return Err(StoreError::QueryModeNotSupported { mode });
        }
        let result = ops.lock().get_table_property(fid, table, mode, position, tag);
        result
    }

    /// Finds a child folder by display name.
    ///
    /// # Errors
    ///
    /// Backend-defined; a name miss is [`StoreError::NotFound`].
    pub fn get_fid_by_name(
        &self,
        id: ContextId,
        parent: FolderId,
        name: &str,
    ) -> StoreResult<FolderId> {
        self.ops_of(id)?.lock().fid_by_name(parent, name)
    }

    // -- message operations ------------------------------------------

    /// Opens a message.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn open_message(
        &self,
        id: ContextId,
        parent: FolderId,
        mid: MessageId,
    ) -> StoreResult<Message> {
        self.ops_of(id)?.lock().open_message(parent, mid)
    }

    /// Creates a message.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn create_message(
        &self,
        id: ContextId,
        parent: FolderId,
        mid: MessageId,
        fai: bool,
    ) -> StoreResult<()> {
        self.ops_of(id)?.lock().create_message(parent, mid, fai)
    }

    /// Persists pending changes on a message.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn save_changes(&self, id: ContextId, mid: MessageId, mode: SaveMode) -> StoreResult<()> {
        self.ops_of(id)?.lock().save_changes(mid, mode)
    }

    /// Submits a message for delivery.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn submit(&self, id: ContextId, mid: MessageId, mode: SaveMode) -> StoreResult<()> {
        self.ops_of(id)?.lock().submit(mid, mode)
    }

    /// Deletes a message, softly or permanently.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn delete_message(
        &self,
        id: ContextId,
        fid: FolderId,
        mid: MessageId,
        mode: DeleteMode,
    ) -> StoreResult<()> {
        self.ops_of(id)?.lock().delete_message(fid, mid, mode)
    }

    /// Reads the requested properties of a record into a row; missing
    /// properties come back as error-typed placeholders.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn get_props(
        &self,
        id: ContextId,
        record: u64,
        kind: ObjectKind,
        tags: &TagList,
    ) -> StoreResult<Row> {
        self.ops_of(id)?.lock().get_props(record, kind, tags)
    }

    /// Writes properties onto a record.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn set_props(
        &self,
        id: ContextId,
        record: u64,
        kind: ObjectKind,
        properties: &Row,
    ) -> StoreResult<()> {
        self.ops_of(id)?.lock().set_props(record, kind, properties)
    }

    /// Applies recipient-table changes to a message.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn modify_recipients(
        &self,
        id: ContextId,
        mid: MessageId,
        changes: &[RecipientChange],
    ) -> StoreResult<()> {
        self.ops_of(id)?.lock().modify_recipients(mid, changes)
    }

    /// Streams a property's value in from an external byte source.
    ///
    /// # Errors
    ///
    /// Backend-defined; source failures surface as [`StoreError::Io`].
    pub fn stream_property_in(
        &self,
        id: ContextId,
        record: u64,
        kind: ObjectKind,
        tag: PropertyTag,
        source: &mut dyn io::Read,
    ) -> StoreResult<u64> {
        self.ops_of(id)?.lock().stream_property_in(record, kind, tag, source)
    }

    /// Streams a property's value out to an external byte sink.
    ///
    /// # Errors
    ///
    /// Backend-defined; sink failures surface as [`StoreError::Io`].
    pub fn stream_property_out(
        &self,
        id: ContextId,
        record: u64,
        kind: ObjectKind,
        tag: PropertyTag,
        sink: &mut dyn io::Write,
    ) -> StoreResult<u64> {
        self.ops_of(id)?.lock().stream_property_out(record, kind, tag, sink)
    }

    /// Installs a restriction; `false` means the backend did not apply
    /// it and the caller must live-filter.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn set_restrictions(
        &self,
        id: ContextId,
        record: u64,
        kind: ObjectKind,
        restriction: &Restriction,
    ) -> StoreResult<bool> {
        self.ops_of(id)?.lock().set_restrictions(record, kind, restriction)
    }

    /// Installs a sort order; `false` means the backend did not apply it.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn set_sort_order(
        &self,
        id: ContextId,
        record: u64,
        kind: ObjectKind,
        sort_order: &SortOrderSet,
    ) -> StoreResult<bool> {
        self.ops_of(id)?.lock().set_sort_order(record, kind, sort_order)
    }

    /// Releases the backend-side state held for one record.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn release_record(&self, id: ContextId, record: u64, kind: ObjectKind) -> StoreResult<()> {
        self.ops_of(id)?.lock().release_record(record, kind)
    }

    /// Returns the backend-local path of a record.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn path_of(&self, id: ContextId, record: u64, kind: ObjectKind) -> StoreResult<String> {
        self.ops_of(id)?.lock().path_of(record, kind)
    }

    // -- attachment operations ---------------------------------------

    /// Opens a message's attachment table.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn get_attachment_table(
        &self,
        id: ContextId,
        mid: MessageId,
    ) -> StoreResult<(TableHandle, u32)> {
        self.ops_of(id)?.lock().attachment_table(mid)
    }

    /// Opens one attachment of a message.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn open_attachment(
        &self,
        id: ContextId,
        mid: MessageId,
        aid: AttachmentId,
    ) -> StoreResult<Row> {
        self.ops_of(id)?.lock().open_attachment(mid, aid)
    }

    /// Creates an attachment on a message, returning its id.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn create_attachment(&self, id: ContextId, mid: MessageId) -> StoreResult<AttachmentId> {
        self.ops_of(id)?.lock().create_attachment(mid)
    }

    // -- table operations --------------------------------------------

    /// Defines the column set subsequent row reads return.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn table_set_columns(
        &self,
        id: ContextId,
        handle: TableHandle,
        columns: &TagList,
    ) -> StoreResult<()> {
        self.ops_of(id)?.lock().table_set_columns(handle, columns)
    }

    /// Reads one table row; the result aligns with the installed
    /// column set.
    ///
    /// # Errors
    ///
    /// Backend-defined, including the backend's own query-mode
    /// rejection for handles whose table kind it cannot live-filter.
    pub fn table_row(
        &self,
        id: ContextId,
        handle: TableHandle,
        mode: QueryMode,
        position: u32,
    ) -> StoreResult<Vec<StoreResult<PropertyValue>>> {
        self.ops_of(id)?.lock().table_row(handle, mode, position)
    }

    // -- batch property operations -----------------------------------

    /// Reads properties of a record, one result per requested tag.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn get_properties(
        &self,
        id: ContextId,
        record: u64,
        kind: ObjectKind,
        tags: &TagList,
    ) -> StoreResult<Vec<StoreResult<PropertyValue>>> {
        self.ops_of(id)?.lock().get_properties(record, kind, tags)
    }

    /// Writes a row of properties onto a record.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    pub fn set_properties(
        &self,
        id: ContextId,
        record: u64,
        kind: ObjectKind,
        properties: &Row,
    ) -> StoreResult<()> {
        self.ops_of(id)?.lock().set_properties(record, kind, properties)
    }

    // -- plumbing ----------------------------------------------------

    /// Resolves a context id to its operations handle, holding the
    /// registry lock only for the lookup.
    fn ops_of(&self, id: ContextId) -> StoreResult<Arc<Mutex<Box<dyn ContextOps>>>> {
        self.inner.lock().contexts.lookup_by_id(id).map(BackendContext::ops)
    }

    fn backend_and_ops(
        &self,
        id: ContextId,
    ) -> StoreResult<(Arc<dyn StoreBackend>, Arc<Mutex<Box<dyn ContextOps>>>)> {
        let inner = self.inner.lock();
        let ctx = inner.contexts.lookup_by_id(id)?;
        Ok((Arc::clone(ctx.backend()), ctx.ops()))
    }

    fn ops_and_indexing(
        &self,
        id: ContextId,
    ) -> StoreResult<(
        Arc<Mutex<Box<dyn ContextOps>>>,
        Arc<Mutex<crate::indexing::IndexingContext>>,
    )> {
        let inner = self.inner.lock();
        let ctx = inner.contexts.lookup_by_id(id)?;
        let indexing = ctx.indexing().ok_or(StoreError::NotInitialized)?;
        Ok((ctx.ops(), indexing))
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
