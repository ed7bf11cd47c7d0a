//! Storage backend contract.
//!
//! A backend maps the protocol's folder/message/attachment operations
//! onto one physical store. Backends register under a URI namespace;
//! opening a URI yields a context — one live instance of the backend —
//! through which every subsequent operation flows.

use std::io;

use oxmapi_props::{PropertyTag, PropertyValue, Row, TagList};

use crate::error::{StoreError, StoreResult};
use crate::types::{
    DeleteMode, FolderId, Message, MessageId, ObjectKind, QueryMode, RecipientChange,
    Restriction, SaveMode, SortOrderSet, TableKind,
};

/// Identifier of an attachment within its message.
pub type AttachmentId = u32;

/// Backend-local handle to an opened table.
pub type TableHandle = u32;

/// A pluggable storage backend.
///
/// Implementations must be `Send + Sync`: one registry serves every
/// session in the process. Each opened context, by contrast, belongs to
/// exactly one session.
pub trait StoreBackend: Send + Sync {
    /// Short stable name, unique across registered backends.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// URI namespace this backend serves, scheme prefix included
    /// (for example `oxmem://`).
    fn uri_namespace(&self) -> &str;

    /// One-time initialization, run when the backend is registered.
    ///
    /// # Errors
    ///
    /// A failing backend is not registered.
    fn init(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Whether this backend honors the given query mode for the given
    /// table. Callers must not assume a backend supports both modes.
    fn supports_query_mode(&self, table: TableKind, mode: QueryMode) -> bool;

    /// Opens a context for a URI inside this backend's namespace.
    ///
    /// # Errors
    ///
    /// Backend-defined; a URI that names nothing is [`StoreError::NotFound`].
    fn create_context(&self, uri: &str) -> StoreResult<Box<dyn ContextOps>>;
}

/// Operations on one opened backend context.
///
/// Every method defaults to [`StoreError::NotImplemented`] so a backend
/// implements exactly the surface its store can honor; the teardown of
/// the context itself happens on drop.
#[allow(unused_variables)]
pub trait ContextOps: Send {
    // -- lifecycle ---------------------------------------------------

    /// Releases the backend-side state held for one record.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the record is unknown.
    fn release_record(&mut self, id: u64, kind: ObjectKind) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }

    /// Returns the backend-local path of a record.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the record is unknown.
    fn path_of(&self, id: u64, kind: ObjectKind) -> StoreResult<String> {
        Err(StoreError::NotImplemented)
    }

    // -- folder semantics --------------------------------------------

    /// Creates a folder under a parent, stamped with initial properties.
    ///
    /// # Errors
    ///
    /// [`StoreError::AlreadyExists`] for an id already in use.
    fn mkdir(&mut self, parent: FolderId, fid: FolderId, properties: &Row) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }

    /// Removes a folder.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown folder; backends may
    /// refuse to remove non-empty folders with a backend code.
    fn rmdir(&mut self, parent: FolderId, fid: FolderId) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }

    /// Opens a folder for enumeration.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown folder.
    fn opendir(&mut self, parent: FolderId, fid: FolderId) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }

    /// Closes the folder opened last.
    ///
    /// # Errors
    ///
    /// Backend-defined.
    fn closedir(&mut self) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }

    /// Counts the rows of one of a folder's tables.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown folder.
    fn readdir_count(&self, fid: FolderId, table: TableKind) -> StoreResult<u32> {
        Err(StoreError::NotImplemented)
    }

    /// Reads one property of one row of a folder's table.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the row or property is absent.
    fn get_table_property(
        &self,
        fid: FolderId,
        table: TableKind,
        mode: QueryMode,
        position: u32,
        tag: PropertyTag,
    ) -> StoreResult<PropertyValue> {
        Err(StoreError::NotImplemented)
    }

    /// Finds a child folder by display name.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no child carries the name.
    fn fid_by_name(&self, parent: FolderId, name: &str) -> StoreResult<FolderId> {
        Err(StoreError::NotImplemented)
    }

    // -- message semantics -------------------------------------------

    /// Opens a message, returning its properties and recipients.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown message.
    fn open_message(&mut self, parent: FolderId, mid: MessageId) -> StoreResult<Message> {
        Err(StoreError::NotImplemented)
    }

    /// Creates a message in a folder; `fai` marks it folder-associated.
    ///
    /// # Errors
    ///
    /// [`StoreError::AlreadyExists`] for an id already in use.
    fn create_message(&mut self, parent: FolderId, mid: MessageId, fai: bool) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }

    /// Persists pending changes on a message.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown message.
    fn save_changes(&mut self, mid: MessageId, mode: SaveMode) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }

    /// Submits a message for delivery.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown message.
    fn submit(&mut self, mid: MessageId, mode: SaveMode) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }

    /// Deletes a message from a folder.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown message.
    fn delete_message(&mut self, fid: FolderId, mid: MessageId, mode: DeleteMode) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }

    /// Reads the requested properties of a record into a row.
    ///
    /// Missing properties come back as error-typed placeholder entries,
    /// not as operation failure.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown record.
    fn get_props(&self, id: u64, kind: ObjectKind, tags: &TagList) -> StoreResult<Row> {
        Err(StoreError::NotImplemented)
    }

    /// Writes properties onto a record.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown record.
    fn set_props(&mut self, id: u64, kind: ObjectKind, properties: &Row) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }

    /// Applies recipient-table changes to a message.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown message.
    fn modify_recipients(&mut self, mid: MessageId, changes: &[RecipientChange]) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }

    /// Streams a property's value in from an external byte source.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] on source failure, [`StoreError::NotFound`]
    /// for an unknown record.
    fn stream_property_in(
        &mut self,
        id: u64,
        kind: ObjectKind,
        tag: PropertyTag,
        source: &mut dyn io::Read,
    ) -> StoreResult<u64> {
        Err(StoreError::NotImplemented)
    }

    /// Streams a property's value out to an external byte sink.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] on sink failure, [`StoreError::NotFound`]
    /// when the record or property is absent.
    fn stream_property_out(
        &self,
        id: u64,
        kind: ObjectKind,
        tag: PropertyTag,
        sink: &mut dyn io::Write,
    ) -> StoreResult<u64> {
        Err(StoreError::NotImplemented)
    }

    /// Installs a restriction on a record's tables.
    ///
    /// Returns whether the backend applied it; a `false` return tells
    /// the caller to live-filter on its side.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown record.
    fn set_restrictions(
        &mut self,
        id: u64,
        kind: ObjectKind,
        restriction: &Restriction,
    ) -> StoreResult<bool> {
        Err(StoreError::NotImplemented)
    }

    /// Installs a sort order on a record's tables.
    ///
    /// Returns whether the backend applied it.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown record.
    fn set_sort_order(
        &mut self,
        id: u64,
        kind: ObjectKind,
        sort_order: &SortOrderSet,
    ) -> StoreResult<bool> {
        Err(StoreError::NotImplemented)
    }

    // -- attachment semantics ----------------------------------------

    /// Opens a message's attachment table.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown message.
    fn attachment_table(&mut self, mid: MessageId) -> StoreResult<(TableHandle, u32)> {
        Err(StoreError::NotImplemented)
    }

    /// Opens one attachment of a message.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown attachment.
    fn open_attachment(&mut self, mid: MessageId, aid: AttachmentId) -> StoreResult<Row> {
        Err(StoreError::NotImplemented)
    }

    /// Creates an attachment on a message, returning its id.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown message.
    fn create_attachment(&mut self, mid: MessageId) -> StoreResult<AttachmentId> {
        Err(StoreError::NotImplemented)
    }

    // -- table semantics ---------------------------------------------

    /// Defines the column set subsequent row reads return.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown table handle.
    fn table_set_columns(&mut self, handle: TableHandle, columns: &TagList) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }

    /// Reads one table row under the given query mode.
    ///
    /// The result aligns with the installed column set: one entry per
    /// column, each either the value or the per-property miss.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the position is past the end.
    fn table_row(
        &mut self,
        handle: TableHandle,
        mode: QueryMode,
        position: u32,
    ) -> StoreResult<Vec<StoreResult<PropertyValue>>> {
        Err(StoreError::NotImplemented)
    }

    // -- batch property semantics ------------------------------------

    /// Reads properties of a record, one result per requested tag.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown record.
    fn get_properties(
        &self,
        id: u64,
        kind: ObjectKind,
        tags: &TagList,
    ) -> StoreResult<Vec<StoreResult<PropertyValue>>> {
        Err(StoreError::NotImplemented)
    }

    /// Writes a row of properties onto a record.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown record.
    fn set_properties(&mut self, id: u64, kind: ObjectKind, properties: &Row) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BareBackendContext;

    impl ContextOps for BareBackendContext {}

    #[test]
    fn unimplemented_operations_report_not_implemented() {
        let mut ctx = BareBackendContext;
        assert!(matches!(
            ctx.mkdir(FolderId::new(1), FolderId::new(2), &Row::new()),
            Err(StoreError::NotImplemented)
        ));
        assert!(matches!(
            ctx.readdir_count(FolderId::new(1), TableKind::Messages),
            Err(StoreError::NotImplemented)
        ));
        assert!(matches!(
            ctx.create_attachment(MessageId::new(1)),
            Err(StoreError::NotImplemented)
        ));
    }
}
