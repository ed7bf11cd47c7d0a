//! In-memory storage backend.
//!
//! A complete [`StoreBackend`] implementation over an in-memory
//! folder/message/attachment tree. It backs the crate's own tests and
//! gives embedders a working reference for the contract. Only
//! prefiltered table reads are advertised, so query-mode enforcement is
//! observable against it.

use std::collections::HashMap;
use std::io::{Read, Write};

use oxmapi_props::{
    PropType, Property, PropertyTag, PropertyValue, Row, TagList,
};

use crate::backend::{AttachmentId, ContextOps, StoreBackend, TableHandle};
use crate::error::{StoreError, StoreResult};
use crate::types::{
    DeleteMode, FolderId, Message, MessageId, ObjectKind, QueryMode, RecipientChange, RecipientOp,
    Restriction, SaveMode, SortOrderSet, TableKind,
};

/// Display-name property, used for name lookups.
const PR_DISPLAY_NAME: PropertyTag = PropertyTag::new(0x3001, PropType::String8);
/// Recipient address property, used to match recipient rows.
const PR_EMAIL_ADDRESS: PropertyTag = PropertyTag::new(0x3003, PropType::String8);

/// Backend-documented status code: folder still has children.
pub const STATUS_FOLDER_NOT_EMPTY: u32 = 0x0001;

/// The root folder every fresh context starts with.
pub const ROOT_FOLDER: FolderId = FolderId::new(0x0001);

/// In-memory storage backend. Each context opened through it owns an
/// independent tree seeded with [`ROOT_FOLDER`].
#[derive(Debug, Default)]
pub struct InMemoryBackend;

impl InMemoryBackend {
    /// Creates the backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl StoreBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "oxmem"
    }

    fn description(&self) -> &str {
        "in-memory folder/message store"
    }

    fn uri_namespace(&self) -> &str {
        "oxmem://"
    }

    fn supports_query_mode(&self, _table: TableKind, mode: QueryMode) -> bool {
        mode == QueryMode::Prefiltered
    }

    fn create_context(&self, uri: &str) -> StoreResult<Box<dyn ContextOps>> {
        if !uri.starts_with(self.uri_namespace()) {
            return Err(StoreError::invalid_parameter(format!(
                "URI outside the oxmem namespace: {uri}"
            )));
        }
        Ok(Box::new(MemoryContext::new(uri)))
    }
}

#[derive(Debug, Clone)]
struct FolderRec {
    parent: FolderId,
    path: String,
    properties: Row,
}

#[derive(Debug, Clone)]
struct MessageRec {
    parent: FolderId,
    path: String,
    message: Message,
    fai: bool,
    soft_deleted: bool,
    submitted: bool,
}

#[derive(Debug, Clone)]
struct TableRec {
    mid: MessageId,
    columns: TagList,
}

/// One opened in-memory context.
#[derive(Debug, Default)]
struct MemoryContext {
    folders: HashMap<FolderId, FolderRec>,
    messages: HashMap<MessageId, MessageRec>,
    attachments: HashMap<MessageId, Vec<Row>>,
    open_dirs: Vec<FolderId>,
    tables: HashMap<TableHandle, TableRec>,
    next_table: TableHandle,
    restriction: Option<Restriction>,
    sort_order: Option<SortOrderSet>,
}

impl MemoryContext {
    fn new(uri: &str) -> Self {
        let mut ctx = Self::default();
        ctx.folders.insert(
            ROOT_FOLDER,
            FolderRec {
                parent: ROOT_FOLDER,
                path: uri.trim_end_matches('/').to_string(),
                properties: Row::new(),
            },
        );
        ctx
    }

    fn folder(&self, fid: FolderId) -> StoreResult<&FolderRec> {
        self.folders.get(&fid).ok_or(StoreError::NotFound)
    }

    fn message(&self, mid: MessageId) -> StoreResult<&MessageRec> {
        match self.messages.get(&mid) {
            Some(rec) if !rec.soft_deleted => Ok(rec),
            _ => Err(StoreError::NotFound),
        }
    }

    fn message_mut(&mut self, mid: MessageId) -> StoreResult<&mut MessageRec> {
        match self.messages.get_mut(&mid) {
            Some(rec) if !rec.soft_deleted => Ok(rec),
            _ => Err(StoreError::NotFound),
        }
    }

    fn child_folders(&self, fid: FolderId) -> Vec<FolderId> {
        let mut children: Vec<FolderId> = self
            .folders
            .iter()
            .filter(|(id, rec)| rec.parent == fid && **id != fid)
            .map(|(id, _)| *id)
            .collect();
        children.sort();
        children
    }

    fn folder_messages(&self, fid: FolderId, fai: bool) -> Vec<MessageId> {
        let mut mids: Vec<MessageId> = self
            .messages
            .iter()
            .filter(|(_, rec)| rec.parent == fid && rec.fai == fai && !rec.soft_deleted)
            .map(|(id, _)| *id)
            .collect();
        mids.sort();
        mids
    }

    fn record_row(&self, id: u64, kind: ObjectKind) -> StoreResult<&Row> {
        match kind {
            ObjectKind::Folder => Ok(&self.folder(FolderId::new(id))?.properties),
            ObjectKind::Message => Ok(&self.message(MessageId::new(id))?.message.properties),
            ObjectKind::Attachment => Err(StoreError::invalid_parameter(
                "attachments are addressed through their message",
            )),
        }
    }

    fn record_row_mut(&mut self, id: u64, kind: ObjectKind) -> StoreResult<&mut Row> {
        match kind {
            ObjectKind::Folder => Ok(&mut self
                .folders
                .get_mut(&FolderId::new(id))
                .ok_or(StoreError::NotFound)?
                .properties),
            ObjectKind::Message => Ok(&mut self.message_mut(MessageId::new(id))?.message.properties),
            ObjectKind::Attachment => Err(StoreError::invalid_parameter(
                "attachments are addressed through their message",
            )),
        }
    }

    fn table_rows(&self, fid: FolderId, table: TableKind) -> StoreResult<Vec<&Row>> {
        let rows = match table {
            TableKind::Folders => self
                .child_folders(fid)
                .into_iter()
                .filter_map(|id| self.folders.get(&id).map(|rec| &rec.properties))
                .collect(),
            TableKind::Messages => self
                .folder_messages(fid, false)
                .into_iter()
                .filter_map(|id| self.messages.get(&id).map(|rec| &rec.message.properties))
                .collect(),
            TableKind::FaiMessages => self
                .folder_messages(fid, true)
                .into_iter()
                .filter_map(|id| self.messages.get(&id).map(|rec| &rec.message.properties))
                .collect(),
            TableKind::Rules => Vec::new(),
        };
        Ok(rows)
    }

    fn display_name(properties: &Row) -> Option<&str> {
        properties.get(PR_DISPLAY_NAME)?.as_str()
    }
}

impl ContextOps for MemoryContext {
    fn release_record(&mut self, id: u64, kind: ObjectKind) -> StoreResult<()> {
        // Nothing backend-side is cached per record; just validate it.
        self.record_row(id, kind).map(|_| ())
    }

    fn path_of(&self, id: u64, kind: ObjectKind) -> StoreResult<String> {
        match kind {
            ObjectKind::Folder => Ok(self.folder(FolderId::new(id))?.path.clone()),
            ObjectKind::Message => Ok(self.message(MessageId::new(id))?.path.clone()),
            ObjectKind::Attachment => Err(StoreError::invalid_parameter(
                "attachments have no standalone path",
            )),
        }
    }

    fn mkdir(&mut self, parent: FolderId, fid: FolderId, properties: &Row) -> StoreResult<()> {
        let parent_path = self.folder(parent)?.path.clone();
        if self.folders.contains_key(&fid) {
            return Err(StoreError::already_exists(fid.to_string()));
        }
        let segment = Self::display_name(properties)
            .map(str::to_string)
            .unwrap_or_else(|| format!("0x{:x}", fid.as_u64()));
        self.folders.insert(
            fid,
            FolderRec {
                parent,
                path: format!("{parent_path}/{segment}"),
                properties: properties.clone(),
            },
        );
        Ok(())
    }

    fn rmdir(&mut self, _parent: FolderId, fid: FolderId) -> StoreResult<()> {
        self.folder(fid)?;
        if !self.child_folders(fid).is_empty()
            || !self.folder_messages(fid, false).is_empty()
            || !self.folder_messages(fid, true).is_empty()
        {
            return Err(StoreError::backend(
                STATUS_FOLDER_NOT_EMPTY,
                "folder not empty",
            ));
        }
        self.folders.remove(&fid);
        Ok(())
    }

    fn opendir(&mut self, _parent: FolderId, fid: FolderId) -> StoreResult<()> {
        self.folder(fid)?;
        self.open_dirs.push(fid);
        Ok(())
    }

    fn closedir(&mut self) -> StoreResult<()> {
        self.open_dirs.pop();
        Ok(())
    }

    fn readdir_count(&self, fid: FolderId, table: TableKind) -> StoreResult<u32> {
        self.folder(fid)?;
        let count = match table {
            TableKind::Folders => self.child_folders(fid).len(),
            TableKind::Messages => self.folder_messages(fid, false).len(),
            TableKind::FaiMessages => self.folder_messages(fid, true).len(),
            TableKind::Rules => 0,
        };
        Ok(count as u32)
    }

    fn get_table_property(
        &self,
        fid: FolderId,
        table: TableKind,
        mode: QueryMode,
        position: u32,
        tag: PropertyTag,
    ) -> StoreResult<PropertyValue> {
        if mode != QueryMode::Prefiltered {
            return Err(StoreError::QueryModeNotSupported { mode });
        }
        let rows = self.table_rows(fid, table)?;
        let row = rows
            .get(position as usize)
            .ok_or(StoreError::NotFound)?;
        row.get(tag).cloned().ok_or(StoreError::NotFound)
    }

    fn fid_by_name(&self, parent: FolderId, name: &str) -> StoreResult<FolderId> {
        self.folder(parent)?;
        self.child_folders(parent)
            .into_iter()
            .find(|fid| {
                self.folders
                    .get(fid)
                    .and_then(|rec| Self::display_name(&rec.properties))
                    .is_some_and(|n| n == name)
            })
            .ok_or(StoreError::NotFound)
    }

    fn open_message(&mut self, parent: FolderId, mid: MessageId) -> StoreResult<Message> {
        let rec = self.message(mid)?;
        if rec.parent != parent {
            return Err(StoreError::NotFound);
        }
        Ok(rec.message.clone())
    }

    fn create_message(&mut self, parent: FolderId, mid: MessageId, fai: bool) -> StoreResult<()> {
        let parent_path = self.folder(parent)?.path.clone();
        if self.messages.contains_key(&mid) {
            return Err(StoreError::already_exists(mid.to_string()));
        }
        self.messages.insert(
            mid,
            MessageRec {
                parent,
                path: format!("{parent_path}/0x{:x}", mid.as_u64()),
                message: Message::default(),
                fai,
                soft_deleted: false,
                submitted: false,
            },
        );
        Ok(())
    }

    fn save_changes(&mut self, mid: MessageId, _mode: SaveMode) -> StoreResult<()> {
        self.message_mut(mid).map(|_| ())
    }

    fn submit(&mut self, mid: MessageId, _mode: SaveMode) -> StoreResult<()> {
        self.message_mut(mid)?.submitted = true;
        Ok(())
    }

    fn delete_message(&mut self, fid: FolderId, mid: MessageId, mode: DeleteMode) -> StoreResult<()> {
        let rec = self.messages.get_mut(&mid).ok_or(StoreError::NotFound)?;
        if rec.parent != fid {
            return Err(StoreError::NotFound);
        }
        match mode {
            DeleteMode::Soft => rec.soft_deleted = true,
            DeleteMode::Permanent => {
                self.messages.remove(&mid);
                self.attachments.remove(&mid);
            }
        }
        Ok(())
    }

    fn get_props(&self, id: u64, kind: ObjectKind, tags: &TagList) -> StoreResult<Row> {
        let source = self.record_row(id, kind)?;
        let mut row = Row::new();
        for tag in tags.iter() {
            match source.property(tag) {
                Some(property) => row.upsert(property.clone()),
                None => row.upsert(Property::write_failed(tag)),
            }
        }
        Ok(row)
    }

    fn set_props(&mut self, id: u64, kind: ObjectKind, properties: &Row) -> StoreResult<()> {
        let target = self.record_row_mut(id, kind)?;
        for property in properties.iter() {
            target.upsert(property.clone());
        }
        Ok(())
    }

    fn modify_recipients(&mut self, mid: MessageId, changes: &[RecipientChange]) -> StoreResult<()> {
        let rec = self.message_mut(mid)?;
        for change in changes {
            let address = change.row.get(PR_EMAIL_ADDRESS).and_then(|v| v.as_str());
            match change.op {
                RecipientOp::Add => rec.message.recipients.push(change.row.clone()),
                RecipientOp::Modify => {
                    let rows = rec.message.recipients.rows_mut();
                    let slot = rows.iter_mut().find(|row| {
                        row.get(PR_EMAIL_ADDRESS).and_then(|v| v.as_str()) == address
                    });
                    match slot {
                        Some(row) => *row = change.row.clone(),
                        None => rec.message.recipients.push(change.row.clone()),
                    }
                }
                RecipientOp::Remove => {
                    let kept: Vec<Row> = rec
                        .message
                        .recipients
                        .iter()
                        .filter(|row| {
                            row.get(PR_EMAIL_ADDRESS).and_then(|v| v.as_str()) != address
                        })
                        .cloned()
                        .collect();
                    rec.message.recipients = kept.into_iter().collect();
                }
            }
        }
        Ok(())
    }

    fn stream_property_in(
        &mut self,
        id: u64,
        kind: ObjectKind,
        tag: PropertyTag,
        source: &mut dyn Read,
    ) -> StoreResult<u64> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        let len = data.len() as u64;
        let value = match tag.prop_type().map_err(StoreError::from)? {
            PropType::String8 => PropertyValue::String8(
                String::from_utf8(data).map_err(|_| oxmapi_props::CodecError::InvalidUtf8)?,
            ),
            _ => PropertyValue::Binary(data),
        };
        let target = self.record_row_mut(id, kind)?;
        target.upsert(Property::new(tag.id(), value));
        Ok(len)
    }

    fn stream_property_out(
        &self,
        id: u64,
        kind: ObjectKind,
        tag: PropertyTag,
        sink: &mut dyn Write,
    ) -> StoreResult<u64> {
        let source = self.record_row(id, kind)?;
        let value = source.get(tag).ok_or(StoreError::NotFound)?;
        let bytes: &[u8] = match value {
            PropertyValue::Binary(b) | PropertyValue::ServerId(b) => b,
            PropertyValue::String8(s) | PropertyValue::Unicode(s) => s.as_bytes(),
            _ => {
                return Err(StoreError::invalid_parameter(
                    "property is not streamable",
                ))
            }
        };
        sink.write_all(bytes)?;
        Ok(bytes.len() as u64)
    }

    fn set_restrictions(
        &mut self,
        _id: u64,
        _kind: ObjectKind,
        restriction: &Restriction,
    ) -> StoreResult<bool> {
        // Stored but not evaluated; callers prefilter, as advertised.
        self.restriction = Some(restriction.clone());
        Ok(false)
    }

    fn set_sort_order(
        &mut self,
        _id: u64,
        _kind: ObjectKind,
        sort_order: &SortOrderSet,
    ) -> StoreResult<bool> {
        self.sort_order = Some(sort_order.clone());
        Ok(false)
    }

    fn attachment_table(&mut self, mid: MessageId) -> StoreResult<(TableHandle, u32)> {
        self.message(mid)?;
        let count = self.attachments.get(&mid).map_or(0, Vec::len) as u32;
        let handle = self.next_table;
        self.next_table += 1;
        self.tables.insert(
            handle,
            TableRec {
                mid,
                columns: TagList::new(),
            },
        );
        Ok((handle, count))
    }

    fn open_attachment(&mut self, mid: MessageId, aid: AttachmentId) -> StoreResult<Row> {
        self.message(mid)?;
        self.attachments
            .get(&mid)
            .and_then(|rows| rows.get(aid as usize))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn create_attachment(&mut self, mid: MessageId) -> StoreResult<AttachmentId> {
        self.message(mid)?;
        let rows = self.attachments.entry(mid).or_default();
        rows.push(Row::new());
        Ok((rows.len() - 1) as AttachmentId)
    }

    fn table_set_columns(&mut self, handle: TableHandle, columns: &TagList) -> StoreResult<()> {
        let table = self.tables.get_mut(&handle).ok_or(StoreError::NotFound)?;
        table.columns = columns.clone();
        Ok(())
    }

    fn table_row(
        &mut self,
        handle: TableHandle,
        mode: QueryMode,
        position: u32,
    ) -> StoreResult<Vec<StoreResult<PropertyValue>>> {
        if mode != QueryMode::Prefiltered {
            return Err(StoreError::QueryModeNotSupported { mode });
        }
        let table = self.tables.get(&handle).ok_or(StoreError::NotFound)?;
        let row = self
            .attachments
            .get(&table.mid)
            .and_then(|rows| rows.get(position as usize))
            .ok_or(StoreError::NotFound)?;
        Ok(table
            .columns
            .iter()
            .map(|tag| row.get(tag).cloned().ok_or(StoreError::NotFound))
            .collect())
    }

    fn get_properties(
        &self,
        id: u64,
        kind: ObjectKind,
        tags: &TagList,
    ) -> StoreResult<Vec<StoreResult<PropertyValue>>> {
        let source = self.record_row(id, kind)?;
        Ok(tags
            .iter()
            .map(|tag| source.get(tag).cloned().ok_or(StoreError::NotFound))
            .collect())
    }

    fn set_properties(&mut self, id: u64, kind: ObjectKind, properties: &Row) -> StoreResult<()> {
        self.set_props(id, kind, properties)
    }
}
