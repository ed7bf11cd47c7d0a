//! End-to-end storage session: a mailbox built, indexed, walked and
//! torn down through the public facade only.

use std::sync::Arc;

use oxmapi_props::{PropType, Property, PropertyTag, Row, TagList};
use oxmapi_store::{
    DeleteMode, FolderId, InMemoryBackend, MessageId, ObjectKind, QueryMode, ReleaseOutcome,
    SaveMode, Store, TableKind, ROOT_FOLDER,
};

const PR_DISPLAY_NAME: PropertyTag = PropertyTag::new(0x3001, PropType::String8);
const PR_SUBJECT: PropertyTag = PropertyTag::new(0x0037, PropType::String8);

fn named_row(name: &str) -> Row {
    let mut row = Row::new();
    row.upsert(Property::new(0x3001, name));
    row
}

fn session_store() -> Store {
    let mut store = Store::new();
    store
        .register_backend(Arc::new(InMemoryBackend::new()))
        .unwrap();
    store
}

#[test]
fn mailbox_session_end_to_end() {
    let store = session_store();
    let ctx = store.add_context("oxmem://alice/store").unwrap();
    store.add_context_indexing("alice", ctx).unwrap();

    // Build a small hierarchy.
    let inbox = FolderId::new(0x10);
    let archive = FolderId::new(0x11);
    store.mkdir(ctx, ROOT_FOLDER, inbox, &named_row("Inbox")).unwrap();
    store.mkdir(ctx, inbox, archive, &named_row("Archive")).unwrap();
    assert_eq!(store.folder_count(ctx, ROOT_FOLDER).unwrap(), 1);
    assert_eq!(store.get_fid_by_name(ctx, ROOT_FOLDER, "Inbox").unwrap(), inbox);

    // Index the folders once; hierarchy walks then skip the backend.
    store.indexing_add_fid(ctx, ROOT_FOLDER).unwrap();
    store.indexing_add_fid(ctx, inbox).unwrap();
    store.indexing_add_fid(ctx, archive).unwrap();
    assert_eq!(
        store.folders_list(ctx, ROOT_FOLDER).unwrap(),
        vec![ROOT_FOLDER, inbox, archive]
    );
    assert_eq!(store.folders_list(ctx, inbox).unwrap(), vec![inbox, archive]);

    // A message with properties and a recipient-free save/submit cycle.
    let mid = MessageId::new(0x100);
    store.create_message(ctx, inbox, mid, false).unwrap();
    let mut props = Row::new();
    props.upsert(Property::new(0x0037, "quarterly numbers"));
    store
        .set_props(ctx, mid.as_u64(), ObjectKind::Message, &props)
        .unwrap();
    store.save_changes(ctx, mid, SaveMode::KeepOpenReadWrite).unwrap();
    store.submit(ctx, mid, SaveMode::Close).unwrap();
    store.indexing_add_mid(ctx, mid).unwrap();

    let message = store.open_message(ctx, inbox, mid).unwrap();
    assert_eq!(
        message.properties.get(PR_SUBJECT).unwrap().as_str(),
        Some("quarterly numbers")
    );

    // Table read in the advertised mode.
    let name = store
        .get_table_property(
            ctx,
            inbox,
            TableKind::Folders,
            QueryMode::Prefiltered,
            0,
            PR_DISPLAY_NAME,
        )
        .unwrap();
    assert_eq!(name.as_str(), Some("Archive"));

    // Batch property read with a deliberate miss.
    let tags = TagList::from_slice(&[PR_SUBJECT, PropertyTag::new(0x0E06, PropType::SysTime)]);
    let results = store
        .get_properties(ctx, mid.as_u64(), ObjectKind::Message, &tags)
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].as_ref().unwrap_err().is_not_found());

    // Soft-delete keeps the indexing record, permanent delete drops it.
    store.delete_message(ctx, inbox, mid, DeleteMode::Soft).unwrap();
    store.indexing_del_mid(ctx, mid, DeleteMode::Soft).unwrap();
    assert!(store.open_message(ctx, inbox, mid).unwrap_err().is_not_found());
    store
        .delete_message(ctx, inbox, mid, DeleteMode::Permanent)
        .unwrap();
    store
        .indexing_del_mid(ctx, mid, DeleteMode::Permanent)
        .unwrap();

    // Second handle to the same context via bulk ref counting.
    store.add_ref_count(ctx, 2).unwrap();
    assert_eq!(store.context_ref_count(ctx).unwrap(), 3);
    assert_eq!(store.release_context(ctx), ReleaseOutcome::Decremented(2));
    assert_eq!(store.release_context(ctx), ReleaseOutcome::Decremented(1));
    assert_eq!(store.release_context(ctx), ReleaseOutcome::Removed);
    assert!(store
        .search_context_by_uri("oxmem://alice/store")
        .unwrap_err()
        .is_not_found());
}

#[test]
fn attachment_session() {
    let store = session_store();
    let ctx = store.add_context("oxmem://bob/store").unwrap();

    let mid = MessageId::new(0x200);
    store.create_message(ctx, ROOT_FOLDER, mid, false).unwrap();

    let first = store.create_attachment(ctx, mid).unwrap();
    let second = store.create_attachment(ctx, mid).unwrap();
    assert_ne!(first, second);

    let (handle, count) = store.get_attachment_table(ctx, mid).unwrap();
    assert_eq!(count, 2);

    let filename = PropertyTag::new(0x3704, PropType::String8);
    store
        .table_set_columns(ctx, handle, &TagList::from_slice(&[filename]))
        .unwrap();
    let row = store
        .table_row(ctx, handle, QueryMode::Prefiltered, 0)
        .unwrap();
    assert_eq!(row.len(), 1);

    assert!(store.open_attachment(ctx, mid, first).is_ok());
    assert!(store.open_attachment(ctx, mid, 99).unwrap_err().is_not_found());
}

#[test]
fn property_streaming_through_the_facade() {
    let store = session_store();
    let ctx = store.add_context("oxmem://carol/store").unwrap();
    let mid = MessageId::new(0x300);
    store.create_message(ctx, ROOT_FOLDER, mid, false).unwrap();

    let body = PropertyTag::new(0x1000, PropType::Binary);
    let mut source: &[u8] = b"streamed body";
    store
        .stream_property_in(ctx, mid.as_u64(), ObjectKind::Message, body, &mut source)
        .unwrap();

    let mut sink = Vec::new();
    let written = store
        .stream_property_out(ctx, mid.as_u64(), ObjectKind::Message, body, &mut sink)
        .unwrap();
    assert_eq!(written, 13);
    assert_eq!(sink, b"streamed body");
}
