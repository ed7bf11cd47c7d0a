//! Stable-id to backend-path indexing.
//!
//! Each backend context is associated with an indexing context that maps
//! stable folder and message identifiers to backend-local URIs, so
//! hierarchy walks do not pay a backend path resolution per step.
//! The folder hierarchy is derived from the URIs themselves: a folder is
//! reachable from a root when its URI lives under the root's URI.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::types::{DeleteMode, FolderId, MessageId};

/// One id-to-path mapping entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexRecord {
    uri: String,
    soft_deleted: bool,
}

/// Per-user indexing state: folder and message id mappings.
#[derive(Debug, Default)]
pub struct IndexingContext {
    folders: HashMap<FolderId, IndexRecord>,
    messages: HashMap<MessageId, IndexRecord>,
}

impl IndexingContext {
    /// Creates an empty indexing context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a folder id mapping.
    ///
    /// # Errors
    ///
    /// [`StoreError::AlreadyExists`] when the id is already mapped and
    /// not soft-deleted.
    pub fn add_fid(&mut self, fid: FolderId, uri: impl Into<String>) -> StoreResult<()> {
        match self.folders.get(&fid) {
            Some(record) if !record.soft_deleted => {
                Err(StoreError::already_exists(fid.to_string()))
            }
            _ => {
                self.folders.insert(
                    fid,
                    IndexRecord {
                        uri: uri.into(),
                        soft_deleted: false,
                    },
                );
                Ok(())
            }
        }
    }

    /// Removes a folder id mapping, softly or permanently.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unmapped id.
    pub fn del_fid(&mut self, fid: FolderId, mode: DeleteMode) -> StoreResult<()> {
        match mode {
            DeleteMode::Soft => {
                let record = self.folders.get_mut(&fid).ok_or(StoreError::NotFound)?;
                record.soft_deleted = true;
            }
            DeleteMode::Permanent => {
                self.folders.remove(&fid).ok_or(StoreError::NotFound)?;
            }
        }
        Ok(())
    }

    /// Records a message id mapping.
    ///
    /// # Errors
    ///
    /// [`StoreError::AlreadyExists`] when the id is already mapped and
    /// not soft-deleted.
    pub fn add_mid(&mut self, mid: MessageId, uri: impl Into<String>) -> StoreResult<()> {
        match self.messages.get(&mid) {
            Some(record) if !record.soft_deleted => {
                Err(StoreError::already_exists(mid.to_string()))
            }
            _ => {
                self.messages.insert(
                    mid,
                    IndexRecord {
                        uri: uri.into(),
                        soft_deleted: false,
                    },
                );
                Ok(())
            }
        }
    }

    /// Removes a message id mapping, softly or permanently.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unmapped id.
    pub fn del_mid(&mut self, mid: MessageId, mode: DeleteMode) -> StoreResult<()> {
        match mode {
            DeleteMode::Soft => {
                let record = self.messages.get_mut(&mid).ok_or(StoreError::NotFound)?;
                record.soft_deleted = true;
            }
            DeleteMode::Permanent => {
                self.messages.remove(&mid).ok_or(StoreError::NotFound)?;
            }
        }
        Ok(())
    }

    /// Resolves a folder id to its backend-local URI.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unmapped or soft-deleted ids.
    pub fn uri_of_fid(&self, fid: FolderId) -> StoreResult<&str> {
        match self.folders.get(&fid) {
            Some(record) if !record.soft_deleted => Ok(&record.uri),
            _ => Err(StoreError::NotFound),
        }
    }

    /// Resolves a message id to its backend-local URI.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unmapped or soft-deleted ids.
    pub fn uri_of_mid(&self, mid: MessageId) -> StoreResult<&str> {
        match self.messages.get(&mid) {
            Some(record) if !record.soft_deleted => Ok(&record.uri),
            _ => Err(StoreError::NotFound),
        }
    }

    /// Whether a message id is mapped but soft-deleted.
    #[must_use]
    pub fn is_mid_soft_deleted(&self, mid: MessageId) -> bool {
        self.messages
            .get(&mid)
            .map_or(false, |record| record.soft_deleted)
    }

    /// Enumerates every folder id reachable from a root, the root
    /// included, ordered parents-first by URI.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the root id is unmapped.
    pub fn folder_list(&self, root: FolderId) -> StoreResult<Vec<FolderId>> {
        let root_uri = self.uri_of_fid(root)?;
        let prefix = format!("{}/", root_uri.trim_end_matches('/'));

        let mut reachable: Vec<(&str, FolderId)> = self
            .folders
            .iter()
            .filter(|(_, record)| !record.soft_deleted)
            .filter(|(fid, record)| **fid == root || record.uri.starts_with(&prefix))
            .map(|(fid, record)| (record.uri.as_str(), *fid))
            .collect();
        reachable.sort();

        Ok(reachable.into_iter().map(|(_, fid)| fid).collect())
    }
}

/// Username-keyed collection of shared indexing contexts.
#[derive(Default)]
pub struct IndexingRegistry {
    contexts: HashMap<String, Arc<Mutex<IndexingContext>>>,
}

impl IndexingRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the indexing context for a user, creating it on first use.
    pub fn add(&mut self, username: &str) -> Arc<Mutex<IndexingContext>> {
        self.contexts
            .entry(username.to_string())
            .or_insert_with(|| {
                debug!(username, "created indexing context");
                Arc::new(Mutex::new(IndexingContext::new()))
            })
            .clone()
    }

    /// Looks up the indexing context for a user.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the user has no indexing context.
    pub fn get(&self, username: &str) -> StoreResult<Arc<Mutex<IndexingContext>>> {
        self.contexts
            .get(username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// Removes the indexing context for a user.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the user has no indexing context.
    pub fn del(&mut self, username: &str) -> StoreResult<()> {
        self.contexts
            .remove(username)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
