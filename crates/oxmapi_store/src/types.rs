//! Core type definitions for the storage layer.

use std::fmt;

use oxmapi_props::{PropertyTag, PropertyValue, Row, RowSet};

/// Stable identifier of a folder within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FolderId(pub u64);

impl FolderId {
    /// Creates a folder id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fid:0x{:016x}", self.0)
    }
}

/// Stable identifier of a message within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Creates a message id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mid:0x{:016x}", self.0)
    }
}

/// Identifier of one opened backend context.
///
/// Context ids are monotonically increasing and never reused while any
/// reference to the context is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(pub u32);

impl ContextId {
    /// Creates a context id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx:{}", self.0)
    }
}

/// The kind of record an identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A folder.
    Folder,
    /// A message.
    Message,
    /// An attachment.
    Attachment,
}

/// The table a folder-scoped enumeration walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Child folders.
    Folders,
    /// Ordinary messages.
    Messages,
    /// Folder-associated (hidden) messages.
    FaiMessages,
    /// Rule messages.
    Rules,
}

/// How a deletion behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeleteMode {
    /// Mark the record deleted; it remains recoverable.
    Soft,
    /// Remove the record outright.
    Permanent,
}

/// Who applies restriction and sort to a table read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    /// The caller has already applied restriction and sort; the backend
    /// only paginates.
    Prefiltered,
    /// The backend applies restriction and sort itself.
    LiveFiltered,
}

/// What happens to a message object after its changes are saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveMode {
    /// Keep the object open for reading.
    KeepOpenReadOnly,
    /// Keep the object open for further writes.
    KeepOpenReadWrite,
    /// Close the object.
    Close,
}

/// An opened message: its properties and its recipient table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    /// Message properties.
    pub properties: Row,
    /// One row per recipient.
    pub recipients: RowSet,
}

/// A recipient-table change.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipientChange {
    /// What to do with the row.
    pub op: RecipientOp,
    /// The recipient row the change carries.
    pub row: Row,
}

/// Operation applied to one recipient row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientOp {
    /// Add the recipient.
    Add,
    /// Modify the matching recipient.
    Modify,
    /// Remove the matching recipient.
    Remove,
}

/// Comparison operator in a property restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
}

/// A table restriction, applied by whoever the query mode says applies
/// it. Backends evaluate these; this layer only carries them.
#[derive(Debug, Clone, PartialEq)]
pub enum Restriction {
    /// All sub-restrictions must hold.
    And(Vec<Restriction>),
    /// At least one sub-restriction must hold.
    Or(Vec<Restriction>),
    /// The sub-restriction must not hold.
    Not(Box<Restriction>),
    /// String containment on a property.
    Content {
        /// The property examined.
        tag: PropertyTag,
        /// The needle.
        value: PropertyValue,
    },
    /// Relational comparison on a property.
    Property {
        /// Comparison operator.
        relop: RelOp,
        /// The property examined.
        tag: PropertyTag,
        /// The comparand.
        value: PropertyValue,
    },
    /// The property must exist on the row.
    Exist {
        /// The property examined.
        tag: PropertyTag,
    },
}

/// One sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    /// Property sorted on.
    pub tag: PropertyTag,
    /// Ascending when `true`.
    pub ascending: bool,
}

/// A full table sort specification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrderSet {
    /// Sort keys, most significant first.
    pub orders: Vec<SortOrder>,
    /// Leading keys that are category headers.
    pub category_count: usize,
    /// Categories initially expanded.
    pub expanded_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_display() {
        assert_eq!(format!("{}", FolderId::new(0x10)), "fid:0x0000000000000010");
        assert_eq!(format!("{}", MessageId::new(1)), "mid:0x0000000000000001");
        assert_eq!(format!("{}", ContextId::new(42)), "ctx:42");
    }

    #[test]
    fn id_ordering() {
        assert!(FolderId::new(1) < FolderId::new(2));
        assert!(ContextId::new(1) < ContextId::new(2));
    }
}
