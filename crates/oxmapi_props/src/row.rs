//! Rows, row-sets and tag lists.
//!
//! A row is an ordered property collection with tag uniqueness: inserting
//! a property whose tag already exists overwrites in place rather than
//! appending. A row-set is an ordered collection of rows whose property
//! sets are independent of one another.

use crate::tag::{PropType, PropertyTag};
use crate::value::{Property, PropertyValue};

/// Looks up a value in a bare property slice, for callers holding
/// property arrays outside a [`Row`].
#[must_use]
pub fn find_value(properties: &[Property], tag: PropertyTag) -> Option<&PropertyValue> {
    properties
        .iter()
        .find(|p| p.tag == tag)
        .map(|p| &p.value)
}

/// An ordered collection of properties, unique per tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    properties: Vec<Property>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            properties: Vec::new(),
        }
    }

    /// Builds a row from properties, applying upsert semantics so later
    /// duplicates overwrite earlier entries.
    #[must_use]
    pub fn from_properties(properties: impl IntoIterator<Item = Property>) -> Self {
        let mut row = Self::new();
        for prop in properties {
            row.upsert(prop);
        }
        row
    }

    /// Number of properties in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the row has no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterates the properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    /// Inserts a property; a matching tag is replaced in place, a new
    /// tag is appended, growing the row by exactly one.
    pub fn upsert(&mut self, property: Property) {
        if let Some(existing) = self
            .properties
            .iter_mut()
            .find(|p| p.tag == property.tag)
        {
            *existing = property;
        } else {
            self.properties.push(property);
        }
    }

    /// Looks up the property with the exact tag.
    ///
    /// Absence is `None`, a normal outcome rather than an error.
    #[must_use]
    pub fn property(&self, tag: PropertyTag) -> Option<&Property> {
        self.properties.iter().find(|p| p.tag == tag)
    }

    /// Looks up the value stored under the exact tag.
    #[must_use]
    pub fn get(&self, tag: PropertyTag) -> Option<&PropertyValue> {
        self.property(tag).map(|p| &p.value)
    }

    /// Replaces the error placeholder carrying this property's
    /// identifier, if the row holds one.
    ///
    /// Rows returned from partial reads carry an error-typed entry per
    /// missing property; this stamps the real value over the
    /// placeholder. Returns `false` when no placeholder exists.
    pub fn set_default_error(&mut self, property: Property) -> bool {
        let id = property.tag.id();
        if let Some(existing) = self
            .properties
            .iter_mut()
            .find(|p| p.tag.id() == id && p.tag.type_code() == PropType::Error.code())
        {
            *existing = property;
            true
        } else {
            false
        }
    }

    /// Collects the tags of every non-error property, in row order.
    #[must_use]
    pub fn tags(&self) -> TagList {
        TagList::from_tags(
            self.properties
                .iter()
                .filter(|p| p.tag.type_code() != PropType::Error.code())
                .map(|p| p.tag),
        )
    }

    /// Removes the property with the exact tag, if present.
    pub fn remove(&mut self, tag: PropertyTag) -> Option<Property> {
        let idx = self.properties.iter().position(|p| p.tag == tag)?;
        Some(self.properties.remove(idx))
    }

    pub(crate) fn properties_mut(&mut self) -> &mut [Property] {
        &mut self.properties
    }
}

impl IntoIterator for Row {
    type Item = Property;
    type IntoIter = std::vec::IntoIter<Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.into_iter()
    }
}

impl FromIterator<Property> for Row {
    fn from_iter<T: IntoIterator<Item = Property>>(iter: T) -> Self {
        Self::from_properties(iter)
    }
}

/// An ordered collection of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    rows: Vec<Row>,
}

impl RowSet {
    /// Creates an empty row-set.
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the set has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row.
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Iterates the rows in order.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Mutable access to the rows.
    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    /// Upserts the same property into every row, stamping a shared
    /// column across the set.
    pub fn broadcast(&mut self, property: &Property) {
        for row in &mut self.rows {
            row.upsert(property.clone());
        }
    }

    /// Finds the first property matching the tag across all rows.
    #[must_use]
    pub fn find(&self, tag: PropertyTag) -> Option<&Property> {
        self.rows.iter().find_map(|row| row.property(tag))
    }

    /// Finds the first value matching the tag across all rows.
    #[must_use]
    pub fn get(&self, tag: PropertyTag) -> Option<&PropertyValue> {
        self.find(tag).map(|p| &p.value)
    }
}

impl FromIterator<Row> for RowSet {
    fn from_iter<T: IntoIterator<Item = Row>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RowSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// An ordered list of property tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList {
    tags: Vec<PropertyTag>,
}

impl TagList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { tags: Vec::new() }
    }

    /// Builds a list from a slice of tags.
    #[must_use]
    pub fn from_slice(tags: &[PropertyTag]) -> Self {
        Self {
            tags: tags.to_vec(),
        }
    }

    /// Builds a list from an iterator of tags.
    #[must_use]
    pub fn from_tags(tags: impl IntoIterator<Item = PropertyTag>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
        }
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Appends a tag.
    pub fn push(&mut self, tag: PropertyTag) {
        self.tags.push(tag);
    }

    /// Whether the list contains the tag.
    #[must_use]
    pub fn contains(&self, tag: PropertyTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Iterates the tags in order.
    pub fn iter(&self) -> impl Iterator<Item = PropertyTag> + '_ {
        self.tags.iter().copied()
    }

    /// Tags as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[PropertyTag] {
        &self.tags
    }

    /// Removes every occurrence of the given tags, compacting in place.
    ///
    /// Returns the updated count.
    pub fn prune(&mut self, remove: &[PropertyTag]) -> usize {
        self.tags.retain(|t| !remove.contains(t));
        self.tags.len()
    }
}

impl FromIterator<PropertyTag> for TagList {
    fn from_iter<T: IntoIterator<Item = PropertyTag>>(iter: T) -> Self {
        Self::from_tags(iter)
    }
}
