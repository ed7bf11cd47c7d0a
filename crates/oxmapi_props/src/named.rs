//! Named-property resolution.
//!
//! Property identifiers in the named range do not name anything by
//! themselves; an external id/name service maps them to a numeric id or
//! a name string. The service is injected, never ambient state.

use crate::row::Row;

/// The resolved identity of a named property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyName {
    /// Numeric kind: the stable numeric identifier.
    Numeric(u16),
    /// String kind: the property is known only by name and has no
    /// numeric identifier to rewrite into the tag.
    String(String),
}

/// An injected id/name resolution service.
pub trait NameResolver {
    /// Resolves a tag in the named range.
    ///
    /// `None` is an ordinary miss: the property stays unresolved.
    fn resolve(&self, tag: crate::tag::PropertyTag) -> Option<PropertyName>;
}

impl Row {
    /// Resolves every named-range tag in the row through the resolver.
    ///
    /// Numeric resolutions rewrite the tag's identifier bits in place;
    /// string-named properties and resolver misses are left untouched.
    pub fn resolve_named_tags(&mut self, resolver: &dyn NameResolver) {
        for property in self.properties_mut() {
            if !property.tag.is_named() {
                continue;
            }
            match resolver.resolve(property.tag) {
                Some(PropertyName::Numeric(id)) => {
                    property.tag = property.tag.with_id(id);
                }
                Some(PropertyName::String(_)) | None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{PropType, PropertyTag};
    use crate::value::Property;
    use std::collections::HashMap;

    struct MapResolver(HashMap<u16, PropertyName>);

    impl NameResolver for MapResolver {
        fn resolve(&self, tag: PropertyTag) -> Option<PropertyName> {
            self.0.get(&tag.id()).cloned()
        }
    }

    #[test]
    fn numeric_resolution_rewrites_the_id() {
        let mut row = Row::new();
        row.upsert(Property::new(0x8520, 42u32));

        let resolver = MapResolver(HashMap::from([(0x8520, PropertyName::Numeric(0x1234))]));
        row.resolve_named_tags(&resolver);

        let tag = PropertyTag::new(0x1234, PropType::Long);
        assert_eq!(row.get(tag).unwrap().as_long(), Some(42));
        assert!(row.get(PropertyTag::new(0x8520, PropType::Long)).is_none());
    }

    #[test]
    fn string_named_properties_stay_unresolved() {
        let mut row = Row::new();
        row.upsert(Property::new(0x8A00, "keyword"));

        let resolver = MapResolver(HashMap::from([(
            0x8A00,
            PropertyName::String("Keywords".into()),
        )]));
        row.resolve_named_tags(&resolver);

        assert!(row
            .get(PropertyTag::new(0x8A00, PropType::String8))
            .is_some());
    }

    #[test]
    fn resolver_miss_and_transmitted_ids_are_skipped() {
        let mut row = Row::new();
        row.upsert(Property::new(0x3001, "Alice"));
        row.upsert(Property::new(0x8999, 1u32));

        let resolver = MapResolver(HashMap::new());
        row.resolve_named_tags(&resolver);

        assert!(row.get(PropertyTag::new(0x3001, PropType::String8)).is_some());
        assert!(row.get(PropertyTag::new(0x8999, PropType::Long)).is_some());
    }
}
