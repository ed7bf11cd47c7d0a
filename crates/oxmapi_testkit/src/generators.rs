//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random property values, rows and
//! tag lists that maintain the data model's invariants.

use oxmapi_props::{FileTime, Property, PropertyTag, PropertyValue, Row, TagList};
use proptest::prelude::*;

/// Strategy for property identifiers below the named range.
pub fn transmitted_id_strategy() -> impl Strategy<Value = u16> {
    0x0001u16..0x8000
}

/// Strategy for property identifiers in the named range.
pub fn named_id_strategy() -> impl Strategy<Value = u16> {
    0x8000u16..=0xFFFE
}

/// Strategy for wire-transferable scalar values.
pub fn scalar_value_strategy() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![
        Just(PropertyValue::Null),
        any::<bool>().prop_map(PropertyValue::Boolean),
        any::<u16>().prop_map(PropertyValue::Short),
        any::<u32>().prop_map(PropertyValue::Long),
        any::<u32>().prop_map(PropertyValue::ErrorCode),
        any::<u64>().prop_map(PropertyValue::I8),
        any::<u64>().prop_map(|t| PropertyValue::SysTime(FileTime::from_ticks(t))),
        "[a-zA-Z0-9 .@-]{0,40}".prop_map(PropertyValue::String8),
        "\\PC{0,20}".prop_map(PropertyValue::Unicode),
        prop::collection::vec(any::<u8>(), 0..128).prop_map(PropertyValue::Binary),
    ]
}

/// Strategy for multi-value property values.
pub fn multi_value_strategy() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![
        prop::collection::vec(any::<u16>(), 0..12).prop_map(PropertyValue::MvShort),
        prop::collection::vec(any::<u32>(), 0..12).prop_map(PropertyValue::MvLong),
        prop::collection::vec("[a-z]{0,12}", 0..8).prop_map(PropertyValue::MvString8),
        prop::collection::vec("\\PC{0,8}", 0..8).prop_map(PropertyValue::MvUnicode),
        prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..8)
            .prop_map(PropertyValue::MvBinary),
    ]
}

/// Strategy for any wire-transferable value.
pub fn value_strategy() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![scalar_value_strategy(), multi_value_strategy()]
}

/// Strategy for properties with transmitted (non-named) identifiers.
pub fn property_strategy() -> impl Strategy<Value = Property> {
    (transmitted_id_strategy(), value_strategy()).prop_map(|(id, value)| Property::new(id, value))
}

/// Strategy for rows of up to `max` properties with distinct tags.
pub fn row_strategy(max: usize) -> impl Strategy<Value = Row> {
    prop::collection::vec(property_strategy(), 0..max).prop_map(Row::from_properties)
}

/// Strategy for tag lists drawn from a row's tags.
pub fn tag_list_strategy(max: usize) -> impl Strategy<Value = TagList> {
    prop::collection::vec(
        (transmitted_id_strategy(), value_strategy())
            .prop_map(|(id, value)| PropertyTag::new(id, value.prop_type())),
        0..max,
    )
    .prop_map(|tags| TagList::from_tags(tags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxmapi_props::{from_wire, to_wire, wire_size};

    proptest! {
        #[test]
        fn generated_values_round_trip(value in value_strategy()) {
            let wire = to_wire(&value).unwrap();
            prop_assert_eq!(wire.len() as u32, wire_size(&value).unwrap());
            prop_assert_eq!(from_wire(value.prop_type(), &wire).unwrap(), value);
        }

        #[test]
        fn generated_rows_keep_tags_unique(row in row_strategy(12)) {
            let mut tags: Vec<_> = row.iter().map(|p| p.tag).collect();
            let before = tags.len();
            tags.sort();
            tags.dedup();
            prop_assert_eq!(tags.len(), before);
        }

        #[test]
        fn upsert_law_holds_for_generated_rows(
            mut row in row_strategy(12),
            property in property_strategy(),
        ) {
            let existed = row.get(property.tag).is_some();
            let before = row.len();
            row.upsert(property.clone());
            if existed {
                prop_assert_eq!(row.len(), before);
            } else {
                prop_assert_eq!(row.len(), before + 1);
            }
            prop_assert_eq!(row.get(property.tag), Some(&property.value));
        }
    }
}
