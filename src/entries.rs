//! Entry-list lowering for string-keyed mappings.
//!
//! API object fields cannot be dynamically keyed, so a mapping field becomes
//! a list of `{key, value}` records. The record type is named after its value
//! type (`EntryString`, `EntryServiceConfiguration`) and generated once per
//! value type; values are lowered the same way when a field is resolved.

use serde_json::{Map, Value};

use crate::output::{GeneratedField, ObjectType, OutputScalar, OutputType};

/// Name of the record field holding the mapping key.
pub const ENTRY_KEY: &str = "key";
/// Name of the record field holding the mapping value.
pub const ENTRY_VALUE: &str = "value";

/// Name of the entry record for a value type.
pub fn entry_type_name(value: &OutputType) -> String {
    format!("Entry{}", value.name_fragment())
}

/// Build the entry record type for a value type.
pub fn entry_record(value: OutputType) -> ObjectType {
    let fragment = value.name_fragment();
    ObjectType {
        name: entry_type_name(&value),
        description: Some(format!("A named entry in a list of {fragment}")),
        fields: vec![
            GeneratedField::new(ENTRY_KEY, OutputType::Scalar(OutputScalar::String)),
            GeneratedField::new(ENTRY_VALUE, value),
        ],
        discriminator: None,
    }
}

/// Lower a mapping to `[{key, value}, ...]` in the mapping's order.
pub fn lower_entries(map: &Map<String, Value>) -> Value {
    Value::Array(
        map.iter()
            .map(|(key, value)| {
                let mut entry = Map::new();
                entry.insert(ENTRY_KEY.to_string(), Value::String(key.clone()));
                entry.insert(ENTRY_VALUE.to_string(), value.clone());
                Value::Object(entry)
            })
            .collect(),
    )
}

/// Apply entry lowering when a list-typed field holds a mapping.
///
/// Anything else passes through unchanged.
pub fn lower_for(declared: &OutputType, value: Value) -> Value {
    match value {
        Value::Object(map) if declared.is_list() => lower_entries(&map),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lowering_preserves_insertion_order() {
        let value = json!({ "x": 1, "y": 2 });
        let lowered = lower_entries(value.as_object().unwrap());
        assert_eq!(
            lowered,
            json!([{ "key": "x", "value": 1 }, { "key": "y", "value": 2 }])
        );

        let value = json!({ "zeta": "z", "alpha": "a" });
        let lowered = lower_entries(value.as_object().unwrap());
        assert_eq!(lowered[0]["key"], json!("zeta"));
        assert_eq!(lowered[1]["key"], json!("alpha"));
    }

    #[test]
    fn empty_mapping_lowers_to_empty_list() {
        assert_eq!(lower_entries(&Map::new()), json!([]));
    }

    #[test]
    fn lower_for_only_touches_list_fields() {
        let list = OutputType::list(OutputType::Scalar(OutputScalar::String));
        let json = OutputType::Scalar(OutputScalar::Json);
        let mapping = json!({ "a": "b" });

        assert_eq!(
            lower_for(&list, mapping.clone()),
            json!([{ "key": "a", "value": "b" }])
        );
        assert_eq!(lower_for(&json, mapping.clone()), mapping);
        assert_eq!(lower_for(&list, json!(["a"])), json!(["a"]));
    }

    #[test]
    fn entry_record_shape() {
        let record = entry_record(OutputType::Scalar(OutputScalar::String));
        assert_eq!(record.name, "EntryString");
        assert_eq!(
            record.description.as_deref(),
            Some("A named entry in a list of String")
        );
        let names: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, [ENTRY_KEY, ENTRY_VALUE]);
        assert!(record.fields.iter().all(|f| f.required));
    }
}
