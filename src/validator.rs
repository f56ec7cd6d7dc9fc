//! Structural validation of catalog files against a bundled JSON Schema.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::error::{SchemaError, ValidateError};

/// JSON Schema every catalog file must satisfy.
static CATALOG_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let kinds = json!(["config", "project", "app", "service", "command"]);
    let node = |variant: &str, required: &[&str], properties: Value| {
        json!({
            "if": { "properties": { "type": { "const": variant } } },
            "then": { "required": required, "properties": properties }
        })
    };

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["documents"],
        "additionalProperties": false,
        "properties": {
            "documents": { "type": "array", "items": { "$ref": "#/$defs/document" } }
        },
        "$defs": {
            "document": {
                "type": "object",
                "required": ["kind", "name", "schema"],
                "additionalProperties": false,
                "oneOf": [{ "required": ["docstring"] }, { "required": ["docs"] }],
                "properties": {
                    "kind": { "enum": kinds },
                    "name": { "type": "string", "pattern": "^[A-Za-z_][A-Za-z0-9_]*$" },
                    "description": { "type": "string" },
                    "schema": { "$ref": "#/$defs/node" },
                    "docstring": { "type": "string" },
                    "docs": { "$ref": "#/$defs/docs" },
                    "skipFields": { "type": "array", "items": { "type": "string" } },
                    "discriminator": { "type": "string" }
                }
            },
            "docs": {
                "type": "object",
                "additionalProperties": {
                    "anyOf": [{ "type": "string" }, { "$ref": "#/$defs/docs" }]
                }
            },
            "nodes": { "type": "array", "items": { "$ref": "#/$defs/node" } },
            "node": {
                "type": "object",
                "required": ["type"],
                "properties": {
                    "type": {
                        "enum": [
                            "string", "integer", "float", "boolean", "any", "optional",
                            "union", "object", "list", "map", "reference", "validated"
                        ]
                    }
                },
                "allOf": [
                    node("optional", &["inner"], json!({ "inner": { "$ref": "#/$defs/node" } })),
                    node("union", &["alternatives"], json!({ "alternatives": { "$ref": "#/$defs/nodes" } })),
                    node("object", &["fields"], json!({
                        "fields": { "type": "object", "additionalProperties": { "$ref": "#/$defs/node" } }
                    })),
                    node("list", &["element"], json!({ "element": { "$ref": "#/$defs/node" } })),
                    node("map", &["value"], json!({ "value": { "$ref": "#/$defs/node" } })),
                    node("reference", &["target"], json!({ "target": { "enum": kinds } })),
                    node("validated", &["validator"], json!({ "validator": { "$ref": "#/$defs/validator" } }))
                ]
            },
            "validator": {
                "type": "object",
                "required": ["kind"],
                "properties": {
                    "kind": { "enum": ["doc_reference", "alternatives", "custom"] }
                },
                "allOf": [
                    {
                        "if": { "properties": { "kind": { "const": "doc_reference" } } },
                        "then": { "required": ["target"], "properties": { "target": { "enum": kinds } } }
                    },
                    {
                        "if": { "properties": { "kind": { "const": "alternatives" } } },
                        "then": {
                            "required": ["alternatives"],
                            "properties": { "alternatives": { "$ref": "#/$defs/nodes" } }
                        }
                    },
                    {
                        "if": { "properties": { "kind": { "const": "custom" } } },
                        "then": { "required": ["name"], "properties": { "name": { "type": "string" } } }
                    }
                ]
            }
        }
    })
});

/// The bundled catalog schema.
pub fn catalog_schema() -> &'static Value {
    &CATALOG_SCHEMA
}

/// Validate a catalog file's structure.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` with every violation found.
pub fn validate_catalog(catalog: &Value) -> Result<(), ValidateError> {
    validate_against_schema(catalog_schema(), catalog)
}

/// Validate a JSON value against a JSON Schema.
pub fn validate_against_schema(schema: &Value, instance: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ValidateError::MetaSchema {
        message: e.to_string(),
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(instance)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(document: Value) -> Value {
        json!({ "documents": [document] })
    }

    #[test]
    fn valid_catalog() {
        let value = catalog(json!({
            "kind": "service",
            "name": "ServiceConfiguration",
            "schema": {
                "type": "object",
                "fields": {
                    "image": { "type": "string" },
                    "environment": { "type": "map", "value": { "type": "string" } },
                    "app": { "type": "validated", "validator": { "kind": "doc_reference", "target": "app" } }
                }
            },
            "docs": { "image": "Docker image", "environment": { "{key}": "Value" } }
        }));
        assert!(validate_catalog(&value).is_ok());
    }

    #[test]
    fn unknown_node_type_is_reported_with_path() {
        let value = catalog(json!({
            "kind": "app",
            "name": "AppConfiguration",
            "schema": { "type": "object", "fields": { "x": { "type": "tuple" } } },
            "docs": {}
        }));
        let Err(ValidateError::Invalid { errors }) = validate_catalog(&value) else {
            panic!("expected validation errors");
        };
        assert!(errors
            .iter()
            .any(|e| e.path == "/documents/0/schema/fields/x/type"));
    }

    #[test]
    fn documentation_is_required() {
        let value = catalog(json!({
            "kind": "app",
            "name": "AppConfiguration",
            "schema": { "type": "object", "fields": {} }
        }));
        assert!(matches!(
            validate_catalog(&value),
            Err(ValidateError::Invalid { .. })
        ));
    }

    #[test]
    fn unknown_reference_target_rejected() {
        let value = catalog(json!({
            "kind": "app",
            "name": "AppConfiguration",
            "schema": { "type": "reference", "target": "user" },
            "docstring": "x"
        }));
        assert!(validate_catalog(&value).is_err());
    }

    #[test]
    fn missing_documents_rejected() {
        assert!(validate_catalog(&json!({})).is_err());
    }
}
