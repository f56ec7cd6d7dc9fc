//! Synthesized API types.
//!
//! Named types (objects and unions) are shared behind [`Arc`]: every field
//! referring to a type holds the registry's instance, so a cached type can be
//! compared by identity with [`Arc::ptr_eq`].

use std::sync::Arc;

use serde::Serialize;

use crate::naming::snake_to_camel;

/// Scalar API types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputScalar {
    String,
    Int,
    Float,
    Boolean,
    /// Untyped JSON for `any` fields.
    Json,
    /// Fallback for unions of different scalars.
    Generic,
}

impl OutputScalar {
    /// API name of the scalar.
    pub fn name(&self) -> &'static str {
        match self {
            OutputScalar::String => "String",
            OutputScalar::Int => "Int",
            OutputScalar::Float => "Float",
            OutputScalar::Boolean => "Boolean",
            OutputScalar::Json => "JSONString",
            OutputScalar::Generic => "GenericScalar",
        }
    }

    /// True for scalars that need a custom scalar declaration.
    pub fn is_custom(&self) -> bool {
        matches!(self, OutputScalar::Json | OutputScalar::Generic)
    }
}

/// Type of a generated field.
#[derive(Debug, Clone)]
pub enum OutputType {
    Scalar(OutputScalar),
    Object(Arc<ObjectType>),
    Union(Arc<UnionType>),
    List(Box<OutputType>),
}

impl OutputType {
    pub fn list(element: OutputType) -> Self {
        OutputType::List(Box::new(element))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, OutputType::Scalar(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, OutputType::List(_))
    }

    pub fn as_object(&self) -> Option<&Arc<ObjectType>> {
        match self {
            OutputType::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Identifier-safe name of the type, used to name entry records.
    ///
    /// Lists append `List` to their element's fragment.
    pub fn name_fragment(&self) -> String {
        match self {
            OutputType::Scalar(scalar) => scalar.name().to_string(),
            OutputType::Object(object) => object.name.clone(),
            OutputType::Union(union) => union.name.clone(),
            OutputType::List(element) => format!("{}List", element.name_fragment()),
        }
    }

    fn type_ref(&self) -> TypeRef<'_> {
        match self {
            OutputType::Scalar(scalar) => TypeRef::Scalar {
                name: scalar.name(),
            },
            OutputType::Object(object) => TypeRef::Object { name: &object.name },
            OutputType::Union(union) => TypeRef::Union { name: &union.name },
            OutputType::List(element) => TypeRef::List {
                of_type: Box::new(element.type_ref()),
            },
        }
    }
}

/// Named types are referenced by name in serialized output.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TypeRef<'a> {
    Scalar {
        name: &'a str,
    },
    Object {
        name: &'a str,
    },
    Union {
        name: &'a str,
    },
    List {
        #[serde(rename = "ofType")]
        of_type: Box<TypeRef<'a>>,
    },
}

impl Serialize for OutputType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.type_ref().serialize(serializer)
    }
}

/// A field of a generated object type.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedField {
    /// API name (`camelCase`).
    pub name: String,
    /// Key the field was generated from, used for lookups in the
    /// underlying data.
    #[serde(skip)]
    pub source: String,
    #[serde(rename = "type")]
    pub ty: OutputType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl GeneratedField {
    /// A required, undescribed field for the source key `source`.
    pub fn new(source: impl Into<String>, ty: OutputType) -> Self {
        let source = source.into();
        Self {
            name: snake_to_camel(&source),
            source,
            ty,
            required: true,
            description: None,
        }
    }

    /// Key of the field in the underlying data.
    pub fn source_key(&self) -> &str {
        &self.source
    }
}

/// A generated object type.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectType {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<GeneratedField>,
    /// Source key whose presence selects this type among union members.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
}

impl ObjectType {
    pub fn field(&self, name: &str) -> Option<&GeneratedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A generated union of object types.
#[derive(Debug, Clone)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<Arc<ObjectType>>,
}

impl Serialize for UnionType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            name: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
            members: Vec<&'a str>,
        }

        Repr {
            name: &self.name,
            description: self.description.as_deref(),
            members: self.members.iter().map(|m| m.name.as_str()).collect(),
        }
        .serialize(serializer)
    }
}

/// A type registered under its name.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NamedType {
    Object(Arc<ObjectType>),
    Union(Arc<UnionType>),
}

impl NamedType {
    pub fn name(&self) -> &str {
        match self {
            NamedType::Object(object) => &object.name,
            NamedType::Union(union) => &union.name,
        }
    }

    pub fn to_output(&self) -> OutputType {
        match self {
            NamedType::Object(object) => OutputType::Object(Arc::clone(object)),
            NamedType::Union(union) => OutputType::Union(Arc::clone(union)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry_string() -> Arc<ObjectType> {
        Arc::new(ObjectType {
            name: "EntryString".into(),
            description: None,
            fields: vec![],
            discriminator: None,
        })
    }

    #[test]
    fn name_fragments() {
        assert_eq!(OutputType::Scalar(OutputScalar::Json).name_fragment(), "JSONString");
        assert_eq!(
            OutputType::list(OutputType::Scalar(OutputScalar::Int)).name_fragment(),
            "IntList"
        );
        assert_eq!(OutputType::Object(entry_string()).name_fragment(), "EntryString");
    }

    #[test]
    fn field_serializes_type_reference() {
        let field = GeneratedField {
            required: false,
            description: Some("Environment variables".into()),
            ..GeneratedField::new("environment", OutputType::list(OutputType::Object(entry_string())))
        };
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({
                "name": "environment",
                "type": { "kind": "list", "ofType": { "kind": "object", "name": "EntryString" } },
                "required": false,
                "description": "Environment variables"
            })
        );
    }

    #[test]
    fn union_serializes_member_names() {
        let union = NamedType::Union(Arc::new(UnionType {
            name: "CommandConfiguration".into(),
            description: None,
            members: vec![entry_string()],
        }));
        assert_eq!(
            serde_json::to_value(&union).unwrap(),
            json!({ "kind": "union", "name": "CommandConfiguration", "members": ["EntryString"] })
        );
    }

    #[test]
    fn source_key_is_kept_verbatim() {
        let field = GeneratedField::new("additional_ports", OutputType::Scalar(OutputScalar::String));
        assert_eq!(field.name, "additionalPorts");
        assert_eq!(field.source_key(), "additional_ports");

        for (source, name) in [("port_2", "port2"), ("db_URL", "dbUrl")] {
            let field = GeneratedField::new(source, OutputType::Scalar(OutputScalar::String));
            assert_eq!(field.name, name);
            assert_eq!(field.source_key(), source);
        }
    }
}
