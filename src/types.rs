//! Core types: the schema combinator model and the document catalog.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::docs::DocTree;

/// Prefix marking system keys that never reach the API surface.
pub const SYSTEM_KEY_PREFIX: char = '$';

/// Kind of a scalar schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Integer,
    Float,
    Boolean,
    /// Anything; only representable as untyped JSON.
    Any,
}

/// The closed set of document kinds a schema may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Config,
    Project,
    App,
    Service,
    Command,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 5] = [
        DocumentKind::Config,
        DocumentKind::Project,
        DocumentKind::App,
        DocumentKind::Service,
        DocumentKind::Command,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Config => "config",
            DocumentKind::Project => "project",
            DocumentKind::App => "app",
            DocumentKind::Service => "service",
            DocumentKind::Command => "command",
        }
    }

    /// Name of the union generated when a kind has several variant documents.
    pub fn type_name(&self) -> &'static str {
        match self {
            DocumentKind::Config => "SystemConfiguration",
            DocumentKind::Project => "ProjectConfiguration",
            DocumentKind::App => "AppConfiguration",
            DocumentKind::Service => "ServiceConfiguration",
            DocumentKind::Command => "CommandConfiguration",
        }
    }

    /// Parse a kind from its lowercase name.
    ///
    /// Returns `None` for unknown kinds (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validity constraint wrapped around a schema node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Validator {
    /// Value must be a document of the target kind.
    DocReference { target: DocumentKind },
    /// Value must match exactly one alternative.
    Alternatives { alternatives: Vec<SchemaNode> },
    /// Opaque constraint supplied by the document library.
    Custom { name: String },
}

impl Validator {
    pub fn name(&self) -> &str {
        match self {
            Validator::DocReference { .. } => "doc_reference",
            Validator::Alternatives { .. } => "alternatives",
            Validator::Custom { name } => name,
        }
    }
}

/// Declarative description of a document's (or field's) shape.
///
/// On the wire every node is an object tagged by `type`; scalars use their
/// kind as the tag (`{"type": "string"}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NodeSpec", into = "NodeSpec")]
pub enum SchemaNode {
    Scalar(ScalarKind),
    /// Marks a field as not required.
    Optional(Box<SchemaNode>),
    Union(Vec<SchemaNode>),
    /// Nested document; field order is preserved.
    Object(IndexMap<String, SchemaNode>),
    List(Box<SchemaNode>),
    /// Dynamic mapping with arbitrary string keys.
    StringKeyedMap(Box<SchemaNode>),
    TypeReference(DocumentKind),
    Validated(Validator),
}

impl SchemaNode {
    pub fn string() -> Self {
        SchemaNode::Scalar(ScalarKind::String)
    }

    pub fn integer() -> Self {
        SchemaNode::Scalar(ScalarKind::Integer)
    }

    pub fn float() -> Self {
        SchemaNode::Scalar(ScalarKind::Float)
    }

    pub fn boolean() -> Self {
        SchemaNode::Scalar(ScalarKind::Boolean)
    }

    pub fn any() -> Self {
        SchemaNode::Scalar(ScalarKind::Any)
    }

    pub fn optional(inner: SchemaNode) -> Self {
        SchemaNode::Optional(Box::new(inner))
    }

    pub fn list(element: SchemaNode) -> Self {
        SchemaNode::List(Box::new(element))
    }

    pub fn map(value: SchemaNode) -> Self {
        SchemaNode::StringKeyedMap(Box::new(value))
    }

    pub fn reference(target: DocumentKind) -> Self {
        SchemaNode::TypeReference(target)
    }

    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaNode)>,
        K: Into<String>,
    {
        SchemaNode::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum NodeSpec {
    String,
    Integer,
    Float,
    Boolean,
    Any,
    Optional { inner: Box<SchemaNode> },
    Union { alternatives: Vec<SchemaNode> },
    Object { fields: IndexMap<String, SchemaNode> },
    List { element: Box<SchemaNode> },
    Map { value: Box<SchemaNode> },
    Reference { target: DocumentKind },
    Validated { validator: Validator },
}

impl From<NodeSpec> for SchemaNode {
    fn from(spec: NodeSpec) -> Self {
        match spec {
            NodeSpec::String => SchemaNode::Scalar(ScalarKind::String),
            NodeSpec::Integer => SchemaNode::Scalar(ScalarKind::Integer),
            NodeSpec::Float => SchemaNode::Scalar(ScalarKind::Float),
            NodeSpec::Boolean => SchemaNode::Scalar(ScalarKind::Boolean),
            NodeSpec::Any => SchemaNode::Scalar(ScalarKind::Any),
            NodeSpec::Optional { inner } => SchemaNode::Optional(inner),
            NodeSpec::Union { alternatives } => SchemaNode::Union(alternatives),
            NodeSpec::Object { fields } => SchemaNode::Object(fields),
            NodeSpec::List { element } => SchemaNode::List(element),
            NodeSpec::Map { value } => SchemaNode::StringKeyedMap(value),
            NodeSpec::Reference { target } => SchemaNode::TypeReference(target),
            NodeSpec::Validated { validator } => SchemaNode::Validated(validator),
        }
    }
}

impl From<SchemaNode> for NodeSpec {
    fn from(node: SchemaNode) -> Self {
        match node {
            SchemaNode::Scalar(ScalarKind::String) => NodeSpec::String,
            SchemaNode::Scalar(ScalarKind::Integer) => NodeSpec::Integer,
            SchemaNode::Scalar(ScalarKind::Float) => NodeSpec::Float,
            SchemaNode::Scalar(ScalarKind::Boolean) => NodeSpec::Boolean,
            SchemaNode::Scalar(ScalarKind::Any) => NodeSpec::Any,
            SchemaNode::Optional(inner) => NodeSpec::Optional { inner },
            SchemaNode::Union(alternatives) => NodeSpec::Union { alternatives },
            SchemaNode::Object(fields) => NodeSpec::Object { fields },
            SchemaNode::List(element) => NodeSpec::List { element },
            SchemaNode::StringKeyedMap(value) => NodeSpec::Map { value },
            SchemaNode::TypeReference(target) => NodeSpec::Reference { target },
            SchemaNode::Validated(validator) => NodeSpec::Validated { validator },
        }
    }
}

/// Everything needed to synthesize the API type of one document.
#[derive(Debug, Clone)]
pub struct DocumentDefinition {
    pub kind: DocumentKind,
    /// Generated type name, e.g. `ServiceConfiguration`.
    pub name: String,
    pub description: Option<String>,
    /// Top-level schema; must be an object.
    pub schema: SchemaNode,
    pub docs: DocTree,
    /// Field names (source convention) never exposed.
    pub skip_fields: Vec<String>,
    /// Key whose presence selects this variant when a kind has several.
    pub discriminator: Option<String>,
}

impl DocumentDefinition {
    pub fn new(
        kind: DocumentKind,
        name: impl Into<String>,
        schema: SchemaNode,
        docs: DocTree,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            description: None,
            schema,
            docs,
            skip_fields: Vec::new(),
            discriminator: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn skip_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn discriminator(mut self, key: impl Into<String>) -> Self {
        self.discriminator = Some(key.into());
        self
    }
}

/// Source of document definitions for every kind a schema may reference.
pub trait DocumentCatalog {
    /// Kinds with at least one definition, in declaration order.
    fn kinds(&self) -> Vec<DocumentKind>;

    /// Definitions for `kind`. Several definitions are variants of one kind.
    fn definitions(&self, kind: DocumentKind) -> &[DocumentDefinition];
}

/// In-memory catalog of document definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    documents: IndexMap<DocumentKind, Vec<DocumentDefinition>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition; repeated kinds become variants.
    pub fn insert(&mut self, definition: DocumentDefinition) {
        self.documents
            .entry(definition.kind)
            .or_default()
            .push(definition);
    }

    pub fn with(mut self, definition: DocumentDefinition) -> Self {
        self.insert(definition);
        self
    }

    pub fn len(&self) -> usize {
        self.documents.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentCatalog for Catalog {
    fn kinds(&self) -> Vec<DocumentKind> {
        self.documents.keys().copied().collect()
    }

    fn definitions(&self, kind: DocumentKind) -> &[DocumentDefinition] {
        self.documents.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Options for type synthesis.
#[derive(Debug, Clone, Default)]
pub struct SynthOptions {
    /// When true, a union of different scalars is an error instead of
    /// degrading to the generic scalar.
    pub strict_unions: bool,
}

impl SynthOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strict union mode.
    pub fn strict_unions(mut self, strict: bool) -> Self {
        self.strict_unions = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_nodes_use_kind_as_tag() {
        let node: SchemaNode = serde_json::from_value(json!({ "type": "integer" })).unwrap();
        assert_eq!(node, SchemaNode::integer());
        assert_eq!(
            serde_json::to_value(SchemaNode::any()).unwrap(),
            json!({ "type": "any" })
        );
    }

    #[test]
    fn nested_nodes_deserialize() {
        let node: SchemaNode = serde_json::from_value(json!({
            "type": "object",
            "fields": {
                "image": { "type": "string" },
                "port": { "type": "optional", "inner": { "type": "integer" } },
                "environment": { "type": "map", "value": { "type": "string" } },
                "app": { "type": "reference", "target": "app" },
                "role": {
                    "type": "validated",
                    "validator": { "kind": "custom", "name": "Regex" }
                }
            }
        }))
        .unwrap();

        let SchemaNode::Object(fields) = node else {
            panic!("expected object");
        };
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["image", "port", "environment", "app", "role"]);
        assert_eq!(fields["port"], SchemaNode::optional(SchemaNode::integer()));
        assert_eq!(fields["environment"], SchemaNode::map(SchemaNode::string()));
        assert_eq!(fields["app"], SchemaNode::reference(DocumentKind::App));
        assert_eq!(
            fields["role"],
            SchemaNode::Validated(Validator::Custom {
                name: "Regex".into()
            })
        );
    }

    #[test]
    fn unknown_node_type_is_rejected() {
        let result = serde_json::from_value::<SchemaNode>(json!({ "type": "tuple" }));
        assert!(result.is_err());
    }

    #[test]
    fn document_kind_parse() {
        assert_eq!(DocumentKind::parse("service"), Some(DocumentKind::Service));
        assert_eq!(DocumentKind::parse("Service"), None);
        assert_eq!(DocumentKind::Command.type_name(), "CommandConfiguration");
    }

    #[test]
    fn catalog_groups_variants_by_kind() {
        let catalog = Catalog::new()
            .with(DocumentDefinition::new(
                DocumentKind::Command,
                "NormalCommandConfiguration",
                SchemaNode::object([("command", SchemaNode::string())]),
                DocTree::default(),
            ))
            .with(DocumentDefinition::new(
                DocumentKind::Command,
                "AliasCommandConfiguration",
                SchemaNode::object([("aliases", SchemaNode::string())]),
                DocTree::default(),
            ));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.kinds(), vec![DocumentKind::Command]);
        assert_eq!(catalog.definitions(DocumentKind::Command).len(), 2);
        assert!(catalog.definitions(DocumentKind::App).is_empty());
    }

    #[test]
    fn synth_options_default_is_lenient() {
        assert!(!SynthOptions::new().strict_unions);
        assert!(SynthOptions::new().strict_unions(true).strict_unions);
    }
}
