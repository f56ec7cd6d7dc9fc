//! Schema Synth
//!
//! Generates typed API schemas from documented configuration document
//! schemas, and resolves generated fields against document instances.
//!
//! A document kind is described by a [`SchemaNode`] tree and a parallel
//! [`DocTree`] of field documentation. The [`TypeSynthesizer`] walks both
//! and produces named object and union types; only documented fields reach
//! the generated types.
//!
//! # Example
//!
//! ```
//! use schema_synth::{
//!     project, Catalog, DocTree, DocumentDefinition, DocumentKind, OutputType, SchemaNode,
//!     TypeSynthesizer,
//! };
//! use serde_json::json;
//!
//! let service = DocumentDefinition::new(
//!     DocumentKind::Service,
//!     "ServiceConfiguration",
//!     SchemaNode::object([
//!         ("image", SchemaNode::string()),
//!         ("environment", SchemaNode::map(SchemaNode::string())),
//!         ("internal", SchemaNode::boolean()),
//!     ]),
//!     DocTree::new()
//!         .text("image", "Docker image")
//!         .text("environment", "Environment variables"),
//! );
//!
//! let synth = TypeSynthesizer::new(Catalog::new().with(service));
//! let OutputType::Object(ty) = synth.document_type(DocumentKind::Service).unwrap() else {
//!     unreachable!()
//! };
//!
//! // Undocumented fields are not generated
//! assert!(ty.field("internal").is_none());
//!
//! // Mappings resolve as key/value entry lists
//! let instance = json!({ "image": "nginx", "environment": { "PORT": "80" } });
//! let resolved = project(&ty, &instance);
//! assert_eq!(resolved["environment"], json!([{ "key": "PORT", "value": "80" }]));
//! ```
//!
//! # Type mapping
//!
//! | Schema node | Generated type |
//! |-------------|----------------|
//! | `string` / `integer` / `float` / `boolean` | `String` / `Int` / `Float` / `Boolean` |
//! | `any` | `JSONString` |
//! | `object` | object type named parent + field |
//! | `list` | list of the element type |
//! | `map` | list of `Entry<Value>` records |
//! | `reference` | the referenced document kind's type |
//! | `union` of equal scalars | that scalar |
//! | `union` of different scalars | `GenericScalar` |
//! | `union` of objects | union type |

mod docs;
mod entries;
mod error;
mod linter;
mod loader;
mod naming;
mod output;
mod progress;
mod resolve;
mod sdl;
mod synth;
mod types;
mod validator;

pub use docs::{extract_docs, DocEntry, DocTree, MAP_KEY_TERM, SELF_DESCRIPTION_KEY};
pub use entries::{entry_record, entry_type_name, lower_entries, lower_for, ENTRY_KEY, ENTRY_VALUE};
pub use error::{DocError, LoadError, SchemaError, SynthError, ValidateError};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{catalog_from_value, load_catalog, load_catalog_str, load_json, load_json_str};
pub use naming::{camel_to_snake, first_upper, snake_to_camel};
pub use output::{GeneratedField, NamedType, ObjectType, OutputScalar, OutputType, UnionType};
pub use progress::{progress_type, ProgressStep, PROGRESS_TYPE_NAME};
pub use resolve::{
    project, resolve, resolve_field, select_member, ConfigDocument, Document, Embedded, Payload,
    Resolvable, TYPENAME_KEY,
};
pub use sdl::{render_sdl, type_ref};
pub use synth::{Advisory, AdvisoryKind, TypeSynthesizer};
pub use types::{
    Catalog, DocumentCatalog, DocumentDefinition, DocumentKind, ScalarKind, SchemaNode,
    SynthOptions, Validator, SYSTEM_KEY_PREFIX,
};
pub use validator::{catalog_schema, validate_against_schema, validate_catalog};
