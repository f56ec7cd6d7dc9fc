//! Loading catalogs and instance documents.
//!
//! A catalog file lists document definitions:
//!
//! ```json
//! {
//!   "documents": [
//!     {
//!       "kind": "service",
//!       "name": "ServiceConfiguration",
//!       "schema": { "type": "object", "fields": { "image": { "type": "string" } } },
//!       "docstring": "A service.\n\n    image: str\n        Docker image\n"
//!     }
//!   ]
//! }
//! ```
//!
//! Documentation comes either from a `docstring` (extracted with
//! [`extract_docs`]) or from a ready-made `docs` tree.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::docs::{extract_docs, DocTree};
use crate::error::{LoadError, SchemaError, ValidateError};
use crate::types::{Catalog, DocumentDefinition, DocumentKind, SchemaNode};
use crate::validator::validate_catalog;

/// Load a JSON file.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_json_str(&content)
}

/// Parse a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_json_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a catalog file.
///
/// # Errors
///
/// Returns the I/O and parse errors of [`load_json`], plus those of
/// [`catalog_from_value`].
pub fn load_catalog(path: &Path) -> Result<Catalog, LoadError> {
    catalog_from_value(&load_json(path)?)
}

/// Load a catalog from a JSON string.
pub fn load_catalog_str(content: &str) -> Result<Catalog, LoadError> {
    catalog_from_value(&load_json_str(content)?)
}

/// Build a catalog from parsed JSON.
///
/// # Errors
///
/// Returns `LoadError::InvalidCatalog` if the value doesn't match the
/// catalog schema, or `LoadError::Documentation` if a docstring is
/// malformed.
pub fn catalog_from_value(value: &Value) -> Result<Catalog, LoadError> {
    let mut catalog = Catalog::new();
    for document in catalog_documents(value)? {
        catalog.insert(document.into_definition()?);
    }
    Ok(catalog)
}

// --- Internal implementation ---

/// One entry of a catalog file, before documentation is extracted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct CatalogDocument {
    kind: DocumentKind,
    name: String,
    description: Option<String>,
    schema: SchemaNode,
    docstring: Option<String>,
    docs: Option<DocTree>,
    #[serde(default)]
    skip_fields: Vec<String>,
    discriminator: Option<String>,
}

impl CatalogDocument {
    /// JSON Pointer suffix of the documentation source.
    pub(crate) fn docs_pointer(&self) -> &'static str {
        if self.docstring.is_some() {
            "docstring"
        } else {
            "docs"
        }
    }

    pub(crate) fn into_definition(self) -> Result<DocumentDefinition, LoadError> {
        let docs = match (self.docstring, self.docs) {
            (Some(docstring), _) => {
                extract_docs(&docstring).map_err(|source| LoadError::Documentation {
                    name: self.name.clone(),
                    source,
                })?
            }
            (None, Some(docs)) => docs,
            (None, None) => return Err(LoadError::MissingDocumentation { name: self.name }),
        };

        let mut definition = DocumentDefinition::new(self.kind, self.name, self.schema, docs)
            .skip_fields(self.skip_fields);
        definition.description = self.description;
        definition.discriminator = self.discriminator;
        Ok(definition)
    }
}

/// Validate a catalog value and deserialize its entries.
pub(crate) fn catalog_documents(value: &Value) -> Result<Vec<CatalogDocument>, LoadError> {
    validate_catalog(value).map_err(|e| match e {
        ValidateError::Invalid { errors } => LoadError::InvalidCatalog { errors },
        ValidateError::MetaSchema { message } => LoadError::InvalidCatalog {
            errors: vec![SchemaError {
                path: String::new(),
                message,
            }],
        },
    })?;

    #[derive(Deserialize)]
    struct CatalogFile {
        documents: Vec<CatalogDocument>,
    }

    serde_json::from_value::<CatalogFile>(value.clone())
        .map(|file| file.documents)
        .map_err(|source| LoadError::InvalidJson { source })
}
