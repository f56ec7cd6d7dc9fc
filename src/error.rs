//! Error types for documentation extraction, type synthesis and catalog loading.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed structured documentation attached to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocError {
    #[error("documentation contains no definition list")]
    MissingDefinitionList,

    #[error("invalid description for '{term}': entry must contain a paragraph or a definition list")]
    EmptyTerm { term: String },
}

/// Errors during type synthesis.
///
/// Every variant carries the fully-qualified generated name of the field
/// that could not be converted.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("schema conversion: {path}: {message}")]
    Conversion { path: String, message: String },

    #[error("schema conversion: {path}: {source}")]
    Documentation {
        path: String,
        #[source]
        source: DocError,
    },

    #[error("schema conversion: {path}: union mixes scalar and non-scalar alternatives")]
    MixedUnion { path: String },

    #[error("schema conversion: {path}: unsupported validator '{validator}'")]
    UnsupportedValidator { path: String, validator: String },

    #[error("schema conversion: {path}: union of different scalars is not allowed in strict mode")]
    AmbiguousUnion { path: String },
}

impl SynthError {
    pub(crate) fn conversion(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Generated name of the offending field.
    pub fn path(&self) -> &str {
        match self {
            Self::Conversion { path, .. }
            | Self::Documentation { path, .. }
            | Self::MixedUnion { path }
            | Self::UnsupportedValidator { path, .. }
            | Self::AmbiguousUnion { path } => path,
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading catalogs and instance documents.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid catalog: {}", errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    InvalidCatalog { errors: Vec<SchemaError> },

    #[error("invalid docstring for {name}: {source}")]
    Documentation {
        name: String,
        #[source]
        source: DocError,
    },

    #[error("document {name} has neither a docstring nor docs")]
    MissingDocumentation { name: String },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors during catalog validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("catalog schema could not be compiled: {message}")]
    MetaSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::MetaSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("catalog.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::MissingDocumentation {
            name: "ServiceConfiguration".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn synth_error_carries_path() {
        let err = SynthError::MixedUnion {
            path: "ProjectConfigurationSrc".into(),
        };
        assert_eq!(err.path(), "ProjectConfigurationSrc");
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("ProjectConfigurationSrc"));
    }

    #[test]
    fn documentation_error_display() {
        let err = SynthError::Documentation {
            path: "AppConfiguration".into(),
            source: DocError::EmptyTerm {
                term: "name".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "schema conversion: AppConfiguration: invalid description for 'name': entry must contain a paragraph or a definition list"
        );
    }

    #[test]
    fn validate_error_exit_codes() {
        let err = ValidateError::Invalid {
            errors: vec![SchemaError {
                path: "/documents/0/kind".into(),
                message: "unknown kind".into(),
            }],
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn schema_error_display() {
        let err = SchemaError {
            path: "/documents/0/schema".into(),
            message: "missing type".into(),
        };
        assert_eq!(err.to_string(), "/documents/0/schema: missing type");
    }
}
