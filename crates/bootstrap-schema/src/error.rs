//! Error types for schema editing
//!
//! Every failure is fatal and surfaces before the edited schema is written
//! back, so a persisted document is only replaced after a fully successful run.

use std::path::PathBuf;

use bootstrap_rbac::RbacError;
use thiserror::Error;

use crate::compiler::CompileError;
use crate::generator::GenerateError;

/// Broad failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A file could not be read or written.
    Io,
    /// A document, schema text or RBAC source could not be decoded.
    MalformedInput,
    /// A caller-supplied argument is malformed.
    MalformedArgument,
}

/// Schema editing error types.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Reading or writing a file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// The bootstrap document is not valid YAML
    #[error("Invalid bootstrap document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The bootstrap document has no string `schema` key
    #[error("Bootstrap document has no `schema` text")]
    MissingSchemaText,

    /// The schema text failed to compile
    #[error("Schema compile error: {0}")]
    Compile(#[from] CompileError),

    /// The schema could not be rendered back to text
    #[error("Schema generation error: {0}")]
    Generate(#[from] GenerateError),

    /// A definition with this name is already present
    #[error("Definition already exists: {0}")]
    DuplicateDefinition(String),

    /// One of the fixed infrastructure definitions is absent
    #[error("Schema is missing required definition: {0}")]
    MissingDefinition(String),

    /// Resource identifier is not `<service>/<resource>`
    #[error("Resource type not well-formed, should be <service_name>/<resource_type>: {0}")]
    MalformedResource(String),

    /// A verb normalizes to an unusable relation name
    #[error("Invalid permission name: '{0}'")]
    InvalidPermission(String),

    /// A relation that is about to be added already exists
    #[error("Relation `{relation}` already exists on `{definition}`")]
    ConflictingRelation {
        /// Definition that already carries the relation
        definition: String,
        /// Relation name
        relation: String,
    },

    /// The external RBAC source could not be loaded
    #[error(transparent)]
    Rbac(#[from] RbacError),
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

impl SchemaError {
    /// Wrap an I/O failure with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SchemaError::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchemaError::Io { .. } => ErrorKind::Io,
            SchemaError::Rbac(err) if err.is_io() => ErrorKind::Io,

            SchemaError::Yaml(_)
            | SchemaError::MissingSchemaText
            | SchemaError::Compile(_)
            | SchemaError::Generate(_)
            | SchemaError::DuplicateDefinition(_)
            | SchemaError::MissingDefinition(_)
            | SchemaError::ConflictingRelation { .. }
            | SchemaError::Rbac(_) => ErrorKind::MalformedInput,

            SchemaError::MalformedResource(_) | SchemaError::InvalidPermission(_) => {
                ErrorKind::MalformedArgument
            }
        }
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            SchemaError::Io { .. } => "IO_ERROR",
            SchemaError::Yaml(_) => "INVALID_DOCUMENT",
            SchemaError::MissingSchemaText => "MISSING_SCHEMA_TEXT",
            SchemaError::Compile(_) => "COMPILE_ERROR",
            SchemaError::Generate(_) => "GENERATE_ERROR",
            SchemaError::DuplicateDefinition(_) => "DUPLICATE_DEFINITION",
            SchemaError::MissingDefinition(_) => "MISSING_DEFINITION",
            SchemaError::MalformedResource(_) => "MALFORMED_RESOURCE",
            SchemaError::InvalidPermission(_) => "INVALID_PERMISSION",
            SchemaError::ConflictingRelation { .. } => "CONFLICTING_RELATION",
            SchemaError::Rbac(_) => "RBAC_SOURCE_ERROR",
        }
    }
}
