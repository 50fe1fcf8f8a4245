//! # Bootstrap Schema
//!
//! Incremental editing of relationship-based authorization schemas.
//!
//! A schema declares object types (`definition`), their relations and derived
//! permissions. This crate loads such a schema from a bootstrap document,
//! registers new resource types and verbs on it, wires every permission
//! through the fixed `role` / `role_binding` / `workspace` capability graph
//! and writes the result back.
//!
//! ## Example
//!
//! ```
//! use bootstrap_schema::{SchemaDocument, EMPTY_BOOTSTRAP};
//!
//! let mut document = SchemaDocument::parse(EMPTY_BOOTSTRAP).unwrap();
//! document
//!     .schema_mut()
//!     .add_permissions("billing/invoice", &["read", "write"])
//!     .unwrap();
//!
//! let schema = document.schema();
//! assert!(schema.has_permission("billing_invoice_read"));
//! assert!(schema.has_permission("billing_all_all"));
//! assert!(schema.get("billing/invoice").unwrap().has_relation("write"));
//! ```

pub mod bootstrap;
pub mod compiler;
pub mod document;
pub mod error;
pub mod generator;
pub mod grant;
pub mod importer;
pub mod model;
pub mod normalize;
pub mod ops;
pub mod registration;
pub mod schema;

pub use bootstrap::{create_bootstrap_file, EMPTY_BOOTSTRAP};
pub use compiler::{compile, CompileError};
pub use document::SchemaDocument;
pub use error::{ErrorKind, SchemaError, SchemaResult};
pub use generator::{generate, GenerateError};
pub use importer::{ImportOptions, WildcardPolicy};
pub use model::{AllowedSubject, Definition, Expression, Relation, RelationKind, SubjectTarget};
pub use normalize::normalize_name;
pub use ops::{add_resource_permissions, import_rbac_service, ResourceRef};
pub use registration::MutationSummary;
pub use schema::Schema;
