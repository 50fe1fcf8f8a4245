//! # Bootstrap RBAC
//!
//! Decodes role-based access control service descriptions so their verbs can
//! be imported into a relationship-based schema.
//!
//! ## Overview
//!
//! An RBAC configuration directory holds one JSON file per service. Each file
//! maps a resource name to the verbs allowed on it:
//!
//! ```text
//! permissions/
//!   billing.json    { "invoice": [{"verb": "read"}, {"verb": "write"}],
//!                     "*":       [{"verb": "admin"}] }
//! ```
//!
//! The `*` resource is not a real resource type. It holds verbs that apply to
//! every resource of the service and is surfaced as
//! [`ResourceEntry::Wildcard`] rather than a resource with a magic name.
//!
//! ## Usage
//!
//! ```rust
//! use bootstrap_rbac::{ResourceEntry, Service};
//!
//! let json = r#"{ "invoice": [{"verb": "read"}], "*": [{"verb": "admin"}] }"#;
//! let service = Service::from_json("billing", json).unwrap();
//!
//! assert_eq!(service.concrete().count(), 1);
//! assert_eq!(service.wildcard().unwrap().permissions(), ["admin".to_string()]);
//! ```

pub mod error;
pub mod loader;
pub mod resources;

// Re-export main types for convenience
pub use error::{RbacError, RbacResult};
pub use loader::load_service;
pub use resources::{ResourceEntry, Service, WILDCARD};
