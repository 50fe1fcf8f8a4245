//! # Resources
//!
//! Service and resource descriptions decoded from an RBAC source.

use serde::{Deserialize, Serialize};

/// Resource name that marks verbs applying to every resource of a service.
pub const WILDCARD: &str = "*";

/// One entry of a service description.
///
/// A concrete resource becomes a schema definition; the wildcard holder has no
/// backing definition and only contributes service-wide verbs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceEntry {
    /// A named resource type and its verbs.
    Concrete {
        /// Resource type name as written in the source.
        name: String,
        /// Verbs in source order, `*` verbs removed.
        permissions: Vec<String>,
    },
    /// Verbs granted across all resources of the service.
    Wildcard {
        /// Verbs in source order, `*` verbs removed.
        permissions: Vec<String>,
    },
}

impl ResourceEntry {
    /// Build an entry, classifying `*` as the wildcard holder.
    pub fn new(name: impl Into<String>, permissions: Vec<String>) -> Self {
        let name = name.into();
        if name == WILDCARD {
            ResourceEntry::Wildcard { permissions }
        } else {
            ResourceEntry::Concrete { name, permissions }
        }
    }

    /// Verbs carried by this entry.
    pub fn permissions(&self) -> &[String] {
        match self {
            ResourceEntry::Concrete { permissions, .. } | ResourceEntry::Wildcard { permissions } => {
                permissions
            }
        }
    }

    /// Resource name, `None` for the wildcard holder.
    pub fn name(&self) -> Option<&str> {
        match self {
            ResourceEntry::Concrete { name, .. } => Some(name),
            ResourceEntry::Wildcard { .. } => None,
        }
    }

    /// Check if this is the wildcard holder.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, ResourceEntry::Wildcard { .. })
    }
}

/// A decoded RBAC service: its name and resources in source order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    /// Service name (the file stem of the source).
    pub name: String,
    /// Resource entries, including at most one wildcard holder.
    pub resources: Vec<ResourceEntry>,
}

/// Shape of a single permission object in the source file.
#[derive(Debug, Deserialize)]
struct VerbEntry {
    verb: String,
}

impl Service {
    /// Create an empty service description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
        }
    }

    /// Decode a service from its JSON text.
    ///
    /// The document must be an object whose values are arrays of
    /// `{"verb": ...}` objects. Extra fields are ignored and `*` verbs are
    /// dropped. Resource order follows the document.
    pub fn from_json(name: impl Into<String>, json: &str) -> serde_json::Result<Self> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut service = Self::new(name);

        for (resource, value) in raw {
            let entries: Vec<VerbEntry> = serde_json::from_value(value)?;
            let permissions = entries
                .into_iter()
                .map(|entry| entry.verb)
                .filter(|verb| verb != WILDCARD)
                .collect();
            service.resources.push(ResourceEntry::new(resource, permissions));
        }

        Ok(service)
    }

    /// Concrete resources in source order.
    pub fn concrete(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.resources.iter().filter(|r| !r.is_wildcard())
    }

    /// The wildcard holder, if the source defined one.
    pub fn wildcard(&self) -> Option<&ResourceEntry> {
        self.resources.iter().find(|r| r.is_wildcard())
    }
}
