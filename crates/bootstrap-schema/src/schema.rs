//! # Schema Graph
//!
//! All object-type definitions of a schema plus the index of permissions
//! already wired into `role`.
//!
//! The index mirrors `role`'s relation names. Relations on `role`,
//! `role_binding` and `workspace` are only ever appended by
//! [`Schema::grant`], which keeps the index and the three definitions in step.

use std::collections::{HashMap, HashSet};

use crate::compiler::compile;
use crate::error::{SchemaError, SchemaResult};
use crate::generator::generate;
use crate::model::Definition;

/// Definition holding one relation per granted permission.
pub const ROLE: &str = "role";
/// Definition binding subjects to roles.
pub const ROLE_BINDING: &str = "role_binding";
/// Definition that resources belong to.
pub const WORKSPACE: &str = "workspace";
/// Subject type used for wildcard capability grants on `role`.
pub const USER: &str = "user";

/// Definitions every editable schema must contain.
pub const INFRASTRUCTURE: [&str; 3] = [ROLE, ROLE_BINDING, WORKSPACE];

/// In-memory schema graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Definitions in document order.
    pub(crate) definitions: Vec<Definition>,
    /// Name → position in `definitions`.
    positions: HashMap<String, usize>,
    /// Permissions wired into `role`.
    permissions: HashSet<String>,
}

impl Schema {
    /// Build a graph from compiled definitions.
    ///
    /// # Errors
    ///
    /// [`SchemaError::DuplicateDefinition`] on repeated names and
    /// [`SchemaError::MissingDefinition`] if `role`, `role_binding` or
    /// `workspace` is absent.
    pub fn from_definitions(definitions: Vec<Definition>) -> SchemaResult<Self> {
        let mut positions = HashMap::with_capacity(definitions.len());
        for (index, definition) in definitions.iter().enumerate() {
            if positions.insert(definition.name.clone(), index).is_some() {
                return Err(SchemaError::DuplicateDefinition(definition.name.clone()));
            }
        }

        for name in INFRASTRUCTURE {
            if !positions.contains_key(name) {
                return Err(SchemaError::MissingDefinition(name.to_string()));
            }
        }

        let permissions = positions
            .get(ROLE)
            .map(|&index| {
                definitions[index]
                    .relations
                    .iter()
                    .map(|r| r.name.clone())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            definitions,
            positions,
            permissions,
        })
    }

    /// Compile schema text into a graph.
    ///
    /// ```
    /// use bootstrap_schema::Schema;
    ///
    /// let schema = Schema::compile(
    ///     "definition user {}\n\
    ///      definition role {\n\trelation billing_all_all: user:*\n}\n\
    ///      definition role_binding {}\n\
    ///      definition workspace {}",
    /// ).unwrap();
    /// assert!(schema.has_permission("billing_all_all"));
    /// ```
    pub fn compile(source: &str) -> SchemaResult<Self> {
        Self::from_definitions(compile(source)?)
    }

    /// Render the graph back to schema text.
    pub fn to_text(&self) -> SchemaResult<String> {
        Ok(generate(&self.definitions)?)
    }

    /// Exact-name lookup. Callers normalize names first.
    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.positions.get(name).map(|&index| &self.definitions[index])
    }

    /// Add a brand-new definition at the end of the schema.
    ///
    /// # Errors
    ///
    /// [`SchemaError::DuplicateDefinition`] if the name is taken.
    pub fn insert(&mut self, definition: Definition) -> SchemaResult<()> {
        if self.positions.contains_key(&definition.name) {
            return Err(SchemaError::DuplicateDefinition(definition.name));
        }
        self.positions
            .insert(definition.name.clone(), self.definitions.len());
        self.definitions.push(definition);
        Ok(())
    }

    /// Check whether a permission is already wired.
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }

    /// Record a permission as wired. Idempotent.
    pub(crate) fn mark_permission_granted(&mut self, name: &str) {
        if !self.permissions.contains(name) {
            self.permissions.insert(name.to_string());
        }
    }

    /// Wired permissions, sorted.
    pub fn permissions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.permissions.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of wired permissions.
    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }

    /// Definitions in document order.
    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{AllowedSubject, Relation};

    pub(crate) const BASE: &str = "definition user {}

definition role {}

definition role_binding {
\trelation subject: user
\trelation granted: role
}

definition workspace {
\trelation parent: workspace
\trelation user_grant: role_binding
}";

    pub(crate) fn base_schema() -> Schema {
        Schema::compile(BASE).unwrap()
    }

    #[test]
    fn test_from_definitions_requires_infrastructure() {
        let err = Schema::compile("definition user {}\ndefinition role {}\ndefinition workspace {}").unwrap_err();
        assert!(matches!(err, SchemaError::MissingDefinition(ref name) if name == "role_binding"));
    }

    #[test]
    fn test_index_built_from_role() {
        let schema = Schema::compile(
            "definition role {\n\trelation a_b_c: user:*\n\trelation a_all_all: user:*\n}\n\
             definition role_binding {}\ndefinition workspace {}",
        )
        .unwrap();
        assert_eq!(schema.permissions(), vec!["a_all_all", "a_b_c"]);
        assert!(schema.has_permission("a_b_c"));
        assert!(!schema.has_permission("a_b_d"));
    }

    #[test]
    fn test_get_is_exact() {
        let schema = base_schema();
        assert!(schema.get("workspace").is_some());
        assert!(schema.get("Workspace").is_none());
    }

    #[test]
    fn test_insert_appends() {
        let mut schema = base_schema();
        let def = Definition::new("billing/invoice")
            .with_relation(Relation::direct("workspace", vec![AllowedSubject::object(WORKSPACE)]));
        schema.insert(def).unwrap();

        assert_eq!(schema.definitions().last().unwrap().name, "billing/invoice");
        assert!(schema.get("billing/invoice").is_some());
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut schema = base_schema();
        let err = schema.insert(Definition::new("role")).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateDefinition(ref name) if name == "role"));
        assert_eq!(schema, base_schema());
    }

    #[test]
    fn test_mark_permission_granted_idempotent() {
        let mut schema = base_schema();
        schema.mark_permission_granted("x_y_z");
        schema.mark_permission_granted("x_y_z");
        assert_eq!(schema.permission_count(), 1);
    }

    #[test]
    fn test_to_text_roundtrip() {
        let schema = base_schema();
        assert_eq!(schema.to_text().unwrap(), BASE);
    }
}
