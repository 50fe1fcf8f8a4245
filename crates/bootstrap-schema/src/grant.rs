//! # Permission Grant Engine
//!
//! Wires a qualified permission through the fixed capability graph:
//!
//! ```text
//! role          relation   p: user:*                         capability
//! role_binding  permission p = subject & granted->p          binding check
//! workspace     permission p = user_grant->p + parent->p     inheritance
//! ```
//!
//! The three relations are produced from a table of templates parameterized
//! only by the permission name.

use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::model::{AllowedSubject, Expression, Relation};
use crate::schema::{Schema, ROLE, ROLE_BINDING, USER, WORKSPACE};

/// Role binding edge to the bound subject.
pub const SUBJECT: &str = "subject";
/// Role binding edge to the granted role.
pub const GRANTED: &str = "granted";
/// Workspace edge to a role binding.
pub const USER_GRANT: &str = "user_grant";
/// Workspace edge to the parent workspace.
pub const PARENT: &str = "parent";

/// A relation the engine appends to one infrastructure definition.
struct WiringTemplate {
    definition: &'static str,
    build: fn(&str) -> Relation,
}

const WIRING: [WiringTemplate; 3] = [
    WiringTemplate {
        definition: ROLE,
        build: role_capability,
    },
    WiringTemplate {
        definition: ROLE_BINDING,
        build: binding_check,
    },
    WiringTemplate {
        definition: WORKSPACE,
        build: workspace_inheritance,
    },
];

fn role_capability(permission: &str) -> Relation {
    Relation::direct(permission, vec![AllowedSubject::wildcard(USER)])
}

fn binding_check(permission: &str) -> Relation {
    Relation::permission(
        permission,
        Expression::intersection([
            Expression::computed(SUBJECT),
            Expression::arrow(GRANTED, permission),
        ]),
    )
}

fn workspace_inheritance(permission: &str) -> Relation {
    Relation::permission(
        permission,
        Expression::union([
            Expression::arrow(USER_GRANT, permission),
            Expression::arrow(PARENT, permission),
        ]),
    )
}

impl Schema {
    /// Wire `permission` into `role`, `role_binding` and `workspace`.
    ///
    /// Returns `Ok(false)` without touching the graph when the permission is
    /// already wired. All three target definitions are checked before any
    /// relation is appended, so a failure leaves the graph unchanged.
    ///
    /// # Errors
    ///
    /// [`SchemaError::MissingDefinition`] if a target definition is absent and
    /// [`SchemaError::ConflictingRelation`] if one already declares a relation
    /// named `permission`.
    ///
    /// ```
    /// use bootstrap_schema::Schema;
    ///
    /// let mut schema = Schema::compile(
    ///     "definition role {}\ndefinition role_binding {}\ndefinition workspace {}",
    /// ).unwrap();
    /// assert!(schema.grant("billing_all_all").unwrap());
    /// assert!(!schema.grant("billing_all_all").unwrap());
    /// ```
    pub fn grant(&mut self, permission: &str) -> SchemaResult<bool> {
        if self.has_permission(permission) {
            return Ok(false);
        }

        let targets = self.wiring_targets(permission)?;
        for (index, template) in targets.into_iter().zip(&WIRING) {
            let relation = (template.build)(permission);
            self.definitions[index].relations.push(relation);
        }
        self.mark_permission_granted(permission);

        debug!(permission, "wired permission");
        Ok(true)
    }
}

impl Schema {
    /// Positions of the wiring targets for a permission that is not wired yet.
    fn wiring_targets(&self, permission: &str) -> SchemaResult<[usize; 3]> {
        let mut targets = [0; 3];
        for (slot, template) in targets.iter_mut().zip(&WIRING) {
            let index = self
                .position(template.definition)
                .ok_or_else(|| SchemaError::MissingDefinition(template.definition.to_string()))?;
            if self.definitions[index].has_relation(permission) {
                return Err(SchemaError::ConflictingRelation {
                    definition: template.definition.to_string(),
                    relation: permission.to_string(),
                });
            }
            *slot = index;
        }
        Ok(targets)
    }

    /// Fail if [`Schema::grant`] would reject `permission`.
    pub(crate) fn check_grantable(&self, permission: &str) -> SchemaResult<()> {
        if !self.has_permission(permission) {
            self.wiring_targets(permission)?;
        }
        Ok(())
    }
}
