//! # Resource Registration
//!
//! Ensures a resource type exists and exposes each requested verb on it.
//!
//! For app `billing`, resource `invoice` and verb `read` the following
//! permissions are wired through the grant engine:
//!
//! ```text
//! billing_all_all        app-wide wildcard        (always)
//! billing_invoice_all    resource-wide wildcard   (always)
//! billing_invoice_read   qualified permission
//! billing_all_read       same verb on every resource of the app
//! ```
//!
//! and the resource definition gains
//!
//! ```text
//! permission read = workspace->billing_invoice_read + workspace->billing_all_read
//!                 + workspace->billing_invoice_all + workspace->billing_all_all
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{SchemaError, SchemaResult};
use crate::model::{AllowedSubject, Definition, Expression, Relation};
use crate::normalize::normalize_name;
use crate::schema::{Schema, WORKSPACE};

/// Token used in place of a resource type or verb in wildcard permissions.
pub const ALL: &str = "all";

/// Structural relation linking a resource to its workspace.
pub const WORKSPACE_RELATION: &str = "workspace";

/// `app_resource_verb`
pub fn qualified_permission(app: &str, resource_type: &str, verb: &str) -> String {
    format!("{app}_{resource_type}_{verb}")
}

/// `app/resource`
pub fn definition_name(app: &str, resource_type: &str) -> String {
    format!("{app}/{resource_type}")
}

/// What a mutation added to the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MutationSummary {
    /// Definitions created, in creation order.
    pub created_definitions: Vec<String>,
    /// Permissions newly wired through the grant engine, in grant order.
    pub granted_permissions: Vec<String>,
}

impl MutationSummary {
    /// Check whether the mutation changed nothing.
    pub fn is_empty(&self) -> bool {
        self.created_definitions.is_empty() && self.granted_permissions.is_empty()
    }

    /// Fold another summary into this one.
    pub fn merge(&mut self, other: MutationSummary) {
        self.created_definitions.extend(other.created_definitions);
        self.granted_permissions.extend(other.granted_permissions);
    }

    pub(crate) fn record_grant(&mut self, permission: &str, granted: bool) {
        if granted {
            self.granted_permissions.push(permission.to_string());
        }
    }
}

/// Normalize a verb, rejecting names that cannot become a relation.
pub(crate) fn normalize_verb(verb: &str) -> SchemaResult<String> {
    let normalized = normalize_name(verb);
    if normalized.is_empty() {
        return Err(SchemaError::InvalidPermission(verb.to_string()));
    }
    Ok(normalized)
}

fn resource_surface(
    verb: &str,
    qualified: &str,
    verb_wildcard: &str,
    resource_wildcard: &str,
    app_wildcard: &str,
) -> Relation {
    Relation::permission(
        verb,
        Expression::union([
            Expression::arrow(WORKSPACE_RELATION, qualified),
            Expression::arrow(WORKSPACE_RELATION, verb_wildcard),
            Expression::arrow(WORKSPACE_RELATION, resource_wildcard),
            Expression::arrow(WORKSPACE_RELATION, app_wildcard),
        ]),
    )
}

impl Schema {
    /// Ensure `app/resource_type` exists and expose `permissions` on it.
    ///
    /// Names are normalized first. An existing resource type is extended; verbs
    /// whose qualified permission is already wired are skipped. Arguments are
    /// validated before the graph is touched.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::MalformedResource`] if app or resource type normalize
    ///   to an empty name
    /// - [`SchemaError::InvalidPermission`] for an empty verb
    /// - [`SchemaError::ConflictingRelation`] if the resource already declares
    ///   a relation named after a verb that is not wired yet
    ///
    /// ```
    /// use bootstrap_schema::Schema;
    ///
    /// let mut schema = Schema::compile(
    ///     "definition role {}\ndefinition role_binding {}\ndefinition workspace {}",
    /// ).unwrap();
    /// schema.register_resource_type("Billing", "Invoice", &["read"]).unwrap();
    ///
    /// assert!(schema.get("billing/invoice").unwrap().has_relation("read"));
    /// assert!(schema.has_permission("billing_all_read"));
    /// ```
    pub fn register_resource_type<S: AsRef<str>>(
        &mut self,
        app: &str,
        resource_type: &str,
        permissions: &[S],
    ) -> SchemaResult<MutationSummary> {
        let app = normalize_name(app);
        let resource_type = normalize_name(resource_type);
        if app.is_empty() || resource_type.is_empty() {
            return Err(SchemaError::MalformedResource(definition_name(&app, &resource_type)));
        }
        let name = definition_name(&app, &resource_type);

        let verbs = permissions
            .iter()
            .map(|verb| normalize_verb(verb.as_ref()))
            .collect::<SchemaResult<Vec<_>>>()?;

        let app_wildcard = qualified_permission(&app, ALL, ALL);
        let resource_wildcard = qualified_permission(&app, &resource_type, ALL);

        // Checked up front so a conflict cannot leave a half-registered type.
        self.check_grantable(&app_wildcard)?;
        self.check_grantable(&resource_wildcard)?;
        let existing = self.get(&name);
        for verb in &verbs {
            let qualified = qualified_permission(&app, &resource_type, verb);
            if self.has_permission(&qualified) {
                continue;
            }
            self.check_grantable(&qualified)?;
            self.check_grantable(&qualified_permission(&app, ALL, verb))?;
            let taken = match existing {
                Some(definition) => definition.has_relation(verb),
                None => verb == WORKSPACE_RELATION,
            };
            if taken {
                return Err(SchemaError::ConflictingRelation {
                    definition: name,
                    relation: verb.clone(),
                });
            }
        }

        let mut summary = MutationSummary::default();

        if self.get(&name).is_none() {
            let definition = Definition::new(&name).with_relation(Relation::direct(
                WORKSPACE_RELATION,
                vec![AllowedSubject::object(WORKSPACE)],
            ));
            self.insert(definition)?;
            debug!(definition = %name, "created resource type");
            summary.created_definitions.push(name.clone());
        }

        summary.record_grant(&app_wildcard, self.grant(&app_wildcard)?);
        summary.record_grant(&resource_wildcard, self.grant(&resource_wildcard)?);

        for verb in &verbs {
            let qualified = qualified_permission(&app, &resource_type, verb);
            if self.has_permission(&qualified) {
                continue;
            }

            summary.record_grant(&qualified, self.grant(&qualified)?);
            let verb_wildcard = qualified_permission(&app, ALL, verb);
            summary.record_grant(&verb_wildcard, self.grant(&verb_wildcard)?);

            let index = self
                .position(&name)
                .ok_or_else(|| SchemaError::MissingDefinition(name.clone()))?;
            self.definitions[index].relations.push(resource_surface(
                verb,
                &qualified,
                &verb_wildcard,
                &resource_wildcard,
                &app_wildcard,
            ));
            debug!(definition = %name, permission = %verb, "exposed permission on resource");
        }

        info!(
            definition = %name,
            granted = summary.granted_permissions.len(),
            "registered resource type"
        );
        Ok(summary)
    }
}
