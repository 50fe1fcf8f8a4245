//! Imports an RBAC service description into the schema.

use bootstrap_rbac::{ResourceEntry, Service, WILDCARD};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{SchemaError, SchemaResult};
use crate::normalize::normalize_name;
use crate::registration::{normalize_verb, qualified_permission, MutationSummary, ALL};
use crate::schema::Schema;

/// How the `*` resource of a service is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WildcardPolicy {
    /// Grant `app_all_all` and `app_all_<verb>` for each of its verbs.
    #[default]
    Grant,
    /// Ignore the wildcard holder.
    Skip,
}

/// Options for [`Schema::import_service`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Treatment of the wildcard holder.
    pub wildcard: WildcardPolicy,
}

impl Schema {
    /// Register every resource of `service`, in source order.
    ///
    /// Concrete resources go through [`Schema::register_resource_type`]. The
    /// wildcard holder never creates a definition; with
    /// [`WildcardPolicy::Grant`] it wires the service-wide verb wildcards.
    pub fn import_service(&mut self, service: &Service, options: &ImportOptions) -> SchemaResult<MutationSummary> {
        let mut summary = MutationSummary::default();

        for entry in &service.resources {
            match entry {
                ResourceEntry::Concrete { name, permissions } => {
                    summary.merge(self.register_resource_type(&service.name, name, permissions)?);
                }
                ResourceEntry::Wildcard { permissions } => match options.wildcard {
                    WildcardPolicy::Grant => {
                        summary.merge(self.grant_service_wildcards(&service.name, permissions)?);
                    }
                    WildcardPolicy::Skip => {
                        info!(service = %service.name, "skipping wildcard resource");
                    }
                },
            }
        }

        info!(
            service = %service.name,
            definitions = summary.created_definitions.len(),
            granted = summary.granted_permissions.len(),
            "imported service"
        );
        Ok(summary)
    }

    /// Wire `app_all_all` and `app_all_<verb>` for each verb.
    ///
    /// No definition is created since there is no concrete resource to expose
    /// the verbs on.
    pub fn grant_service_wildcards<S: AsRef<str>>(
        &mut self,
        app: &str,
        permissions: &[S],
    ) -> SchemaResult<MutationSummary> {
        let app = normalize_name(app);
        if app.is_empty() {
            return Err(SchemaError::MalformedResource(format!("{app}/{WILDCARD}")));
        }
        let mut verbs = Vec::with_capacity(permissions.len());
        for verb in permissions {
            let verb: &str = verb.as_ref();
            if verb != WILDCARD {
                verbs.push(normalize_verb(verb)?);
            }
        }

        let app_wildcard = qualified_permission(&app, ALL, ALL);
        self.check_grantable(&app_wildcard)?;
        for verb in &verbs {
            self.check_grantable(&qualified_permission(&app, ALL, verb))?;
        }

        let mut summary = MutationSummary::default();
        summary.record_grant(&app_wildcard, self.grant(&app_wildcard)?);
        for verb in &verbs {
            let verb_wildcard = qualified_permission(&app, ALL, verb);
            summary.record_grant(&verb_wildcard, self.grant(&verb_wildcard)?);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::base_schema;

    fn service(json: &str) -> Service {
        Service::from_json("svc", json).unwrap()
    }

    #[test]
    fn test_import_fan_out() {
        let mut schema = base_schema();
        let svc = service(r#"{ "doc": [{"verb": "read"}, {"verb": "write"}], "*": [{"verb": "admin"}] }"#);

        let summary = schema.import_service(&svc, &ImportOptions::default()).unwrap();

        assert_eq!(summary.created_definitions, vec!["svc/doc"]);
        assert_eq!(
            schema.permissions(),
            vec![
                "svc_all_admin",
                "svc_all_all",
                "svc_all_read",
                "svc_all_write",
                "svc_doc_all",
                "svc_doc_read",
                "svc_doc_write",
            ]
        );
        assert!(schema.get("svc/*").is_none());
        assert!(schema.get("svc/all").is_none());
        assert_eq!(
            schema.definitions().iter().filter(|d| d.name.starts_with("svc/")).count(),
            1
        );
    }

    #[test]
    fn test_import_skip_wildcard() {
        let mut schema = base_schema();
        let svc = service(r#"{ "*": [{"verb": "admin"}] }"#);

        let summary = schema
            .import_service(
                &svc,
                &ImportOptions {
                    wildcard: WildcardPolicy::Skip,
                },
            )
            .unwrap();

        assert!(summary.is_empty());
        assert_eq!(schema, base_schema());
    }

    #[test]
    fn test_import_matches_sequential_registration() {
        let mut imported = base_schema();
        let svc = service(r#"{ "b": [{"verb": "read"}], "a": [{"verb": "write"}] }"#);
        imported.import_service(&svc, &ImportOptions::default()).unwrap();

        let mut registered = base_schema();
        registered.register_resource_type("svc", "b", &["read"]).unwrap();
        registered.register_resource_type("svc", "a", &["write"]).unwrap();

        assert_eq!(imported, registered);
        let names: Vec<_> = imported.definitions().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names[names.len() - 2..], ["svc/b", "svc/a"]);
    }

    #[test]
    fn test_service_wildcards_skip_star() {
        let mut schema = base_schema();
        let summary = schema.grant_service_wildcards("svc", &["*", "admin"]).unwrap();
        assert_eq!(summary.granted_permissions, vec!["svc_all_all", "svc_all_admin"]);
    }

    #[test]
    fn test_import_is_idempotent() {
        let mut schema = base_schema();
        let svc = service(r#"{ "doc": [{"verb": "read"}], "*": [{"verb": "admin"}] }"#);
        schema.import_service(&svc, &ImportOptions::default()).unwrap();
        let before = schema.clone();

        let summary = schema.import_service(&svc, &ImportOptions::default()).unwrap();
        assert!(summary.is_empty());
        assert_eq!(schema, before);
    }
}
