//! Document-level operations: load, mutate, store.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::info;

use crate::document::SchemaDocument;
use crate::error::{SchemaError, SchemaResult};
use crate::importer::ImportOptions;
use crate::registration::MutationSummary;
use crate::schema::Schema;

/// A `<service>/<resource>` identifier as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Service (app) part.
    pub service: String,
    /// Resource type part.
    pub resource: String,
}

impl ResourceRef {
    /// Split `service/resource`. Names are not normalized here.
    ///
    /// ```
    /// use bootstrap_schema::ResourceRef;
    ///
    /// let r = ResourceRef::parse("billing/invoice").unwrap();
    /// assert_eq!(r.service, "billing");
    /// assert!(ResourceRef::parse("billing").is_err());
    /// ```
    pub fn parse(id: &str) -> SchemaResult<Self> {
        let parts: Vec<&str> = id.split('/').collect();
        match parts.as_slice() {
            [service, resource] if !service.is_empty() && !resource.is_empty() => Ok(Self {
                service: service.to_string(),
                resource: resource.to_string(),
            }),
            _ => Err(SchemaError::MalformedResource(id.to_string())),
        }
    }
}

impl FromStr for ResourceRef {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.resource)
    }
}

impl Schema {
    /// Register `verbs` on the resource named by `resource_id`.
    pub fn add_permissions<S: AsRef<str>>(
        &mut self,
        resource_id: &str,
        verbs: &[S],
    ) -> SchemaResult<MutationSummary> {
        let resource = ResourceRef::parse(resource_id)?;
        self.register_resource_type(&resource.service, &resource.resource, verbs)
    }
}

/// Load `input`, register `verbs` on `resource_id` and store to `output`.
///
/// The identifier is checked before any file is read; nothing is written
/// unless every step succeeds.
pub fn add_resource_permissions<S: AsRef<str>>(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    resource_id: &str,
    verbs: &[S],
) -> SchemaResult<MutationSummary> {
    let resource = ResourceRef::parse(resource_id)?;

    let mut document = SchemaDocument::load(input)?;
    let summary = document
        .schema_mut()
        .register_resource_type(&resource.service, &resource.resource, verbs)?;
    document.store(output)?;

    info!(
        resource = %resource,
        definitions = summary.created_definitions.len(),
        granted = summary.granted_permissions.len(),
        "added resource permissions"
    );
    Ok(summary)
}

/// Load `input`, import service `svc` from `rbac_dir` and store to `output`.
///
/// The RBAC source is read before the document.
pub fn import_rbac_service(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    rbac_dir: impl AsRef<Path>,
    svc: &str,
    options: &ImportOptions,
) -> SchemaResult<MutationSummary> {
    let service = bootstrap_rbac::load_service(rbac_dir, svc)?;

    let mut document = SchemaDocument::load(input)?;
    let summary = document.schema_mut().import_service(&service, options)?;
    document.store(output)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::base_schema;

    #[test]
    fn test_parse_resource_ref() {
        let r: ResourceRef = "cost-management/aws.account".parse().unwrap();
        assert_eq!(r.service, "cost-management");
        assert_eq!(r.resource, "aws.account");
        assert_eq!(r.to_string(), "cost-management/aws.account");
    }

    #[test]
    fn test_parse_resource_ref_rejects_malformed() {
        for id in ["", "svc", "svc/", "/res", "a/b/c", "/"] {
            let err = ResourceRef::parse(id).unwrap_err();
            assert!(matches!(err, SchemaError::MalformedResource(_)), "{id:?}");
        }
    }

    #[test]
    fn test_add_permissions() {
        let mut schema = base_schema();
        let summary = schema.add_permissions("app/res", &["read"]).unwrap();
        assert_eq!(summary.created_definitions, vec!["app/res"]);

        let before = schema.clone();
        assert!(schema.add_permissions("app-res", &["read"]).is_err());
        assert_eq!(schema, before);
    }
}
