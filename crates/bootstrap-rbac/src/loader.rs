//! Loads service descriptions from an RBAC configuration directory.

use std::path::Path;

use tracing::debug;

use crate::error::{RbacError, RbacResult};
use crate::resources::Service;

/// Load `<dir>/<service>.json` into a [`Service`].
///
/// # Arguments
///
/// * `dir` - RBAC configuration directory containing one JSON file per service
/// * `service` - Service name; must match a file stem in `dir`
///
/// # Errors
///
/// [`RbacError::Io`] if the file cannot be read, [`RbacError::Decode`] if it is
/// not a resource → verbs mapping.
pub fn load_service(dir: impl AsRef<Path>, service: &str) -> RbacResult<Service> {
    let path = dir.as_ref().join(format!("{service}.json"));
    let contents = std::fs::read_to_string(&path).map_err(|source| RbacError::Io {
        path: path.clone(),
        source,
    })?;

    let decoded = Service::from_json(service, &contents).map_err(|source| RbacError::Decode {
        service: service.to_string(),
        source,
    })?;

    debug!(
        service = %decoded.name,
        path = %path.display(),
        resources = decoded.resources.len(),
        "loaded RBAC service"
    );

    Ok(decoded)
}
