//! Starter bootstrap document.

use std::fs::OpenOptions;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::error::{SchemaError, SchemaResult};

/// Document with only the infrastructure definitions and no relationships.
pub const EMPTY_BOOTSTRAP: &str = include_str!("../templates/empty_bootstrap.yaml");

/// Write [`EMPTY_BOOTSTRAP`] to `path` unless something is already there.
///
/// Returns `Ok(false)` and leaves the existing file alone when the path is
/// taken.
pub fn create_bootstrap_file(path: impl AsRef<Path>) -> SchemaResult<bool> {
    let path = path.as_ref();

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == IoErrorKind::AlreadyExists => {
            warn!(path = %path.display(), "bootstrap file already exists, leaving it untouched");
            return Ok(false);
        }
        Err(err) => return Err(SchemaError::io(path, err)),
    };

    file.write_all(EMPTY_BOOTSTRAP.as_bytes())
        .map_err(|err| SchemaError::io(path, err))?;

    info!(path = %path.display(), "created bootstrap file");
    Ok(true)
}
