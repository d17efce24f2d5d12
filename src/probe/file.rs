use std::path::Path;

use crate::error::ProbeError;

/// `Ok(true)` once `path` exists. Errors while checking (permission denied on
/// a parent directory, broken mount) are faults.
pub fn file_exists(path: impl AsRef<Path>) -> Result<bool, ProbeError> {
    Ok(path.as_ref().try_exists()?)
}
