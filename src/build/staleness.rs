//! Timestamp staleness checks.
//!
//! An artifact is stale when it is missing, or when any of its inputs was
//! modified at or after the artifact. Equal timestamps count as stale so a
//! coarse filesystem clock cannot hide an edit. There is no content hashing.

use crate::error::{BuildError, BuildResult};
use crate::plan::SourceSpec;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

fn modified(path: &Path) -> BuildResult<SystemTime> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| BuildError::io(path, e))
}

/// Modification time of `target`, or `None` when it does not exist
fn target_time(target: &Path) -> BuildResult<Option<SystemTime>> {
    match fs::metadata(target) {
        Ok(meta) => meta
            .modified()
            .map(Some)
            .map_err(|e| BuildError::io(target, e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BuildError::io(target, e)),
    }
}

fn any_at_or_after<'a>(
    built: SystemTime,
    inputs: impl IntoIterator<Item = &'a PathBuf>,
) -> BuildResult<bool> {
    for input in inputs {
        if modified(input)? >= built {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether `target` must be rebuilt from `sources`.
///
/// Directory specs contribute only their immediate compilable children.
pub fn is_stale(target: &Path, sources: &[SourceSpec]) -> BuildResult<bool> {
    let Some(built) = target_time(target)? else {
        return Ok(true);
    };
    for spec in sources {
        if any_at_or_after(built, &spec.files()?)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether `target` must be rebuilt from a list of plain input files.
pub fn is_stale_against(target: &Path, inputs: &[PathBuf]) -> BuildResult<bool> {
    match target_time(target)? {
        None => Ok(true),
        Some(built) => any_at_or_after(built, inputs),
    }
}
