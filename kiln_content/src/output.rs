//! Writes the generated manifest without ever leaving a partially written file behind.

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use kiln_shared::log::{info, trace};
use tempfile::NamedTempFile;

use crate::Result;

/// Result of [`write_atomically`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was created or replaced.
    Written,
    /// The file already had the given content and wasn't touched.
    Unchanged,
}

/// Returns whether the file at `path` exists and has exactly the given content.
pub fn is_up_to_date(path: impl AsRef<Path>, contents: &str) -> Result<bool> {
    match fs::read(path.as_ref()) {
        Ok(existing) => Ok(existing == contents.as_bytes()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Replaces the file at `path` with `contents`.
///
/// The content is written to a temporary file in the same directory which is then renamed
/// over the target, so readers see either the old or the new file. When the file already
/// has the given content, it isn't modified at all and its modification time stays the same.
pub fn write_atomically(path: impl AsRef<Path>, contents: &str) -> Result<WriteOutcome> {
    let path = path.as_ref();
    if is_up_to_date(path, contents)? {
        info!("'{}' is up to date", path.display());
        return Ok(WriteOutcome::Unchanged);
    }

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory)?;

    let mut file = NamedTempFile::new_in(directory)?;
    trace!("Writing to temporary file '{}'", file.path().display());
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    info!("Wrote '{}'", path.display());
    Ok(WriteOutcome::Written)
}
