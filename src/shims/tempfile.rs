/*!
 * Temporary Files
 * `mkstemp`-style creation on top of the `tempfile` crate
 */

use crate::core::limits::TEMPLATE_SUFFIX;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Create a unique file from a template ending in `XXXXXX`.
///
/// The file is created exclusively and kept on disk; the caller owns its
/// removal.
pub fn mkstemp(template: &str) -> io::Result<(File, PathBuf)> {
    let stem = template.strip_suffix(TEMPLATE_SUFFIX).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("template must end in {TEMPLATE_SUFFIX}: {template}"),
        )
    })?;

    let (dir, prefix) = match stem.rfind(['/', '\\']) {
        Some(i) => (&stem[..=i], &stem[i + 1..]),
        None => ("", stem),
    };
    let dir = if dir.is_empty() { Path::new(".") } else { Path::new(dir) };

    let file = ::tempfile::Builder::new()
        .prefix(prefix)
        .rand_bytes(TEMPLATE_SUFFIX.len())
        .tempfile_in(dir)?;

    file.keep().map_err(|e| e.error)
}
