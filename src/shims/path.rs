/*!
 * Path Conversion
 * POSIX-style paths to native Windows form and back, and link resolution
 */

use std::io;
use std::path::{Path, PathBuf};

fn is_drive_root(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() == 3 && bytes[1] == b':'
}

/// Convert a POSIX-style path to native form.
///
/// `/c/...` becomes `C:\...`, both separators become `\`, runs of separators
/// collapse, and a trailing separator is dropped unless the path is a drive root.
pub fn to_native_path(posix: &str) -> String {
    let bytes = posix.as_bytes();
    let mut native = String::with_capacity(posix.len() + 1);
    let mut rest = posix;
    let mut prev_was_sep = false;

    if bytes.len() >= 2
        && bytes[0] == b'/'
        && bytes[1].is_ascii_alphabetic()
        && (bytes.len() == 2 || bytes[2] == b'/')
    {
        native.push(bytes[1].to_ascii_uppercase() as char);
        native.push_str(":\\");
        rest = &posix[bytes.len().min(3)..];
        prev_was_sep = true;
    }

    for c in rest.chars() {
        if c == '/' || c == '\\' {
            if !prev_was_sep {
                native.push('\\');
                prev_was_sep = true;
            }
        } else {
            native.push(c);
            prev_was_sep = false;
        }
    }

    if native.len() > 1 && native.ends_with('\\') && !is_drive_root(&native) {
        native.pop();
    }
    native
}

/// Convert a native path to POSIX style by replacing `\` with `/`
pub fn to_posix_path(native: &str) -> String {
    native.replace('\\', "/")
}

/// Drop the `\\?\` verbatim prefix the native resolver puts on final paths
#[cfg(any(windows, test))]
fn strip_verbatim(path: &str) -> &str {
    path.strip_prefix(r"\\?\").unwrap_or(path)
}

/// Target of a symbolic link
#[cfg(unix)]
pub fn readlink(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    std::fs::read_link(path)
}

/// Fully resolved final path of `path`, links and junctions followed
#[cfg(windows)]
pub fn readlink(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let resolved = std::fs::canonicalize(path)?;
    let text = resolved.to_string_lossy();
    Ok(PathBuf::from(strip_verbatim(&text)))
}
