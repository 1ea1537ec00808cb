/*!
 * Peripheral OS Shims
 * Stateless helpers the host engine consumes next to the signal and process layers
 */

pub mod console;
pub mod identity;
pub mod path;
pub mod tempfile;

pub use console::{console_cleanup, console_init, read_char, stdin_ready, write_str};
pub use identity::{
    getegid, geteuid, getgid, getpwnam, getpwuid, getuid, home_dir, username, Passwd,
};
pub use path::{readlink, to_native_path, to_posix_path};
pub use tempfile::mkstemp;
