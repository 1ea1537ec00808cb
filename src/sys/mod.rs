/*!
 * Platform Backends
 *
 * Native primitives behind the emulation layer. Each backend exposes the same
 * surface: inheritable pipes, timed child waits, foreign-process probing and
 * termination, native signal installation, named interrupt channels and the
 * console-control hook.
 */

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::*;

/// Disposition requested from the native signal facility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeDisposition {
    Default,
    Ignore,
    /// Route delivery through the crate's handler table
    Trampoline,
}
