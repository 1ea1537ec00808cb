/*!
 * Unix Backend
 *
 * Unix stand-ins for the native primitives:
 * - named channel: a FIFO in the temp directory, drained on every wake
 * - console control: a signal-hook forwarding thread for SIGINT and SIGHUP
 * - timed child wait: `try_wait` polling with exponential backoff
 */

use super::NativeDisposition;
use crate::core::limits::{SIGNALED_EXIT_BASE, WAIT_POLL_INITIAL, WAIT_POLL_MAX};
use crate::core::types::Pid;
use crate::signals::console::{on_control_event, ControlEvent, ControlReply};
use crate::signals::registry::dispatch_native;
use crate::signals::Signal;
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::signal::{self as nsig, SaFlags, SigAction, SigHandler, SigSet};
use nix::sys::stat::Mode;
use nix::unistd;
use parking_lot::Mutex;
use std::ffi::c_int;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::os::unix::fs::{FileTypeExt, MetadataExt, OpenOptionsExt};
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Native descriptor type handed across the pipe layer
pub type OwnedDescriptor = OwnedFd;

fn native(signal: Signal) -> nsig::Signal {
    match signal {
        Signal::SIGHUP => nsig::Signal::SIGHUP,
        Signal::SIGINT => nsig::Signal::SIGINT,
        Signal::SIGQUIT => nsig::Signal::SIGQUIT,
        Signal::SIGILL => nsig::Signal::SIGILL,
        Signal::SIGABRT => nsig::Signal::SIGABRT,
        Signal::SIGBUS => nsig::Signal::SIGBUS,
        Signal::SIGFPE => nsig::Signal::SIGFPE,
        Signal::SIGKILL => nsig::Signal::SIGKILL,
        Signal::SIGUSR1 => nsig::Signal::SIGUSR1,
        Signal::SIGSEGV => nsig::Signal::SIGSEGV,
        Signal::SIGUSR2 => nsig::Signal::SIGUSR2,
        Signal::SIGPIPE => nsig::Signal::SIGPIPE,
        Signal::SIGALRM => nsig::Signal::SIGALRM,
        Signal::SIGTERM => nsig::Signal::SIGTERM,
    }
}

fn from_native(signum: c_int) -> Option<Signal> {
    let native_signal = nsig::Signal::try_from(signum).ok()?;
    Signal::ALL.into_iter().find(|s| native(*s) == native_signal)
}

fn nix_pid(pid: Pid) -> io::Result<unistd::Pid> {
    // Values past i32::MAX would address process groups
    i32::try_from(pid)
        .ok()
        .filter(|p| *p > 0)
        .map(unistd::Pid::from_raw)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such process"))
}

fn no_such_process(err: Errno) -> io::Error {
    if err == Errno::ESRCH {
        io::Error::new(io::ErrorKind::NotFound, "no such process")
    } else {
        err.into()
    }
}

// =============================================================================
// PIPES
// =============================================================================

/// Create a pipe whose read end (`inherit_read`) or write end is inheritable.
/// The other end is explicitly marked close-on-exec. Returns `(read, write)`.
pub fn create_pipe(inherit_read: bool) -> io::Result<(OwnedFd, OwnedFd)> {
    let (read, write) = unistd::pipe()?;

    let (inherited, private) = if inherit_read {
        (&read, &write)
    } else {
        (&write, &read)
    };
    fcntl(inherited.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::empty()))?;
    fcntl(private.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;

    Ok((read, write))
}

/// Whether a child created after this point would inherit the descriptor
pub fn is_inheritable(fd: &OwnedFd) -> io::Result<bool> {
    let flags = FdFlag::from_bits_truncate(fcntl(fd.as_raw_fd(), FcntlArg::F_GETFD)?);
    Ok(!flags.contains(FdFlag::FD_CLOEXEC))
}

// =============================================================================
// PROCESSES
// =============================================================================

/// Apply the argument vector. Unix passes argv directly, so the serialized
/// command line is informational only.
pub fn configure_command(command: &mut Command, args: &[String]) {
    command.args(args);
}

/// Wait for the child up to `timeout` (`None` blocks). `Ok(None)` means still running.
pub fn wait_child(child: &mut Child, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };
    let Some(deadline) = Instant::now().checked_add(timeout) else {
        return child.wait().map(Some);
    };

    let mut pause = WAIT_POLL_INITIAL;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(pause.min(deadline - now));
        pause = (pause * 2).min(WAIT_POLL_MAX);
    }
}

/// Exit code of a finished child; signal deaths map to 128 + signal number
pub fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|s| SIGNALED_EXIT_BASE + s))
        .unwrap_or(-1)
}

/// Succeeds if the process exists. EPERM still proves existence.
pub fn probe_process(pid: Pid) -> io::Result<()> {
    match nsig::kill(nix_pid(pid)?, None) {
        Ok(()) | Err(Errno::EPERM) => Ok(()),
        Err(e) => Err(no_such_process(e)),
    }
}

/// Unconditionally terminate a foreign process
pub fn terminate_process(pid: Pid, _signal: Signal) -> io::Result<()> {
    nsig::kill(nix_pid(pid)?, nsig::Signal::SIGKILL).map_err(no_such_process)
}

// =============================================================================
// NATIVE SIGNALS
// =============================================================================

/// Deliver a signal to the calling process through the OS
pub fn raise(signal: Signal) -> io::Result<()> {
    nsig::raise(native(signal))?;
    Ok(())
}

extern "C" fn native_trampoline(signum: c_int) {
    if let Some(signal) = from_native(signum) {
        dispatch_native(signal);
    }
}

/// Install a disposition with the native signal facility.
///
/// SIGHUP belongs to the console bridge and is refused, as on Windows where it
/// has no native counterpart.
pub fn install_native(signal: Signal, disposition: NativeDisposition) -> io::Result<()> {
    if signal == Signal::SIGHUP {
        return Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "SIGHUP is reserved for the console control bridge",
        ));
    }
    let handler = match disposition {
        NativeDisposition::Default => SigHandler::SigDfl,
        NativeDisposition::Ignore => SigHandler::SigIgn,
        NativeDisposition::Trampoline => SigHandler::Handler(native_trampoline),
    };
    let action = SigAction::new(handler, SaFlags::SA_RESTART, SigSet::empty());

    // SAFETY: the trampoline only performs lock-free loads from the handler table
    // before calling the registered callback.
    unsafe { nsig::sigaction(native(signal), &action) }?;
    Ok(())
}

// =============================================================================
// NAMED INTERRUPT CHANNEL
// =============================================================================

fn channel_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(name)
}

/// Named auto-reset event backed by a FIFO.
///
/// The owner opens the FIFO read-write so it always has a writer and never sees
/// hang-up. Every byte written is one request; a wake drains all pending bytes,
/// so requests made before the owner looks collapse into one.
pub struct NamedEvent {
    file: File,
    path: PathBuf,
    /// Device and inode of the FIFO this instance created
    owned_node: Option<(u64, u64)>,
}

impl NamedEvent {
    /// Create the channel, replacing a stale FIFO left by a dead process with the same id
    pub fn create(name: &str) -> io::Result<Self> {
        let path = channel_path(name);
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed stale interrupt channel"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        unistd::mkfifo(&path, Mode::S_IRUSR | Mode::S_IWUSR)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(nix::libc::O_NONBLOCK)
            .open(&path);

        match file.and_then(|file| file.metadata().map(|meta| (file, meta))) {
            Ok((file, meta)) => Ok(Self {
                file,
                path,
                owned_node: Some((meta.dev(), meta.ino())),
            }),
            Err(e) => {
                let _ = fs::remove_file(&path);
                Err(e)
            }
        }
    }

    /// Open an existing channel for signaling
    pub fn open(name: &str) -> io::Result<Self> {
        let path = channel_path(name);
        let meta = fs::metadata(&path)?;
        if !meta.file_type().is_fifo() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "interrupt channel is not a fifo",
            ));
        }

        let file = OpenOptions::new()
            .write(true)
            .custom_flags(nix::libc::O_NONBLOCK)
            .open(&path)
            .map_err(|e| {
                // ENXIO: the fifo exists but nobody holds it open
                if e.raw_os_error() == Some(Errno::ENXIO as i32) {
                    io::Error::new(io::ErrorKind::NotFound, "interrupt channel has no owner")
                } else {
                    e
                }
            })?;

        Ok(Self {
            file,
            path,
            owned_node: None,
        })
    }

    /// Signal the channel
    pub fn set(&self) -> io::Result<()> {
        match (&self.file).write(&[1u8]) {
            Ok(_) => Ok(()),
            // A full pipe already holds a pending request
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Wait up to `timeout` for a request. Consumes every pending request.
    pub fn wait(&self, timeout: Duration) -> io::Result<bool> {
        let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
        let mut fds = [PollFd::new(self.file.as_fd(), PollFlags::POLLIN)];

        match poll(&mut fds, PollTimeout::from(millis)) {
            Ok(0) | Err(Errno::EINTR) => Ok(false),
            Ok(_) => Ok(self.drain()? > 0),
            Err(e) => Err(e.into()),
        }
    }

    fn drain(&self) -> io::Result<usize> {
        let mut buf = [0u8; 64];
        let mut total = 0;
        loop {
            match (&self.file).read(&mut buf) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }
}

impl Drop for NamedEvent {
    fn drop(&mut self) {
        let Some(node) = self.owned_node else {
            return;
        };
        // A newer subsystem may have replaced the path; only remove our own FIFO
        match fs::metadata(&self.path) {
            Ok(meta) if (meta.dev(), meta.ino()) == node => {
                if let Err(e) = fs::remove_file(&self.path) {
                    warn!(path = %self.path.display(), error = %e, "failed to remove interrupt channel");
                }
            }
            _ => {}
        }
    }
}

// =============================================================================
// CONSOLE CONTROL
// =============================================================================

static CONSOLE_FORWARDER: Mutex<bool> = parking_lot::const_mutex(false);

/// Install the console-control bridge.
///
/// A forwarding thread turns SIGINT into an interrupt event and SIGHUP into a
/// session-close event. It is installed once per process and stays inert while no
/// signal subsystem is active: the dispatcher then reports "not handled" and the
/// default action runs.
pub fn install_console_hook() -> io::Result<()> {
    use signal_hook::consts::{SIGHUP, SIGINT};
    use signal_hook::iterator::Signals;

    let mut installed = CONSOLE_FORWARDER.lock();
    if *installed {
        return Ok(());
    }

    let mut signals = Signals::new([SIGINT, SIGHUP])?;
    thread::Builder::new()
        .name("console-control".to_string())
        .spawn(move || {
            for signum in signals.forever() {
                let event = if signum == SIGINT {
                    ControlEvent::Interrupt
                } else {
                    ControlEvent::Close
                };
                if on_control_event(event) == ControlReply::NotHandled {
                    if let Err(e) = signal_hook::low_level::emulate_default_handler(signum) {
                        warn!(signal = signum, error = %e, "failed to run default signal action");
                    }
                }
            }
        })?;

    *installed = true;
    Ok(())
}

/// The forwarding thread outlives the subsystem; see `install_console_hook`
pub fn remove_console_hook() {}
