/*!
 * Windows Backend
 *
 * Thin wrappers over the Win32 primitives: kernel event objects for the named
 * channel, anonymous pipes with per-end inheritance, process handles and the
 * console control handler. CRT `signal`/`raise` carry pass-through signals.
 */

use super::NativeDisposition;
use crate::core::types::{timeout_millis, Pid};
use crate::process::cmdline::serialize_args;
use crate::signals::console::{on_control_event, ControlEvent, ControlReply};
use crate::signals::registry::dispatch_native;
use crate::signals::Signal;
use std::ffi::c_int;
use std::io;
use std::iter;
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle, RawHandle};
use std::os::windows::process::CommandExt;
use std::process::{Child, Command, ExitStatus};
use std::ptr;
use std::time::Duration;
use windows_sys::Win32::Foundation::{
    GetHandleInformation, SetHandleInformation, BOOL, FALSE, HANDLE, HANDLE_FLAG_INHERIT, TRUE,
    WAIT_OBJECT_0, WAIT_TIMEOUT,
};
use windows_sys::Win32::Security::SECURITY_ATTRIBUTES;
use windows_sys::Win32::System::Console::{
    SetConsoleCtrlHandler, CTRL_BREAK_EVENT, CTRL_CLOSE_EVENT, CTRL_C_EVENT, CTRL_LOGOFF_EVENT,
    CTRL_SHUTDOWN_EVENT,
};
use windows_sys::Win32::System::Pipes::CreatePipe;
use windows_sys::Win32::System::Threading::{
    CreateEventW, OpenEventW, OpenProcess, SetEvent, TerminateProcess, WaitForSingleObject,
    CREATE_NO_WINDOW, EVENT_MODIFY_STATE, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_TERMINATE,
};

/// Native descriptor type handed across the pipe layer
pub type OwnedDescriptor = OwnedHandle;

fn owned(handle: HANDLE) -> io::Result<OwnedHandle> {
    if handle.is_null() {
        Err(io::Error::last_os_error())
    } else {
        // SAFETY: non-null handle freshly returned by a Win32 constructor
        Ok(unsafe { OwnedHandle::from_raw_handle(handle as RawHandle) })
    }
}

fn check(result: BOOL) -> io::Result<()> {
    if result == 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn wide(name: &str) -> Vec<u16> {
    name.encode_utf16().chain(iter::once(0)).collect()
}

fn wait_handle(handle: RawHandle, timeout: Option<Duration>) -> io::Result<bool> {
    // SAFETY: caller guarantees the handle is open for the duration of the call
    match unsafe { WaitForSingleObject(handle as HANDLE, timeout_millis(timeout)) } {
        WAIT_OBJECT_0 => Ok(true),
        WAIT_TIMEOUT => Ok(false),
        _ => Err(io::Error::last_os_error()),
    }
}

// =============================================================================
// PIPES
// =============================================================================

/// Create a pipe whose read end (`inherit_read`) or write end is inheritable.
/// The other end is explicitly marked non-inheritable. Returns `(read, write)`.
pub fn create_pipe(inherit_read: bool) -> io::Result<(OwnedHandle, OwnedHandle)> {
    let attributes = SECURITY_ATTRIBUTES {
        nLength: std::mem::size_of::<SECURITY_ATTRIBUTES>() as u32,
        lpSecurityDescriptor: ptr::null_mut(),
        bInheritHandle: TRUE,
    };
    let mut read: HANDLE = ptr::null_mut();
    let mut write: HANDLE = ptr::null_mut();

    // SAFETY: out-pointers reference live locals
    check(unsafe { CreatePipe(&mut read, &mut write, &attributes, 0) })?;
    let (read, write) = (owned(read)?, owned(write)?);

    let private = if inherit_read { &write } else { &read };
    // SAFETY: handle owned above
    check(unsafe { SetHandleInformation(private.as_raw_handle() as HANDLE, HANDLE_FLAG_INHERIT, 0) })?;

    Ok((read, write))
}

/// Whether a child created after this point would inherit the handle
pub fn is_inheritable(handle: &OwnedHandle) -> io::Result<bool> {
    let mut flags = 0u32;
    // SAFETY: handle is open; flags is a live local
    check(unsafe { GetHandleInformation(handle.as_raw_handle() as HANDLE, &mut flags) })?;
    Ok(flags & HANDLE_FLAG_INHERIT != 0)
}

// =============================================================================
// PROCESSES
// =============================================================================

/// Hide the child's console window and pass the arguments as one serialized
/// command line tail
pub fn configure_command(command: &mut Command, args: &[String]) {
    command.creation_flags(CREATE_NO_WINDOW);
    if !args.is_empty() {
        command.raw_arg(serialize_args(args));
    }
}

/// Wait for the child up to `timeout` (`None` blocks). `Ok(None)` means still running.
pub fn wait_child(child: &mut Child, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
    if wait_handle(child.as_raw_handle(), timeout)? {
        child.try_wait()
    } else {
        Ok(None)
    }
}

pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Succeeds if the process can be opened for a query
pub fn probe_process(pid: Pid) -> io::Result<()> {
    // SAFETY: plain handle-returning call
    let handle = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, FALSE, pid) };
    owned(handle)
        .map(drop)
        .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "no such process"))
}

/// Terminate a foreign process; its exit code becomes the signal number
pub fn terminate_process(pid: Pid, signal: Signal) -> io::Result<()> {
    // SAFETY: plain handle-returning call
    let handle = owned(unsafe { OpenProcess(PROCESS_TERMINATE, FALSE, pid) })
        .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "no such process"))?;

    // SAFETY: handle owned above and opened with terminate rights
    check(unsafe { TerminateProcess(handle.as_raw_handle() as HANDLE, signal.number() as u32) })
        .map_err(|_| io::Error::new(io::ErrorKind::PermissionDenied, "termination refused"))
}

// =============================================================================
// NATIVE SIGNALS
// =============================================================================

fn crt_number(signal: Signal) -> Option<c_int> {
    match signal {
        Signal::SIGINT => Some(libc::SIGINT),
        Signal::SIGILL => Some(libc::SIGILL),
        Signal::SIGFPE => Some(libc::SIGFPE),
        Signal::SIGSEGV => Some(libc::SIGSEGV),
        Signal::SIGTERM => Some(libc::SIGTERM),
        Signal::SIGABRT => Some(libc::SIGABRT),
        _ => None,
    }
}

fn unsupported(signal: Signal) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{signal} has no native counterpart"),
    )
}

/// Deliver a signal to the calling process through the CRT
pub fn raise(signal: Signal) -> io::Result<()> {
    let number = crt_number(signal).ok_or_else(|| unsupported(signal))?;
    // SAFETY: number is a CRT-recognized signal
    if unsafe { libc::raise(number) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

extern "C" fn native_trampoline(signum: c_int) {
    // The CRT resets the disposition before delivery
    // SAFETY: re-installing the same handler for the signal being delivered
    unsafe { libc::signal(signum, native_trampoline as libc::sighandler_t) };
    if let Some(signal) = Signal::ALL
        .into_iter()
        .find(|s| crt_number(*s) == Some(signum))
    {
        dispatch_native(signal);
    }
}

/// Install a disposition with the CRT signal facility
pub fn install_native(signal: Signal, disposition: NativeDisposition) -> io::Result<()> {
    let number = crt_number(signal).ok_or_else(|| unsupported(signal))?;
    let handler = match disposition {
        NativeDisposition::Default => libc::SIG_DFL,
        NativeDisposition::Ignore => libc::SIG_IGN,
        NativeDisposition::Trampoline => native_trampoline as libc::sighandler_t,
    };

    // SAFETY: number is a CRT-recognized signal and handler has the CRT signature
    if unsafe { libc::signal(number, handler) } == libc::SIG_ERR {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("CRT rejected disposition for {signal}"),
        ));
    }
    Ok(())
}

// =============================================================================
// NAMED INTERRUPT CHANNEL
// =============================================================================

/// Named auto-reset kernel event
pub struct NamedEvent {
    handle: OwnedHandle,
}

impl NamedEvent {
    pub fn create(name: &str) -> io::Result<Self> {
        let name = wide(name);
        // SAFETY: name is NUL-terminated and outlives the call
        let handle = unsafe { CreateEventW(ptr::null(), FALSE, FALSE, name.as_ptr()) };
        Ok(Self {
            handle: owned(handle)?,
        })
    }

    /// Open an existing event with permission to signal it
    pub fn open(name: &str) -> io::Result<Self> {
        let name = wide(name);
        // SAFETY: name is NUL-terminated and outlives the call
        let handle = unsafe { OpenEventW(EVENT_MODIFY_STATE, FALSE, name.as_ptr()) };
        Ok(Self {
            handle: owned(handle)?,
        })
    }

    pub fn set(&self) -> io::Result<()> {
        // SAFETY: handle is owned by self
        check(unsafe { SetEvent(self.handle.as_raw_handle() as HANDLE) })
    }

    /// Wait up to `timeout`; an observed event resets itself
    pub fn wait(&self, timeout: Duration) -> io::Result<bool> {
        wait_handle(self.handle.as_raw_handle(), Some(timeout))
    }
}

// =============================================================================
// CONSOLE CONTROL
// =============================================================================

unsafe extern "system" fn console_ctrl_handler(ctrl_type: u32) -> BOOL {
    let event = match ctrl_type {
        CTRL_C_EVENT => ControlEvent::Interrupt,
        CTRL_BREAK_EVENT => ControlEvent::Break,
        CTRL_CLOSE_EVENT => ControlEvent::Close,
        CTRL_LOGOFF_EVENT => ControlEvent::Logoff,
        CTRL_SHUTDOWN_EVENT => ControlEvent::Shutdown,
        _ => return FALSE,
    };
    match on_control_event(event) {
        ControlReply::Handled => TRUE,
        ControlReply::NotHandled => FALSE,
    }
}

pub fn install_console_hook() -> io::Result<()> {
    // SAFETY: handler has the PHANDLER_ROUTINE signature
    check(unsafe { SetConsoleCtrlHandler(Some(console_ctrl_handler), TRUE) })
}

pub fn remove_console_hook() {
    // SAFETY: removing a handler previously added by install_console_hook
    unsafe { SetConsoleCtrlHandler(Some(console_ctrl_handler), FALSE) };
}
