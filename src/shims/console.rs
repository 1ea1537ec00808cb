/*!
 * Console
 *
 * Input probe, console setup and single-character I/O. Windows enables VT
 * processing and the UTF-8 code page; elsewhere the terminal is left as is.
 */

use std::io::{self, Read, Write};

/// Whether stdin has data to read without blocking
#[cfg(unix)]
pub fn stdin_ready() -> bool {
    use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

    let stdin = io::stdin();
    let mut fds = [PollFd::new(
        std::os::fd::AsFd::as_fd(&stdin),
        PollFlags::POLLIN,
    )];
    matches!(poll(&mut fds, PollTimeout::ZERO), Ok(n) if n > 0)
}

/// Whether stdin has data to read without blocking. Consoles count only
/// key-down events carrying a character; pipes report buffered bytes; other
/// handles are always ready.
#[cfg(windows)]
pub fn stdin_ready() -> bool {
    use windows_sys::Win32::System::Console::{
        GetConsoleMode, GetNumberOfConsoleInputEvents, GetStdHandle, PeekConsoleInputW,
        INPUT_RECORD, KEY_EVENT, STD_INPUT_HANDLE,
    };
    use windows_sys::Win32::System::Pipes::PeekNamedPipe;

    // SAFETY: all out-pointers reference live locals or the records buffer
    unsafe {
        let handle = GetStdHandle(STD_INPUT_HANDLE);
        if handle.is_null() || handle == windows_sys::Win32::Foundation::INVALID_HANDLE_VALUE {
            return false;
        }

        let mut mode = 0u32;
        if GetConsoleMode(handle, &mut mode) == 0 {
            let mut available = 0u32;
            if PeekNamedPipe(
                handle,
                std::ptr::null_mut(),
                0,
                std::ptr::null_mut(),
                &mut available,
                std::ptr::null_mut(),
            ) != 0
            {
                return available > 0;
            }
            return true;
        }

        let mut pending = 0u32;
        if GetNumberOfConsoleInputEvents(handle, &mut pending) == 0 || pending == 0 {
            return false;
        }
        let mut records: Vec<INPUT_RECORD> = vec![std::mem::zeroed(); pending as usize];
        let mut read = 0u32;
        if PeekConsoleInputW(handle, records.as_mut_ptr(), pending, &mut read) == 0 {
            return false;
        }
        records[..read as usize].iter().any(|record| {
            u32::from(record.EventType) == KEY_EVENT
                && record.Event.KeyEvent.bKeyDown != 0
                && record.Event.KeyEvent.uChar.UnicodeChar != 0
        })
    }
}

#[cfg(windows)]
static SAVED_INPUT_MODE: parking_lot::Mutex<Option<u32>> = parking_lot::const_mutex(None);

/// Enable VT escape processing and switch both code pages to UTF-8
#[cfg(windows)]
pub fn console_init() -> io::Result<()> {
    use crate::core::limits::UTF8_CODE_PAGE;
    use windows_sys::Win32::System::Console::{
        GetConsoleMode, GetStdHandle, SetConsoleCP, SetConsoleMode, SetConsoleOutputCP,
        ENABLE_VIRTUAL_TERMINAL_PROCESSING, STD_INPUT_HANDLE, STD_OUTPUT_HANDLE,
    };

    // SAFETY: standard handles and live out-pointers
    unsafe {
        let input = GetStdHandle(STD_INPUT_HANDLE);
        let output = GetStdHandle(STD_OUTPUT_HANDLE);
        if input == windows_sys::Win32::Foundation::INVALID_HANDLE_VALUE
            || output == windows_sys::Win32::Foundation::INVALID_HANDLE_VALUE
        {
            return Err(io::Error::last_os_error());
        }

        let mut mode = 0u32;
        if GetConsoleMode(input, &mut mode) != 0 {
            *SAVED_INPUT_MODE.lock() = Some(mode);
        }

        let mut out_mode = 0u32;
        if GetConsoleMode(output, &mut out_mode) != 0 {
            SetConsoleMode(output, out_mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING);
        }

        SetConsoleCP(UTF8_CODE_PAGE);
        SetConsoleOutputCP(UTF8_CODE_PAGE);
    }
    Ok(())
}

/// Restore the input mode saved by `console_init`
#[cfg(windows)]
pub fn console_cleanup() {
    use windows_sys::Win32::System::Console::{GetStdHandle, SetConsoleMode, STD_INPUT_HANDLE};

    if let Some(mode) = SAVED_INPUT_MODE.lock().take() {
        // SAFETY: standard input handle with a mode it reported earlier
        unsafe { SetConsoleMode(GetStdHandle(STD_INPUT_HANDLE), mode) };
    }
}

#[cfg(unix)]
pub fn console_init() -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
pub fn console_cleanup() {}

fn utf8_width(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

/// Decode one character from a byte stream. `None` at end of input.
pub fn read_char_from<R: Read>(reader: &mut R) -> io::Result<Option<char>> {
    let mut buf = [0u8; 4];
    if reader.read(&mut buf[..1])? == 0 {
        return Ok(None);
    }

    let width = utf8_width(buf[0]);
    reader.read_exact(&mut buf[1..width])?;

    std::str::from_utf8(&buf[..width])
        .ok()
        .and_then(|s| s.chars().next())
        .map(Some)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "invalid UTF-8 input"))
}

/// Read one character from stdin, blocking. `None` at end of input.
pub fn read_char() -> io::Result<Option<char>> {
    read_char_from(&mut io::stdin().lock())
}

/// Write a string to stdout and flush it. Returns the number of characters.
pub fn write_str(s: &str) -> io::Result<usize> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(s.as_bytes())?;
    stdout.flush()?;
    Ok(s.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_char_utf8() {
        let mut input = Cursor::new("aé€😀".as_bytes().to_vec());
        assert_eq!(read_char_from(&mut input).unwrap(), Some('a'));
        assert_eq!(read_char_from(&mut input).unwrap(), Some('é'));
        assert_eq!(read_char_from(&mut input).unwrap(), Some('€'));
        assert_eq!(read_char_from(&mut input).unwrap(), Some('😀'));
        assert_eq!(read_char_from(&mut input).unwrap(), None);
    }

    #[test]
    fn test_read_char_invalid() {
        let mut input = Cursor::new(vec![0xFFu8]);
        assert_eq!(
            read_char_from(&mut input).unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
    }

    #[test]
    fn test_console_init_is_harmless() {
        // No console may be attached under a test runner
        let _ = console_init();
        console_cleanup();
    }
}
