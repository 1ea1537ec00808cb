/*!
 * Identity
 * User and group ids, user name, home directory and password entries
 */

use std::path::PathBuf;

/// Password database entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passwd {
    pub name: String,
    pub dir: PathBuf,
    pub shell: PathBuf,
    pub uid: u32,
    pub gid: u32,
}

#[cfg(unix)]
pub fn getuid() -> u32 {
    nix::unistd::getuid().as_raw()
}

#[cfg(unix)]
pub fn getgid() -> u32 {
    nix::unistd::getgid().as_raw()
}

#[cfg(unix)]
pub fn geteuid() -> u32 {
    nix::unistd::geteuid().as_raw()
}

#[cfg(unix)]
pub fn getegid() -> u32 {
    nix::unistd::getegid().as_raw()
}

/// No POSIX ids exist; everyone is root
#[cfg(windows)]
pub fn getuid() -> u32 {
    0
}

#[cfg(windows)]
pub fn getgid() -> u32 {
    0
}

#[cfg(windows)]
pub fn geteuid() -> u32 {
    0
}

#[cfg(windows)]
pub fn getegid() -> u32 {
    0
}

/// Login name of the current user, `"unknown"` when it cannot be determined
pub fn username() -> String {
    native_username()
        .or_else(|| {
            ["USER", "USERNAME", "LOGNAME"]
                .iter()
                .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(unix)]
fn native_username() -> Option<String> {
    nix::unistd::User::from_uid(nix::unistd::getuid())
        .ok()
        .flatten()
        .map(|user| user.name)
}

#[cfg(windows)]
fn native_username() -> Option<String> {
    use windows_sys::Win32::System::WindowsProgramming::GetUserNameW;

    let mut buf = [0u16; 257];
    let mut len = buf.len() as u32;
    // SAFETY: buf holds len UTF-16 units and len is updated in place
    if unsafe { GetUserNameW(buf.as_mut_ptr(), &mut len) } == 0 || len == 0 {
        return None;
    }
    // len counts the terminator
    let name = String::from_utf16_lossy(&buf[..len as usize - 1]);
    (!name.is_empty()).then_some(name)
}

#[cfg(unix)]
impl From<nix::unistd::User> for Passwd {
    fn from(user: nix::unistd::User) -> Self {
        Self {
            name: user.name,
            dir: user.dir,
            shell: user.shell,
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
        }
    }
}

/// Look up a user by name
#[cfg(unix)]
pub fn getpwnam(name: &str) -> Option<Passwd> {
    nix::unistd::User::from_name(name)
        .ok()
        .flatten()
        .map(Passwd::from)
}

/// Look up a user by id
#[cfg(unix)]
pub fn getpwuid(uid: u32) -> Option<Passwd> {
    nix::unistd::User::from_uid(nix::unistd::Uid::from_raw(uid))
        .ok()
        .flatten()
        .map(Passwd::from)
}

/// Every name resolves to a root entry homed at the current user's profile
#[cfg(windows)]
pub fn getpwnam(name: &str) -> Option<Passwd> {
    Some(Passwd {
        name: name.to_string(),
        dir: home_dir(),
        shell: PathBuf::from("cmd.exe"),
        uid: 0,
        gid: 0,
    })
}

/// Ids are meaningless here; always the current user's entry
#[cfg(windows)]
pub fn getpwuid(_uid: u32) -> Option<Passwd> {
    getpwnam(&username())
}

/// Home directory of the current user
pub fn home_dir() -> PathBuf {
    home_dir_from(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
}

#[cfg(windows)]
fn home_dir_from<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(profile) = lookup("USERPROFILE") {
        return PathBuf::from(profile);
    }
    match (lookup("HOMEDRIVE"), lookup("HOMEPATH")) {
        (Some(drive), Some(path)) => PathBuf::from(format!("{drive}{path}")),
        _ => PathBuf::from(r"C:\Users\Default"),
    }
}

#[cfg(unix)]
fn home_dir_from<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(home) = lookup("HOME") {
        return PathBuf::from(home);
    }
    nix::unistd::User::from_uid(nix::unistd::getuid())
        .ok()
        .flatten()
        .map(|user| user.dir)
        .unwrap_or_else(|| PathBuf::from("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_not_empty() {
        assert!(!username().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_password_entries() {
        assert_eq!(geteuid(), nix::unistd::geteuid().as_raw());
        assert_eq!(getegid(), nix::unistd::getegid().as_raw());
        assert_eq!(getpwnam("posix-compat-no-such-user"), None);

        if let Some(entry) = getpwuid(getuid()) {
            assert_eq!(entry.uid, getuid());
            assert_eq!(entry.name, username());
            assert_eq!(getpwnam(&entry.name), Some(entry));
        }
    }

    #[cfg(windows)]
    #[test]
    fn test_password_entries() {
        assert_eq!((geteuid(), getegid()), (0, 0));
        let entry = getpwnam("alice").unwrap();
        assert_eq!(entry.name, "alice");
        assert_eq!(entry.shell, PathBuf::from("cmd.exe"));
        assert_eq!((entry.uid, entry.gid), (0, 0));
        assert_eq!(getpwuid(42).unwrap().name, username());
    }

    #[cfg(unix)]
    #[test]
    fn test_home_prefers_env() {
        assert_eq!(
            home_dir_from(|k| (k == "HOME").then(|| "/home/host".to_string())),
            PathBuf::from("/home/host")
        );
        assert!(home_dir_from(|_| None).is_absolute());
    }

    #[cfg(windows)]
    #[test]
    fn test_home_fallback_chain() {
        assert_eq!(
            home_dir_from(|k| match k {
                "HOMEDRIVE" => Some("D:".to_string()),
                "HOMEPATH" => Some(r"\me".to_string()),
                _ => None,
            }),
            PathBuf::from(r"D:\me")
        );
        assert_eq!(home_dir_from(|_| None), PathBuf::from(r"C:\Users\Default"));
    }
}
