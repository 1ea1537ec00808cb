/*!
 * Inheritable Pipes
 *
 * Unidirectional pipes where exactly one end may be inherited by a child. The
 * other end is explicitly private so a child spawned concurrently on another
 * thread never picks up the parent's side.
 */

use crate::sys::{self, OwnedDescriptor};
use std::io;

/// Which end the child receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildEnd {
    /// Child reads (its stdin); the parent keeps the write end
    Read,
    /// Child writes (its stdout or stderr); the parent keeps the read end
    Write,
}

/// A pipe split into the child's inheritable end and the parent's private end
#[derive(Debug)]
pub struct InheritablePipe {
    pub child: OwnedDescriptor,
    pub parent: OwnedDescriptor,
}

impl InheritablePipe {
    pub fn new(child_end: ChildEnd) -> io::Result<Self> {
        let inherit_read = child_end == ChildEnd::Read;
        let (read, write) = sys::create_pipe(inherit_read)?;
        Ok(if inherit_read {
            Self {
                child: read,
                parent: write,
            }
        } else {
            Self {
                child: write,
                parent: read,
            }
        })
    }
}

/// Create a pipe with only the read end (`inherit_read`) or only the write end
/// inheritable. Returns `(read, write)`.
pub fn create_inheritable_pipe(inherit_read: bool) -> io::Result<(OwnedDescriptor, OwnedDescriptor)> {
    sys::create_pipe(inherit_read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{Read, Write};

    #[test]
    fn test_exactly_one_end_inheritable() {
        for inherit_read in [true, false] {
            let (read, write) = create_inheritable_pipe(inherit_read).unwrap();
            assert_eq!(sys::is_inheritable(&read).unwrap(), inherit_read);
            assert_eq!(sys::is_inheritable(&write).unwrap(), !inherit_read);
        }
    }

    #[test]
    fn test_orientation() {
        let pipe = InheritablePipe::new(ChildEnd::Read).unwrap();
        assert!(sys::is_inheritable(&pipe.child).unwrap());
        assert!(!sys::is_inheritable(&pipe.parent).unwrap());

        // Parent writes, child end reads
        let mut parent = File::from(pipe.parent);
        let mut child = File::from(pipe.child);
        parent.write_all(b"ping").unwrap();
        drop(parent);

        let mut buf = String::new();
        child.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "ping");
    }
}
