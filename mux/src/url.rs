//! Open, create, or append to a redirection target.
//!
//! Targets are treated as opaque references: a plain path or a `file://`
//! URL. Errors propagate verbatim to the caller, which reports them under
//! the redirected command's name.

use std::fs::{File, OpenOptions};
use std::io;

fn path_of(reference: &str) -> &str {
    reference.strip_prefix("file://").unwrap_or(reference)
}

/// Open a source for reading.
pub fn open(reference: &str) -> io::Result<File> {
    File::open(path_of(reference))
}

/// Create a sink, truncating any existing content.
pub fn create(reference: &str) -> io::Result<File> {
    File::create(path_of(reference))
}

/// Open a sink for appending, creating it if missing.
pub fn append(reference: &str) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path_of(reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn create_then_append_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log");
        let reference = path.to_str().unwrap().to_string();

        create(&reference).unwrap().write_all(b"one\n").unwrap();
        append(&reference).unwrap().write_all(b"two\n").unwrap();

        let mut s = String::new();
        open(&reference).unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "one\ntwo\n");

        // create truncates
        create(&reference).unwrap().write_all(b"three\n").unwrap();
        let mut s = String::new();
        open(&reference).unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "three\n");
    }

    #[test]
    fn file_scheme_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x");
        let reference = format!("file://{}", path.display());
        create(&reference).unwrap().write_all(b"ok").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn missing_source_is_an_error() {
        assert!(open("/definitely/not/here").is_err());
    }
}
