//! Password resolution: a literal value, or the first line of a file.

use std::fs;
use std::io;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use crate::report::Reporter;

/// A master or entry password. Redacted in `Debug`, wiped on drop.
#[derive(Debug)]
pub struct Password(SecretString);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Errors reading a password file.
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to read password file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Password file '{}' is not valid UTF-8", path.display())]
    NotUtf8 { path: PathBuf },

    /// **[USER ERROR]** A zero-byte file has no first line to use.
    #[error("Password file '{}' is empty", path.display())]
    Empty { path: PathBuf },
}

/// Where a password comes from.
#[derive(Debug)]
pub enum PasswordSource {
    Literal(Password),
    File(PathBuf),
}

impl PasswordSource {
    /// Pick a source from an optional literal and an optional file path.
    /// The literal wins when both are present.
    pub fn from_options(literal: Option<String>, file: Option<PathBuf>) -> Option<Self> {
        match (literal, file) {
            (Some(value), _) => Some(Self::Literal(Password::new(value))),
            (None, Some(path)) => Some(Self::File(path)),
            (None, None) => None,
        }
    }

    /// Produce the password. For files this is the first line, without its
    /// terminator (`\n`, `\r\n` or `\r`).
    #[instrument(level = "debug", name = "password::resolve", skip_all)]
    pub fn resolve(self, reporter: &mut dyn Reporter) -> Result<Password, PasswordError> {
        let path = match self {
            Self::Literal(password) => return Ok(password),
            Self::File(path) => path,
        };

        reporter.step(&format!("reading the '{}' file...", path.display()));
        let bytes = match fs::read(&path) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(source) => return Err(PasswordError::Read { path, source }),
        };
        if bytes.is_empty() {
            return Err(PasswordError::Empty { path });
        }
        let Ok(text) = std::str::from_utf8(&bytes) else {
            return Err(PasswordError::NotUtf8 { path });
        };

        let line = text.split(['\n', '\r']).next().unwrap_or_default();
        debug!(path = %path.display(), "Password read from file");
        Ok(Password::new(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SilentReporter;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    fn resolve_file(contents: &[u8]) -> Result<Password, PasswordError> {
        let dir = TempDir::new().unwrap();
        let file = dir.child("password.txt");
        file.write_binary(contents).unwrap();
        PasswordSource::File(file.to_path_buf()).resolve(&mut SilentReporter)
    }

    #[test]
    fn test_literal_is_returned_as_is() {
        let password = PasswordSource::Literal(" spaced \n".into())
            .resolve(&mut SilentReporter)
            .unwrap();
        assert_eq!(password.expose(), " spaced \n");
    }

    #[test]
    fn test_first_line_of_file() {
        assert_eq!(resolve_file(b"epass").unwrap().expose(), "epass");
        assert_eq!(resolve_file(b"epass\nsecond\n").unwrap().expose(), "epass");
        assert_eq!(resolve_file(b"epass\r\nsecond").unwrap().expose(), "epass");
        assert_eq!(resolve_file(b"epass\rsecond").unwrap().expose(), "epass");
        assert_eq!(resolve_file("jelszó\n".as_bytes()).unwrap().expose(), "jelszó");
    }

    #[test]
    fn test_surrounding_whitespace_is_kept() {
        assert_eq!(resolve_file(b"  pw \t\n").unwrap().expose(), "  pw \t");
    }

    #[test]
    fn test_empty_first_line_is_an_empty_password() {
        assert_eq!(resolve_file(b"\nsecond").unwrap().expose(), "");
    }

    #[test]
    fn test_zero_byte_file_is_an_error() {
        assert!(matches!(resolve_file(b""), Err(PasswordError::Empty { .. })));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            resolve_file(&[0xff, 0xfe, b'\n']),
            Err(PasswordError::NotUtf8 { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.txt");
        let err = PasswordSource::File(missing.clone())
            .resolve(&mut SilentReporter)
            .unwrap_err();
        assert!(matches!(&err, PasswordError::Read { path, .. } if *path == missing));
        assert!(err.to_string().contains("nope.txt"));
    }

    #[test]
    fn test_from_options_precedence() {
        assert!(matches!(
            PasswordSource::from_options(Some("lit".into()), Some("f.txt".into())),
            Some(PasswordSource::Literal(p)) if p.expose() == "lit"
        ));
        assert!(matches!(
            PasswordSource::from_options(None, Some("f.txt".into())),
            Some(PasswordSource::File(path)) if path == PathBuf::from("f.txt")
        ));
        assert!(PasswordSource::from_options(None, None).is_none());
    }

    #[test]
    fn test_debug_is_redacted() {
        let debug = format!("{:?}", Password::new("hunter2"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_reports_file_read() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("pw");
        file.write_str("x\n").unwrap();

        let mut reporter = crate::report::StreamReporter::new(Vec::new());
        PasswordSource::File(file.to_path_buf())
            .resolve(&mut reporter)
            .unwrap();
        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(output.starts_with("-> reading the '"));
        assert!(output.trim_end().ends_with("pw' file..."));
    }
}
