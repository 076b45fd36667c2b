//! JCEKS keystore container, byte-compatible with the SunJCE `JceKeyStore`.
//!
//! ```text
//! u32 magic (0xCECECECE; 0xFEEDFEED JKS accepted on load)
//! u32 version (2; 1 accepted on load)
//! u32 entry count
//! entries: u32 tag, UTF alias, i64 creation millis, payload
//! 20-byte SHA-1 over UTF-16BE(password) || "Mighty Aphrodite" || everything above
//! ```
//!
//! Private key and trusted certificate entries are carried opaquely. Secret key
//! entries stay sealed until [`KeyProtector::unseal`] is called with the entry
//! password.

pub mod codec;
pub mod der;
pub mod entry;
pub mod format;
pub mod sealed;
pub mod serial;

pub use entry::{Certificate, EntryData, EntryKind, SecretEntry, StoredEntry};
pub use format::ContainerFormat;
pub use sealed::{KeyProtectionError, KeyProtector, SealedKey};

use thiserror::Error;
use tracing::instrument;

use codec::CodecError;
use serial::SerialError;

/// Errors loading or encoding a keystore container.
#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid keystore format: unrecognised magic number {0:#010x}")]
    InvalidMagic(u32),

    #[error("Unsupported keystore version {0}")]
    UnsupportedVersion(u32),

    #[error("Malformed keystore data: {0}")]
    Malformed(#[from] CodecError),

    #[error("Unknown entry tag {tag} for alias '{alias}'")]
    UnknownEntryTag { tag: u32, alias: String },

    #[error("Malformed secret key entry '{alias}'")]
    SealedKey {
        alias: String,
        #[source]
        source: SerialError,
    },

    #[error("Too many items to encode: {0}")]
    TooManyEntries(usize),

    /// **[USER ERROR or INTEGRITY VIOLATION]** The keyed digest does not match:
    /// either the master password is wrong or the file was modified.
    #[error("Keystore was tampered with, or password was incorrect")]
    IntegrityCheckFailed,
}

/// Aliases are case-insensitive; they are stored lower-cased.
pub fn normalize_alias(alias: &str) -> String {
    alias.to_lowercase()
}

/// An in-memory keystore. Entries keep their load order so an unchanged
/// container re-encodes to the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keystore {
    entries: Vec<(String, StoredEntry)>,
    format: ContainerFormat,
}

impl Keystore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a container and verify its digest against `password`.
    #[instrument(level = "debug", skip_all, fields(len = bytes.len()))]
    pub fn load(bytes: &[u8], password: &str) -> Result<Self, KeystoreError> {
        format::decode(bytes, password)
    }

    /// Encode as a JCEKS container sealed with `password`.
    pub fn to_bytes(&self, password: &str) -> Result<Vec<u8>, KeystoreError> {
        format::encode(self, password)
    }

    pub fn source_format(&self) -> ContainerFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, alias: &str) -> Option<&StoredEntry> {
        let alias = normalize_alias(alias);
        self.entries
            .iter()
            .find(|(existing, _)| *existing == alias)
            .map(|(_, entry)| entry)
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.get(alias).is_some()
    }

    /// Insert under the lower-cased alias, replacing any existing entry in place.
    /// Returns the replaced entry.
    pub fn insert(&mut self, alias: &str, entry: StoredEntry) -> Option<StoredEntry> {
        let alias = normalize_alias(alias);
        match self.entries.iter_mut().find(|(existing, _)| *existing == alias) {
            Some((_, slot)) => Some(std::mem::replace(slot, entry)),
            None => {
                self.entries.push((alias, entry));
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoredEntry)> {
        self.entries
            .iter()
            .map(|(alias, entry)| (alias.as_str(), entry))
    }
}
