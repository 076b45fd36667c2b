//! Keystore entry model.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use zeroize::Zeroizing;

use super::sealed::SealedKey;

/// The three entry types a JCEKS container can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKind {
    PrivateKey,
    TrustedCertificate,
    SecretKey,
}

impl EntryKind {
    pub(crate) const fn tag(self) -> u32 {
        match self {
            EntryKind::PrivateKey => 1,
            EntryKind::TrustedCertificate => 2,
            EntryKind::SecretKey => 3,
        }
    }

    /// Name used by `keytool -list`.
    pub const fn keytool_name(self) -> &'static str {
        match self {
            EntryKind::PrivateKey => "PrivateKeyEntry",
            EntryKind::TrustedCertificate => "trustedCertEntry",
            EntryKind::SecretKey => "SecretKeyEntry",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryKind::PrivateKey => "private key",
            EntryKind::TrustedCertificate => "trusted certificate",
            EntryKind::SecretKey => "secret key",
        })
    }
}

/// An encoded certificate, kept opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub cert_type: String,
    pub encoded: Vec<u8>,
}

/// Entry payload as stored in the container. Only secret keys are ever
/// decrypted; the other kinds round-trip untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryData {
    PrivateKey {
        /// DER `EncryptedPrivateKeyInfo`
        protected_key: Vec<u8>,
        chain: Vec<Certificate>,
    },
    TrustedCertificate(Certificate),
    SecretKey(SealedKey),
}

/// One container entry: creation date plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// Milliseconds since the Unix epoch.
    pub created_ms: i64,
    pub data: EntryData,
}

impl StoredEntry {
    /// A secret key entry dated now.
    pub fn secret_key(sealed: SealedKey) -> Self {
        Self {
            created_ms: now_millis(),
            data: EntryData::SecretKey(sealed),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self.data {
            EntryData::PrivateKey { .. } => EntryKind::PrivateKey,
            EntryData::TrustedCertificate(_) => EntryKind::TrustedCertificate,
            EntryData::SecretKey(_) => EntryKind::SecretKey,
        }
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Decrypted secret key material plus its algorithm name.
///
/// Passed opaquely from an unlock to a lock; the key bytes are wiped on drop
/// and never appear in `Debug` output.
pub struct SecretEntry {
    algorithm: String,
    encoded: Zeroizing<Vec<u8>>,
}

impl SecretEntry {
    pub fn new(algorithm: impl Into<String>, encoded: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm: algorithm.into(),
            encoded: Zeroizing::new(encoded.into()),
        }
    }

    /// Algorithm name, e.g. `AES`.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Raw key bytes (`Key.getEncoded()`).
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }
}

impl fmt::Debug for SecretEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretEntry")
            .field("algorithm", &self.algorithm)
            .field("encoded", &format_args!("[REDACTED; {} bytes]", self.encoded.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_entry_debug_is_redacted() {
        let entry = SecretEntry::new("AES", vec![0xde, 0xad, 0xbe, 0xef]);
        let debug = format!("{entry:?}");
        assert!(debug.contains("AES"));
        assert!(debug.contains("REDACTED; 4 bytes"));
        assert!(!debug.contains("222"));
        assert!(!debug.contains("173"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(EntryKind::SecretKey.to_string(), "secret key");
        assert_eq!(EntryKind::TrustedCertificate.keytool_name(), "trustedCertEntry");
        assert_eq!(EntryKind::PrivateKey.tag(), 1);
    }
}
