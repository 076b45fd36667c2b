//! Cryptographic primitives used by SunJCE keystores

pub mod integrity;
pub mod pbe;

use thiserror::Error;

/// Errors raised by the JCEKS primitives.
///
/// None of these carry secret material; they are safe to print.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// PBE keys only accept printable ASCII (0x20..=0x7E) passwords.
    ///
    /// **[USER ERROR]** The SunJCE provider rejects the same passwords, so an entry
    /// sealed by Java can never have such a password either.
    #[error("Password contains characters outside printable ASCII")]
    NonAsciiPassword,

    /// The PBE salt does not have the fixed 8-byte length.
    #[error("Invalid salt length: expected {expected}, got {actual}")]
    InvalidSaltLength { expected: usize, actual: usize },

    /// The iteration count is zero or above the accepted maximum.
    ///
    /// **[INTEGRITY VIOLATION]** Writers never produce such values; a huge count in a
    /// stored entry would otherwise turn unsealing into a denial of service.
    #[error("Iteration count {0} is out of range")]
    IterationCountOutOfRange(u32),

    /// Decryption produced invalid padding or a malformed block length.
    ///
    /// Wrong password and corrupted ciphertext are indistinguishable here.
    #[error("Decryption failed - incorrect password or corrupted data")]
    DecryptionFailed,

    /// The system random number generator failed.
    #[error("RNG failed to generate salt")]
    Rng,
}
