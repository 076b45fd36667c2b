//! PBEWithMD5AndTripleDES, the SunJCE flavour.
//!
//! This is not the PKCS#5 PBES1 scheme of the same name: SunJCE derives a full
//! 24-byte DES-EDE3 key plus an 8-byte IV by running MD5 separately over each half
//! of the salt. The derivation, for salt halves `s0 || s1`:
//!
//! ```text
//! if s0 == s1 { reverse(s0) }
//! for half in [s0, s1]:
//!     t = half
//!     repeat iteration_count times: t = MD5(t || password)
//! derived = t(s0) || t(s1)            // 32 bytes
//! key = derived[0..24], iv = derived[24..32]
//! ```
//!
//! followed by DES-EDE3 in CBC mode with PKCS#5 padding.

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::{Zeroize, Zeroizing};

use super::CryptoError;

type TdesCbcEnc = cbc::Encryptor<des::TdesEde3>;
type TdesCbcDec = cbc::Decryptor<des::TdesEde3>;

/// Standard algorithm name, as stored in sealed keys.
pub const ALGORITHM: &str = "PBEWithMD5AndTripleDES";

/// Salt length required by the SunJCE PBES1 implementation.
pub const SALT_LEN: usize = 8;

/// Iteration count used when sealing (SunJCE default since JDK 8u301 / 11.0.12).
pub const DEFAULT_ITERATION_COUNT: u32 = 200_000;

/// Largest iteration count accepted when unsealing (SunJCE `MAX_ITERATION_COUNT`).
pub const MAX_ITERATION_COUNT: u32 = 5_000_000;

const DES_BLOCK_LEN: usize = 8;
const TDES_KEY_LEN: usize = 24;

/// Salt and iteration count of one PBE operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PbeParameters {
    pub salt: [u8; SALT_LEN],
    pub iteration_count: u32,
}

impl PbeParameters {
    pub fn new(salt: [u8; SALT_LEN], iteration_count: u32) -> Self {
        Self {
            salt,
            iteration_count,
        }
    }

    /// Fresh parameters with a random salt from the system RNG.
    pub fn generate(iteration_count: u32) -> Result<Self, CryptoError> {
        let mut salt = [0u8; SALT_LEN];
        SystemRandom::new()
            .fill(&mut salt)
            .map_err(|_| CryptoError::Rng)?;
        Ok(Self::new(salt, iteration_count))
    }

    fn check_iteration_count(&self) -> Result<(), CryptoError> {
        if self.iteration_count == 0 || self.iteration_count > MAX_ITERATION_COUNT {
            return Err(CryptoError::IterationCountOutOfRange(self.iteration_count));
        }
        Ok(())
    }
}

/// Password bytes for PBE, wiped on drop.
pub struct PbeKey(Zeroizing<Vec<u8>>);

impl PbeKey {
    /// Accepts only printable ASCII, matching `com.sun.crypto.provider.PBEKey`.
    pub fn new(password: &str) -> Result<Self, CryptoError> {
        if !password.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
            return Err(CryptoError::NonAsciiPassword);
        }
        Ok(Self(Zeroizing::new(password.as_bytes().to_vec())))
    }
}

impl std::fmt::Debug for PbeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PbeKey([REDACTED])")
    }
}

/// DES-EDE3 key and CBC IV derived from a password.
struct DerivedKey {
    material: Zeroizing<[u8; TDES_KEY_LEN + DES_BLOCK_LEN]>,
}

impl DerivedKey {
    fn key(&self) -> &[u8] {
        &self.material[..TDES_KEY_LEN]
    }

    fn iv(&self) -> &[u8] {
        &self.material[TDES_KEY_LEN..]
    }
}

fn derive(key: &PbeKey, params: &PbeParameters) -> Result<DerivedKey, CryptoError> {
    params.check_iteration_count()?;

    let mut salt = params.salt;
    if salt[..4] == salt[4..] {
        salt[..4].reverse();
    }

    let password = &key.0[..];
    let mut material = Zeroizing::new([0u8; TDES_KEY_LEN + DES_BLOCK_LEN]);
    let mut buf = Zeroizing::new(Vec::with_capacity(16 + password.len()));

    for (half, out) in salt.chunks_exact(4).zip(material.chunks_exact_mut(16)) {
        buf.clear();
        buf.extend_from_slice(half);
        buf.extend_from_slice(password);
        let mut digest = md5::compute(&buf[..]).0;

        for _ in 1..params.iteration_count {
            buf.clear();
            buf.extend_from_slice(&digest);
            buf.extend_from_slice(password);
            digest = md5::compute(&buf[..]).0;
        }

        out.copy_from_slice(&digest);
        digest.zeroize();
    }

    Ok(DerivedKey { material })
}

/// Encrypt `plaintext` under the password-derived key.
pub fn encrypt(
    key: &PbeKey,
    params: &PbeParameters,
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let derived = derive(key, params)?;
    let cipher = TdesCbcEnc::new_from_slices(derived.key(), derived.iv())
        .map_err(|_| CryptoError::DecryptionFailed)?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt `ciphertext`, failing closed on any padding error.
pub fn decrypt(
    key: &PbeKey,
    params: &PbeParameters,
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if ciphertext.is_empty() || ciphertext.len() % DES_BLOCK_LEN != 0 {
        return Err(CryptoError::DecryptionFailed);
    }

    let derived = derive(key, params)?;
    let cipher = TdesCbcDec::new_from_slices(derived.key(), derived.iv())
        .map_err(|_| CryptoError::DecryptionFailed)?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // Vectors produced by `Cipher.getInstance("PBEWithMD5AndTripleDES")` on JDK 17,
    // password "secret", 3 iterations, plaintext "hello".

    #[test]
    fn test_derivation_matches_sunjce() {
        let key = PbeKey::new("secret").unwrap();
        let params = PbeParameters::new(hex!("0102030405060708"), 1);
        let derived = derive(&key, &params).unwrap();

        let expected = hex!("3824f5c8bc2df87a08a13d6340147e651c5687b7de7c648ac442513f5c6f1361");
        assert_eq!(derived.key(), &expected[..24]);
        assert_eq!(derived.iv(), &expected[24..]);
    }

    #[test]
    fn test_encrypt_matches_sunjce() {
        let key = PbeKey::new("secret").unwrap();
        let params = PbeParameters::new(hex!("0102030405060708"), 3);
        let ciphertext = encrypt(&key, &params, b"hello").unwrap();
        assert_eq!(ciphertext, hex!("966d43869182a4ff"));
    }

    #[test]
    fn test_identical_salt_halves_are_disambiguated() {
        let key = PbeKey::new("secret").unwrap();

        let same_halves = PbeParameters::new(hex!("0a0b0c0d0a0b0c0d"), 3);
        assert_eq!(
            encrypt(&key, &same_halves, b"hello").unwrap(),
            hex!("dc1904896544332a")
        );

        // Only a full 4-byte match triggers the reversal
        let differing_halves = PbeParameters::new(hex!("0a0b0c0d0a0b0c0e"), 3);
        assert_eq!(
            encrypt(&key, &differing_halves, b"hello").unwrap(),
            hex!("3eaf5d1acf2072bf")
        );
    }

    #[test]
    fn test_roundtrip_and_wrong_password() {
        let params = PbeParameters::generate(10).unwrap();
        let key = PbeKey::new("correct horse").unwrap();
        let ciphertext = encrypt(&key, &params, b"payload bytes").unwrap();

        let plaintext = decrypt(&key, &params, &ciphertext).unwrap();
        assert_eq!(&plaintext[..], b"payload bytes");

        // A wrong key almost always breaks the padding; when it does not, the
        // plaintext differs and the caller's deserialization rejects it.
        let wrong = PbeKey::new("battery staple").unwrap();
        match decrypt(&wrong, &params, &ciphertext) {
            Err(CryptoError::DecryptionFailed) => {}
            Ok(garbage) => assert_ne!(&garbage[..], b"payload bytes"),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_ascii_password_rejected() {
        assert!(matches!(
            PbeKey::new("pässword"),
            Err(CryptoError::NonAsciiPassword)
        ));
        assert!(matches!(
            PbeKey::new("tab\there"),
            Err(CryptoError::NonAsciiPassword)
        ));
        assert!(PbeKey::new("").is_ok());
        assert!(PbeKey::new(" ~").is_ok());
    }

    #[test]
    fn test_iteration_count_bounds() {
        let key = PbeKey::new("secret").unwrap();
        let zero = PbeParameters::new([1; SALT_LEN], 0);
        assert!(matches!(
            encrypt(&key, &zero, b"x"),
            Err(CryptoError::IterationCountOutOfRange(0))
        ));

        let huge = PbeParameters::new([1; SALT_LEN], MAX_ITERATION_COUNT + 1);
        assert!(matches!(
            decrypt(&key, &huge, &[0u8; 8]),
            Err(CryptoError::IterationCountOutOfRange(_))
        ));
    }

    #[test]
    fn test_malformed_ciphertext_length() {
        let key = PbeKey::new("secret").unwrap();
        let params = PbeParameters::new([1; SALT_LEN], 1);
        assert!(matches!(
            decrypt(&key, &params, &[]),
            Err(CryptoError::DecryptionFailed)
        ));
        assert!(matches!(
            decrypt(&key, &params, &[0u8; 7]),
            Err(CryptoError::DecryptionFailed)
        ));
    }
}
