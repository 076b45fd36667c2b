//! Keyed SHA-1 digest sealing a whole keystore container.
//!
//! SunJCE "pre-keys" a SHA-1 context with the master password (each UTF-16 code
//! unit as two big-endian bytes) followed by the ASCII whitener `Mighty Aphrodite`,
//! then hashes every container byte that precedes the digest.

use ring::digest::{Context, SHA1_FOR_LEGACY_USE_ONLY};
use subtle::ConstantTimeEq;

/// Length of the trailing container digest.
pub const DIGEST_LEN: usize = 20;

const WHITENER: &[u8] = b"Mighty Aphrodite";

/// Incremental container digest.
pub struct ContainerDigest(Context);

impl ContainerDigest {
    pub fn new(password: &str) -> Self {
        let mut context = Context::new(&SHA1_FOR_LEGACY_USE_ONLY);
        for unit in password.encode_utf16() {
            context.update(&unit.to_be_bytes());
        }
        context.update(WHITENER);
        Self(context)
    }

    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    pub fn finish(self) -> [u8; DIGEST_LEN] {
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(self.0.finish().as_ref());
        out
    }
}

/// Digest of `data` keyed with `password`.
pub fn compute(password: &str, data: &[u8]) -> [u8; DIGEST_LEN] {
    let mut digest = ContainerDigest::new(password);
    digest.update(data);
    digest.finish()
}

/// Constant-time comparison of the computed digest against `expected`.
pub fn verify(password: &str, data: &[u8], expected: &[u8]) -> bool {
    compute(password, data).ct_eq(expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_prekeyed_digest_of_empty_data() {
        assert_eq!(
            compute("changeit", &[]),
            hex!("e1bfa3ce8ad6df9770bb84eca554c45d65629caf")
        );
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut digest = ContainerDigest::new("mpass");
        digest.update(b"abc");
        digest.update(b"def");
        assert_eq!(digest.finish(), compute("mpass", b"abcdef"));
    }

    #[test]
    fn test_verify() {
        let data = b"container bytes";
        let digest = compute("mpass", data);
        assert!(verify("mpass", data, &digest));
        assert!(!verify("MPASS", data, &digest));
        assert!(!verify("mpass", b"container bytez", &digest));
        assert!(!verify("mpass", data, &digest[..19]));
    }

    #[test]
    fn test_password_encoded_as_utf16() {
        // U+00E9 is one UTF-16 unit (0x00e9) but two UTF-8 bytes; the digest must
        // differ from hashing the UTF-8 form
        let mut utf8_keyed = Context::new(&SHA1_FOR_LEGACY_USE_ONLY);
        utf8_keyed.update("é".as_bytes());
        utf8_keyed.update(WHITENER);
        assert_ne!(compute("é", &[]), utf8_keyed.finish().as_ref());

        let mut utf16_keyed = Context::new(&SHA1_FOR_LEGACY_USE_ONLY);
        utf16_keyed.update(&[0x00, 0xe9]);
        utf16_keyed.update(WHITENER);
        assert_eq!(compute("é", &[]), utf16_keyed.finish().as_ref());
    }
}
