//! DER codec for the PKCS#5 `PBEParameter` structure:
//!
//! ```text
//! PBEParameter ::= SEQUENCE {
//!     salt           OCTET STRING (SIZE(8)),
//!     iterationCount INTEGER }
//! ```

use thiserror::Error;

use crate::crypto::pbe::{PbeParameters, SALT_LEN};

const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_SEQUENCE: u8 = 0x30;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DerError {
    #[error("Truncated DER data")]
    Truncated,

    #[error("Expected DER tag {expected:#04x}, found {found:#04x}")]
    UnexpectedTag { expected: u8, found: u8 },

    #[error("Unsupported DER length encoding")]
    InvalidLength,

    #[error("PBE salt must be {SALT_LEN} bytes, got {0}")]
    InvalidSaltLength(usize),

    #[error("PBE iteration count is not a positive 32-bit integer")]
    InvalidInteger,

    #[error("Extra data after PBE parameters")]
    TrailingData,
}

pub fn encode_pbe_parameters(params: &PbeParameters) -> Vec<u8> {
    let count = params.iteration_count.to_be_bytes();
    let first = count.iter().position(|&b| b != 0).unwrap_or(count.len() - 1);
    let mut integer = count[first..].to_vec();
    if integer[0] & 0x80 != 0 {
        integer.insert(0, 0);
    }

    let mut content = Vec::with_capacity(2 + SALT_LEN + 2 + integer.len());
    push_tlv(&mut content, TAG_OCTET_STRING, &params.salt);
    push_tlv(&mut content, TAG_INTEGER, &integer);

    let mut out = Vec::with_capacity(2 + content.len());
    push_tlv(&mut out, TAG_SEQUENCE, &content);
    out
}

// Contents here are always shorter than 128 bytes
#[allow(clippy::cast_possible_truncation)]
fn push_tlv(out: &mut Vec<u8>, tag: u8, value: &[u8]) {
    out.push(tag);
    out.push(value.len() as u8);
    out.extend_from_slice(value);
}

pub fn decode_pbe_parameters(der: &[u8]) -> Result<PbeParameters, DerError> {
    let mut outer = der;
    let mut sequence = read_tlv(&mut outer, TAG_SEQUENCE)?;
    if !outer.is_empty() {
        return Err(DerError::TrailingData);
    }

    let salt = read_tlv(&mut sequence, TAG_OCTET_STRING)?;
    let salt: [u8; SALT_LEN] = salt
        .try_into()
        .map_err(|_| DerError::InvalidSaltLength(salt.len()))?;

    let integer = read_tlv(&mut sequence, TAG_INTEGER)?;
    if !sequence.is_empty() {
        return Err(DerError::TrailingData);
    }

    Ok(PbeParameters::new(salt, decode_u32(integer)?))
}

fn decode_u32(integer: &[u8]) -> Result<u32, DerError> {
    match integer.first() {
        None => return Err(DerError::InvalidInteger),
        Some(&b) if b & 0x80 != 0 => return Err(DerError::InvalidInteger),
        Some(_) => {}
    }
    let significant: Vec<u8> = integer.iter().copied().skip_while(|&b| b == 0).collect();
    if significant.len() > 4 {
        return Err(DerError::InvalidInteger);
    }
    let mut buf = [0u8; 4];
    buf[4 - significant.len()..].copy_from_slice(&significant);
    Ok(u32::from_be_bytes(buf))
}

/// Split one TLV with `tag` off the front of `input`, returning its value.
fn read_tlv<'a>(input: &mut &'a [u8], tag: u8) -> Result<&'a [u8], DerError> {
    let (&found, rest) = input.split_first().ok_or(DerError::Truncated)?;
    if found != tag {
        return Err(DerError::UnexpectedTag {
            expected: tag,
            found,
        });
    }

    let (&first, mut rest) = rest.split_first().ok_or(DerError::Truncated)?;
    let len = match first {
        0x00..=0x7f => usize::from(first),
        0x81 | 0x82 => {
            let width = usize::from(first & 0x7f);
            if rest.len() < width {
                return Err(DerError::Truncated);
            }
            let (bytes, tail) = rest.split_at(width);
            rest = tail;
            bytes.iter().fold(0usize, |acc, &b| (acc << 8) | usize::from(b))
        }
        _ => return Err(DerError::InvalidLength),
    };

    if rest.len() < len {
        return Err(DerError::Truncated);
    }
    let (value, tail) = rest.split_at(len);
    *input = tail;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_encode_matches_jdk() {
        let params = PbeParameters::new(hex!("2ce3941c4c064779"), 200_000);
        assert_eq!(
            encode_pbe_parameters(&params),
            hex!("300f 0408 2ce3941c4c064779 0203 030d40")
        );
    }

    #[test]
    fn test_integer_sign_padding() {
        let params = PbeParameters::new([0; SALT_LEN], 0x80);
        let der = encode_pbe_parameters(&params);
        assert_eq!(&der[12..], &hex!("0202 0080"));
        assert_eq!(decode_pbe_parameters(&der).unwrap(), params);
    }

    #[test]
    fn test_decode() {
        let params = decode_pbe_parameters(&hex!("300f 0408 2ce3941c4c064779 0203 030d40")).unwrap();
        assert_eq!(params.salt, hex!("2ce3941c4c064779"));
        assert_eq!(params.iteration_count, 200_000);

        // Long-form lengths are accepted
        let long_form = hex!("3081 0f 0408 0102030405060708 0203 030d40");
        assert_eq!(
            decode_pbe_parameters(&long_form).unwrap().iteration_count,
            200_000
        );
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert_eq!(
            decode_pbe_parameters(&hex!("300e 0407 01020304050607 0203 030d40")),
            Err(DerError::InvalidSaltLength(7))
        );
        assert_eq!(
            decode_pbe_parameters(&hex!("300f 0408 0102030405060708 0203 030d40 00")),
            Err(DerError::TrailingData)
        );
        assert_eq!(
            decode_pbe_parameters(&hex!("300f 0408 0102030405060708 0203 ff0000")),
            Err(DerError::InvalidInteger)
        );
        assert_eq!(
            decode_pbe_parameters(&hex!("3110 0408 0102030405060708 0204 00030d40")),
            Err(DerError::UnexpectedTag {
                expected: TAG_SEQUENCE,
                found: 0x31
            })
        );
        assert_eq!(
            decode_pbe_parameters(&hex!("300f 0408 0102")),
            Err(DerError::Truncated)
        );
        assert_eq!(
            decode_pbe_parameters(&hex!("3011 0408 0102030405060708 0205 0100000000")),
            Err(DerError::InvalidInteger)
        );
    }
}
