//! Container layout: header, entries, keyed digest.

use tracing::{debug, warn};

use super::codec::{self, ByteReader};
use super::entry::{Certificate, EntryData, EntryKind, StoredEntry};
use super::sealed::SealedKey;
use super::{Keystore, KeystoreError};
use crate::crypto::integrity::{self, DIGEST_LEN};

pub const JCEKS_MAGIC: u32 = 0xcece_cece;
pub const JKS_MAGIC: u32 = 0xfeed_feed;

const VERSION_1: u32 = 1;
const VERSION_2: u32 = 2;

/// Container flavour a keystore was loaded from. Writes are always JCEKS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerFormat {
    #[default]
    Jceks,
    Jks,
}

pub(super) fn decode(bytes: &[u8], password: &str) -> Result<Keystore, KeystoreError> {
    let mut reader = ByteReader::new(bytes);

    let format = match reader.read_u32()? {
        JCEKS_MAGIC => ContainerFormat::Jceks,
        JKS_MAGIC => ContainerFormat::Jks,
        other => return Err(KeystoreError::InvalidMagic(other)),
    };
    let version = reader.read_u32()?;
    if version != VERSION_1 && version != VERSION_2 {
        return Err(KeystoreError::UnsupportedVersion(version));
    }
    let count = reader.read_u32()?;
    debug!(?format, version, count, "Reading keystore header");

    let mut keystore = Keystore {
        entries: Vec::new(),
        format,
    };
    for _ in 0..count {
        let tag = reader.read_u32()?;
        let alias = reader.read_utf()?;
        let created_ms = reader.read_i64()?;

        let data = match tag {
            t if t == EntryKind::PrivateKey.tag() => {
                let protected_key = reader.read_length_prefixed()?.to_vec();
                // Non-positive counts mean an empty chain
                let chain_len = usize::try_from(reader.read_i32()?).unwrap_or(0);
                let mut chain = Vec::new();
                for _ in 0..chain_len {
                    chain.push(read_certificate(&mut reader, version)?);
                }
                EntryData::PrivateKey {
                    protected_key,
                    chain,
                }
            }
            t if t == EntryKind::TrustedCertificate.tag() => {
                EntryData::TrustedCertificate(read_certificate(&mut reader, version)?)
            }
            t if t == EntryKind::SecretKey.tag() => EntryData::SecretKey(
                SealedKey::read(&mut reader).map_err(|source| KeystoreError::SealedKey {
                    alias: alias.clone(),
                    source,
                })?,
            ),
            tag => return Err(KeystoreError::UnknownEntryTag { tag, alias }),
        };

        keystore.insert(&alias, StoredEntry { created_ms, data });
    }

    let covered = reader.consumed();
    let expected = reader.read_bytes(DIGEST_LEN)?;
    if !integrity::verify(password, covered, expected) {
        return Err(KeystoreError::IntegrityCheckFailed);
    }
    if reader.remaining() > 0 {
        warn!(
            trailing = reader.remaining(),
            "Ignoring trailing bytes after the keystore digest"
        );
    }

    Ok(keystore)
}

fn read_certificate(reader: &mut ByteReader<'_>, version: u32) -> Result<Certificate, KeystoreError> {
    let cert_type = if version == VERSION_2 {
        reader.read_utf()?
    } else {
        "X.509".to_owned()
    };
    let encoded = reader.read_length_prefixed()?.to_vec();
    Ok(Certificate { cert_type, encoded })
}

pub(super) fn encode(keystore: &Keystore, password: &str) -> Result<Vec<u8>, KeystoreError> {
    let count = u32::try_from(keystore.entries.len())
        .map_err(|_| KeystoreError::TooManyEntries(keystore.entries.len()))?;

    let mut out = Vec::with_capacity(4096);
    out.extend_from_slice(&JCEKS_MAGIC.to_be_bytes());
    out.extend_from_slice(&VERSION_2.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());

    for (alias, entry) in &keystore.entries {
        out.extend_from_slice(&entry.kind().tag().to_be_bytes());
        codec::write_utf(&mut out, alias)?;
        out.extend_from_slice(&entry.created_ms.to_be_bytes());

        match &entry.data {
            EntryData::PrivateKey {
                protected_key,
                chain,
            } => {
                codec::write_length_prefixed(&mut out, protected_key)?;
                let chain_len = i32::try_from(chain.len())
                    .map_err(|_| KeystoreError::TooManyEntries(chain.len()))?;
                out.extend_from_slice(&chain_len.to_be_bytes());
                for certificate in chain {
                    write_certificate(&mut out, certificate)?;
                }
            }
            EntryData::TrustedCertificate(certificate) => write_certificate(&mut out, certificate)?,
            EntryData::SecretKey(sealed) => {
                sealed
                    .write(&mut out)
                    .map_err(|source| KeystoreError::SealedKey {
                        alias: alias.clone(),
                        source,
                    })?;
            }
        }
    }

    let digest = integrity::compute(password, &out);
    out.extend_from_slice(&digest);
    Ok(out)
}

fn write_certificate(out: &mut Vec<u8>, certificate: &Certificate) -> Result<(), KeystoreError> {
    codec::write_utf(out, &certificate.cert_type)?;
    codec::write_length_prefixed(out, &certificate.encoded)?;
    Ok(())
}
