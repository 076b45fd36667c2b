//! Secret keys sealed under an entry password, the way SunJCE's `KeyProtector`
//! does it.
//!
//! A secret key entry is a serialized `SealedObjectForKeyProtector`: the
//! PBEWithMD5AndTripleDES encryption of a serialized `SecretKeySpec`, plus the
//! DER-encoded PBE parameters needed to decrypt it.

use thiserror::Error;
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use super::codec::ByteReader;
use super::der::{self, DerError};
use super::entry::SecretEntry;
use super::serial::{self, ClassSpec, FieldSpec, ObjectWriter, SC_SERIALIZABLE, SerialError, Value};
use crate::crypto::CryptoError;
use crate::crypto::pbe::{self, ALGORITHM, DEFAULT_ITERATION_COUNT, PbeKey, PbeParameters};

const SEALED_OBJECT: &str = "javax.crypto.SealedObject";
const SECRET_KEY_SPEC: &str = "javax.crypto.spec.SecretKeySpec";
const KEY_REP: &str = "java.security.KeyRep";

static SEALED_OBJECT_CLASS: ClassSpec = ClassSpec {
    name: SEALED_OBJECT,
    serial_version_uid: 0x3e36_3da6_c3b7_5470,
    flags: SC_SERIALIZABLE,
    fields: &[
        FieldSpec::byte_array("encodedParams"),
        FieldSpec::byte_array("encryptedContent"),
        FieldSpec::string("paramsAlg"),
        FieldSpec::string("sealAlg"),
    ],
    super_class: None,
};

static SEALED_OBJECT_FOR_KEY_PROTECTOR_CLASS: ClassSpec = ClassSpec {
    name: "com.sun.crypto.provider.SealedObjectForKeyProtector",
    serial_version_uid: 0xcd57_ca59_e730_bb53,
    flags: SC_SERIALIZABLE,
    fields: &[],
    super_class: Some(&SEALED_OBJECT_CLASS),
};

static SECRET_KEY_SPEC_CLASS: ClassSpec = ClassSpec {
    name: SECRET_KEY_SPEC,
    serial_version_uid: 0x5b47_0b66_e230_614d,
    flags: SC_SERIALIZABLE,
    fields: &[FieldSpec::string("algorithm"), FieldSpec::byte_array("key")],
    super_class: None,
};

/// Errors sealing or unsealing a secret key.
#[derive(Error, Debug)]
pub enum KeyProtectionError {
    /// **[USER ERROR]** Padding or key-object decoding failed after decryption.
    /// Wrong password and corrupted ciphertext look the same.
    #[error("Incorrect entry password or corrupted entry")]
    IncorrectPassword,

    #[error("Unsupported protection algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Unsupported key object: {0}")]
    UnsupportedKeyObject(String),

    #[error("Invalid protection parameters: {0}")]
    InvalidParameters(#[from] DerError),

    #[error("Malformed key object: {0}")]
    Serialization(#[from] SerialError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// The sealed form of a secret key, exactly as stored in the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedKey {
    encoded_params: Vec<u8>,
    encrypted_content: Vec<u8>,
    params_alg: String,
    seal_alg: String,
}

impl SealedKey {
    /// Read one serialization stream holding a `SealedObject`.
    pub(crate) fn read(input: &mut ByteReader<'_>) -> Result<Self, SerialError> {
        let value = serial::read_object(input)?;
        let Value::Object(object) = &value else {
            return Err(SerialError::UnexpectedClass {
                expected: SEALED_OBJECT,
                found: "a non-object value".to_owned(),
            });
        };
        if !object.class.is_a(SEALED_OBJECT) {
            return Err(SerialError::UnexpectedClass {
                expected: SEALED_OBJECT,
                found: object.class_name().to_owned(),
            });
        }

        Ok(Self {
            encoded_params: object.bytes_field("encodedParams")?.to_vec(),
            encrypted_content: object.bytes_field("encryptedContent")?.to_vec(),
            params_alg: object.string_field("paramsAlg")?.to_owned(),
            seal_alg: object.string_field("sealAlg")?.to_owned(),
        })
    }

    /// Append the serialization stream, as a `SealedObjectForKeyProtector`.
    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<(), SerialError> {
        let mut writer = ObjectWriter::new();
        writer.begin_object(&SEALED_OBJECT_FOR_KEY_PROTECTOR_CLASS)?;
        writer.write_byte_array(&self.encoded_params)?;
        writer.write_byte_array(&self.encrypted_content)?;
        writer.write_string(&self.params_alg)?;
        writer.write_string(&self.seal_alg)?;
        out.extend_from_slice(&writer.finish());
        Ok(())
    }

    pub fn seal_algorithm(&self) -> &str {
        &self.seal_alg
    }
}

/// Seals and unseals secret keys under one entry password.
#[derive(Debug)]
pub struct KeyProtector {
    key: PbeKey,
    iteration_count: u32,
}

impl KeyProtector {
    /// Fails with [`CryptoError::NonAsciiPassword`] for passwords the SunJCE PBE
    /// implementation cannot represent.
    pub fn new(password: &str) -> Result<Self, KeyProtectionError> {
        Ok(Self {
            key: PbeKey::new(password)?,
            iteration_count: DEFAULT_ITERATION_COUNT,
        })
    }

    /// Iteration count used by [`seal`](Self::seal). Unsealing always uses the
    /// count stored with the key.
    #[must_use]
    pub fn with_iteration_count(mut self, iteration_count: u32) -> Self {
        self.iteration_count = iteration_count;
        self
    }

    #[instrument(level = "debug", skip_all, fields(algorithm = secret.algorithm()))]
    pub fn seal(&self, secret: &SecretEntry) -> Result<SealedKey, KeyProtectionError> {
        let params = PbeParameters::generate(self.iteration_count)?;
        let plaintext = serialize_secret_key(secret)?;
        let encrypted_content = pbe::encrypt(&self.key, &params, &plaintext)?;
        debug!(iterations = params.iteration_count, "Sealed secret key");

        Ok(SealedKey {
            encoded_params: der::encode_pbe_parameters(&params),
            encrypted_content,
            params_alg: ALGORITHM.to_owned(),
            seal_alg: ALGORITHM.to_owned(),
        })
    }

    #[instrument(level = "debug", skip_all)]
    pub fn unseal(&self, sealed: &SealedKey) -> Result<SecretEntry, KeyProtectionError> {
        for alg in [&sealed.params_alg, &sealed.seal_alg] {
            if !alg.eq_ignore_ascii_case(ALGORITHM) {
                return Err(KeyProtectionError::UnsupportedAlgorithm(alg.clone()));
            }
        }

        let params = der::decode_pbe_parameters(&sealed.encoded_params)?;
        debug!(iterations = params.iteration_count, "Unsealing secret key");

        let plaintext = match pbe::decrypt(&self.key, &params, &sealed.encrypted_content) {
            Ok(plaintext) => plaintext,
            Err(CryptoError::DecryptionFailed) => return Err(KeyProtectionError::IncorrectPassword),
            Err(e) => return Err(e.into()),
        };
        deserialize_secret_key(&plaintext)
    }
}

fn serialize_secret_key(secret: &SecretEntry) -> Result<Zeroizing<Vec<u8>>, SerialError> {
    let mut writer = ObjectWriter::new();
    writer.begin_object(&SECRET_KEY_SPEC_CLASS)?;
    writer.write_string(secret.algorithm())?;
    writer.write_byte_array(secret.encoded())?;
    Ok(writer.finish())
}

fn deserialize_secret_key(plaintext: &[u8]) -> Result<SecretEntry, KeyProtectionError> {
    // A wrong password that happens to leave valid padding decrypts to noise
    let value = serial::read_object(&mut ByteReader::new(plaintext))
        .map_err(|_| KeyProtectionError::IncorrectPassword)?;
    let Some(object) = value.as_object() else {
        return Err(KeyProtectionError::IncorrectPassword);
    };

    match object.class_name() {
        SECRET_KEY_SPEC => Ok(SecretEntry::new(
            object.string_field("algorithm")?,
            object.bytes_field("key")?,
        )),
        KEY_REP => {
            let kind = object.enum_field("type")?;
            let format = object.string_field("format")?;
            if kind != "SECRET" || format != "RAW" {
                return Err(KeyProtectionError::UnsupportedKeyObject(format!(
                    "{KEY_REP} of type {kind} in {format} format"
                )));
            }
            Ok(SecretEntry::new(
                object.string_field("algorithm")?,
                object.bytes_field("encoded")?,
            ))
        }
        other => Err(KeyProtectionError::UnsupportedKeyObject(other.to_owned())),
    }
}
