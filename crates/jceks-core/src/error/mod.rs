//! Error types of every layer, in one place.

pub use crate::crypto::CryptoError;
pub use crate::keystore::codec::CodecError;
pub use crate::keystore::der::DerError;
pub use crate::keystore::serial::SerialError;
pub use crate::keystore::{KeyProtectionError, KeystoreError};
pub use crate::store::{PasswordError, StoreError};
