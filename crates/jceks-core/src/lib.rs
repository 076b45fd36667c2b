//! Inspect and migrate secret-key entries between password-protected JCEKS keystores.
//!
//! The crate is layered bottom-up:
//!
//! - [`crypto`]: the SunJCE primitives (PBEWithMD5AndTripleDES, the keyed SHA-1
//!   container digest)
//! - [`keystore`]: a byte-compatible JCEKS container codec
//! - [`store`]: [`ProtectedStore`], one opened keystore file plus its master password,
//!   and the [`PasswordSource`] resolver
//! - [`workflow`]: the `inspect`, `transfer` and `list` operations, reporting progress
//!   through a [`Reporter`]

#![forbid(unsafe_code)]

pub mod crypto;
pub mod error;
pub mod keystore;
pub mod report;
pub mod store;
pub mod workflow;

pub use keystore::{EntryKind, Keystore, SecretEntry};
pub use report::{Reporter, SilentReporter, StreamReporter};
pub use store::{Password, PasswordSource, ProtectedStore, StoreHandle};
pub use workflow::EntryLocator;
