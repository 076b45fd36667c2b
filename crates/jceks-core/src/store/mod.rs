//! One keystore file opened under its master password.
//!
//! [`ProtectedStore`] loads the container when it is opened, unlocks single
//! secret key entries with their own entry password, and locks entries back in,
//! persisting the whole container atomically after every write.

pub mod password;

pub use password::{Password, PasswordError, PasswordSource};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::keystore::{
    ContainerFormat, EntryData, EntryKind, KeyProtectionError, KeyProtector, Keystore,
    KeystoreError, SecretEntry, StoredEntry,
};
use crate::report::Reporter;

/// Errors from [`ProtectedStore`] operations. Every variant is terminal for the
/// command that hit it.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The file is missing or unreadable, not a keystore, or the master password
    /// is wrong.
    #[error("Failed to load keystore '{}'", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: KeystoreError,
    },

    #[error("Entry '{alias}' not found in keystore '{}'", path.display())]
    EntryNotFound { alias: String, path: PathBuf },

    /// Wrong entry password, or a protection scheme that is not supported.
    #[error("Failed to unlock entry '{alias}'")]
    EntryUnlock {
        alias: String,
        #[source]
        source: KeyProtectionError,
    },

    /// **[USER ERROR]** Only secret key entries can be read or transferred.
    #[error("Entry '{alias}' is a {found} entry, not a secret key entry")]
    WrongEntryType { alias: String, found: EntryKind },

    /// The secret could not be sealed under the destination entry password.
    #[error("Failed to protect entry '{alias}'")]
    EntryLock {
        alias: String,
        #[source]
        source: KeyProtectionError,
    },

    /// Encoding or persisting the container failed; the file on disk is unchanged.
    #[error("Failed to write keystore '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: KeystoreError,
    },
}

/// A keystore location plus its master password.
#[derive(Debug)]
pub struct StoreHandle {
    path: PathBuf,
    master_password: Password,
}

impl StoreHandle {
    pub fn new(path: impl Into<PathBuf>, master_password: Password) -> Self {
        Self {
            path: path.into(),
            master_password,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A loaded keystore bound to the handle it was opened with.
#[derive(Debug)]
pub struct ProtectedStore<'h> {
    handle: &'h StoreHandle,
    keystore: Keystore,
}

impl<'h> ProtectedStore<'h> {
    /// Read and verify the container. No partial state survives a failure.
    #[instrument(level = "info", name = "store::open", skip_all, fields(path = %handle.path.display()))]
    pub fn open(handle: &'h StoreHandle, reporter: &mut dyn Reporter) -> Result<Self, StoreError> {
        reporter.step(&format!(
            "loading keystore from '{}'...",
            handle.path.display()
        ));

        let access = |source: KeystoreError| StoreError::Access {
            path: handle.path.clone(),
            source,
        };
        let bytes = fs::read(&handle.path).map_err(|e| access(e.into()))?;
        let keystore = Keystore::load(&bytes, handle.master_password.expose()).map_err(access)?;

        info!(entries = keystore.len(), "Keystore loaded");
        Ok(Self { handle, keystore })
    }

    pub fn path(&self) -> &Path {
        &self.handle.path
    }

    pub fn keystore(&self) -> &Keystore {
        &self.keystore
    }

    /// Decrypt the secret key stored at `alias`. Read-only.
    #[instrument(level = "info", name = "store::unlock", skip_all, fields(alias = %alias))]
    pub fn unlock(
        &self,
        alias: &str,
        entry_password: &Password,
        reporter: &mut dyn Reporter,
    ) -> Result<SecretEntry, StoreError> {
        reporter.step(&format!("getting keystore entry, alias: '{alias}'..."));

        let entry = self
            .keystore
            .get(alias)
            .ok_or_else(|| StoreError::EntryNotFound {
                alias: alias.to_owned(),
                path: self.handle.path.clone(),
            })?;
        let EntryData::SecretKey(sealed) = &entry.data else {
            return Err(StoreError::WrongEntryType {
                alias: alias.to_owned(),
                found: entry.kind(),
            });
        };

        let unlock_error = |source| StoreError::EntryUnlock {
            alias: alias.to_owned(),
            source,
        };
        let protector = KeyProtector::new(entry_password.expose()).map_err(unlock_error)?;
        let secret = protector.unseal(sealed).map_err(unlock_error)?;
        debug!(algorithm = secret.algorithm(), "Entry unlocked");
        Ok(secret)
    }

    /// Store `secret` at `alias` under `entry_password`, replacing any existing
    /// entry, then persist the container. The in-memory keystore only changes
    /// once the file has been replaced.
    #[instrument(level = "info", name = "store::lock", skip_all, fields(alias = %alias))]
    pub fn lock(
        &mut self,
        alias: &str,
        secret: &SecretEntry,
        entry_password: &Password,
        reporter: &mut dyn Reporter,
    ) -> Result<(), StoreError> {
        reporter.step(&format!("adding a new keystore entry, alias: '{alias}'..."));

        let lock_error = |source| StoreError::EntryLock {
            alias: alias.to_owned(),
            source,
        };
        let sealed = KeyProtector::new(entry_password.expose())
            .and_then(|protector| protector.seal(secret))
            .map_err(lock_error)?;

        let mut updated = self.keystore.clone();
        if updated.insert(alias, StoredEntry::secret_key(sealed)).is_some() {
            debug!("Replacing existing entry");
        }

        reporter.step(&format!(
            "saving the keystore, location: '{}'...",
            self.handle.path.display()
        ));
        if updated.source_format() == ContainerFormat::Jks {
            info!("Writing JKS keystore back as JCEKS");
        }

        let write_error = |source: KeystoreError| StoreError::Write {
            path: self.handle.path.clone(),
            source,
        };
        let bytes = updated
            .to_bytes(self.handle.master_password.expose())
            .map_err(write_error)?;
        atomic_write(&self.handle.path, &bytes).map_err(|e| write_error(e.into()))?;

        info!(entries = updated.len(), "Keystore saved");
        self.keystore = updated;
        Ok(())
    }
}

/// Replace `path` with `content` via a synced temp file in the same directory,
/// keeping the original file's permissions. A symlinked `path` is resolved so
/// the file it points at is replaced, not the link.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let path = resolved.as_path();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(content)?;
    temp_file.as_file().sync_all()?;
    if let Ok(metadata) = fs::metadata(path) {
        temp_file.as_file().set_permissions(metadata.permissions())?;
    }
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
