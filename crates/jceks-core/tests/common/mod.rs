//! Shared helpers for the integration tests.
//!
//! Fixtures were produced with JDK 17 `keytool`:
//!
//! - `vault.jceks` (master `mpass`): `db-secret`, an AES secret key with bytes
//!   `01 02 03` under entry password `epass`
//! - `mixed.jceks` (master `mpass`): `db-secret` as above, `signing` (an EC
//!   private key, entry password `keypass`) and `trusted-ca` (a certificate)
//! - `legacy.jks` (JKS, master `storepass`): `trusted-ca`

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::TempDir;
use assert_fs::prelude::*;
use jceks_core::{Keystore, Password, StoreHandle};
use jceks_core::workflow::EntryLocator;

pub const MASTER: &str = "mpass";
pub const ENTRY_PASSWORD: &str = "epass";
pub const SECRET_ALIAS: &str = "db-secret";

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Copy a fixture into `dir` so tests may modify it.
pub fn copy_fixture(dir: &TempDir, name: &str) -> PathBuf {
    let target = dir.child(name);
    target.write_binary(&fs::read(fixture(name)).unwrap()).unwrap();
    target.to_path_buf()
}

/// Create an empty JCEKS store in `dir`.
pub fn empty_store(dir: &TempDir, name: &str, master: &str) -> PathBuf {
    let target = dir.child(name);
    target
        .write_binary(&Keystore::new().to_bytes(master).unwrap())
        .unwrap();
    target.to_path_buf()
}

pub fn locator(path: &Path, master: &str, alias: &str, entry_password: &str) -> EntryLocator {
    EntryLocator::new(
        StoreHandle::new(path, Password::from(master)),
        alias,
        Password::from(entry_password),
    )
}
