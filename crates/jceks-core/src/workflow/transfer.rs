use tracing::{info, instrument};

use super::EntryLocator;
use crate::report::Reporter;
use crate::store::{ProtectedStore, StoreError};

/// Move one secret key from `source` to `destination`, re-protecting it under
/// the destination's entry password.
///
/// Both stores are opened before anything is decrypted. The source is never
/// written; the destination file is replaced atomically as the last step. Source
/// and destination may be the same file, which re-protects the entry in place.
#[instrument(
    level = "info",
    name = "workflow::transfer",
    skip_all,
    fields(
        source = %source.store.path().display(),
        source_alias = %source.alias,
        destination = %destination.store.path().display(),
        destination_alias = %destination.alias,
    )
)]
pub fn transfer(
    source: &EntryLocator,
    destination: &EntryLocator,
    reporter: &mut dyn Reporter,
) -> Result<(), StoreError> {
    let source_store = ProtectedStore::open(&source.store, reporter)?;
    let mut destination_store = ProtectedStore::open(&destination.store, reporter)?;

    let secret = source_store.unlock(&source.alias, &source.entry_password, reporter)?;
    destination_store.lock(
        &destination.alias,
        &secret,
        &destination.entry_password,
        reporter,
    )?;

    info!("Entry transferred");
    Ok(())
}
