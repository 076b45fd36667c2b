use tracing::instrument;

use crate::keystore::EntryKind;
use crate::report::Reporter;
use crate::store::{ProtectedStore, StoreError, StoreHandle};

/// Alias, type and creation date of one entry. Nothing is decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    pub alias: String,
    pub kind: EntryKind,
    /// Milliseconds since the Unix epoch.
    pub created_ms: i64,
}

/// Every entry of the store, in container order.
#[instrument(level = "info", name = "workflow::list", skip_all, fields(path = %handle.path().display()))]
pub fn list(handle: &StoreHandle, reporter: &mut dyn Reporter) -> Result<Vec<EntrySummary>, StoreError> {
    let store = ProtectedStore::open(handle, reporter)?;
    Ok(store
        .keystore()
        .iter()
        .map(|(alias, entry)| EntrySummary {
            alias: alias.to_owned(),
            kind: entry.kind(),
            created_ms: entry.created_ms,
        })
        .collect())
}
