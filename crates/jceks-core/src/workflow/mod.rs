//! The operations the tool exposes, each opening its own stores.
//!
//! Passwords are resolved by the caller before any workflow runs; a workflow
//! only ever sees [`Password`] values.

mod inspect;
mod list;
mod transfer;

pub use inspect::{BEGIN_MARKER, END_MARKER, inspect, render_secret};
pub use list::{EntrySummary, list};
pub use transfer::transfer;

use crate::store::{Password, StoreHandle};

/// One entry in one store, plus the password protecting that entry.
#[derive(Debug)]
pub struct EntryLocator {
    pub store: StoreHandle,
    pub alias: String,
    pub entry_password: Password,
}

impl EntryLocator {
    pub fn new(store: StoreHandle, alias: impl Into<String>, entry_password: Password) -> Self {
        Self {
            store,
            alias: alias.into(),
            entry_password,
        }
    }
}
