//! List command - show the entries of a keystore.
//!
//! Only the keystore password is needed; no entry is decrypted.
//!
//! # Examples
//!
//! ```bash
//! jceks-tool list -k vault.jceks -p mpass
//! jceks-tool list -k vault.jceks -f master.txt --json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat};
use clap::{ArgGroup, Args as ClapArgs};
use serde::Serialize;
use tracing::instrument;

use jceks_core::workflow::{self, EntrySummary};
use jceks_core::{Reporter, StoreHandle};

use super::resolve_password;
use crate::output::create_table;

#[derive(ClapArgs)]
#[command(group(
    ArgGroup::new("keystore_secret")
        .required(true)
        .args(["keystore_password", "keystore_password_file"])
))]
pub struct Args {
    /// Path to the keystore
    #[arg(short = 'k', long = "keystore", value_name = "PATH")]
    pub keystore: PathBuf,

    /// Password of the keystore
    #[arg(short = 'p', long, value_name = "PASSWORD")]
    pub keystore_password: Option<String>,

    /// File whose first line is the keystore password
    #[arg(short = 'f', long, value_name = "FILE")]
    pub keystore_password_file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output format for one entry
#[derive(Serialize)]
struct EntryRow<'a> {
    alias: &'a str,
    entry_type: &'static str,
    created: String,
}

impl<'a> From<&'a EntrySummary> for EntryRow<'a> {
    fn from(summary: &'a EntrySummary) -> Self {
        Self {
            alias: &summary.alias,
            entry_type: summary.kind.keytool_name(),
            created: format_created(summary.created_ms),
        }
    }
}

/// RFC 3339 in UTC, or the raw millisecond value when out of range.
fn format_created(created_ms: i64) -> String {
    DateTime::from_timestamp_millis(created_ms).map_or_else(
        || created_ms.to_string(),
        |date| date.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}

#[instrument(level = "info", name = "cmd::list", skip_all, fields(keystore = %args.keystore.display()))]
pub fn execute(args: Args, reporter: &mut dyn Reporter) -> Result<()> {
    let master = resolve_password(
        "keystore password",
        args.keystore_password,
        args.keystore_password_file,
        reporter,
    )?;
    let summaries = workflow::list(&StoreHandle::new(args.keystore, master), reporter)?;
    let rows: Vec<EntryRow<'_>> = summaries.iter().map(EntryRow::from).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("Keystore contains no entries");
    } else {
        let mut table = create_table();
        table.set_header(vec!["Alias", "Type", "Created"]);
        for row in &rows {
            table.add_row(vec![row.alias, row.entry_type, row.created.as_str()]);
        }
        println!("{table}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_created() {
        assert_eq!(format_created(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(format_created(1_700_000_000_123), "2023-11-14T22:13:20.123Z");
        assert_eq!(format_created(i64::MAX), i64::MAX.to_string());
    }
}
