//! Copy command - move a secret key entry between keystores.
//!
//! The source keystore is only read. The target keystore must already exist; it
//! is rewritten atomically with the entry sealed under the target entry
//! password. Source and target may be the same file, e.g. to rotate an entry
//! password.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Args as ClapArgs};
use tracing::instrument;

use jceks_core::workflow::{self, EntryLocator};
use jceks_core::{Reporter, StoreHandle};

use super::resolve_password;

#[derive(ClapArgs)]
#[command(group(
    ArgGroup::new("source_keystore_secret")
        .required(true)
        .args(["source_keystore_password", "source_keystore_password_file"])
))]
#[command(group(
    ArgGroup::new("source_entry_secret")
        .required(true)
        .args(["source_entry_password", "source_entry_password_file"])
))]
#[command(group(
    ArgGroup::new("target_keystore_secret")
        .required(true)
        .args(["target_keystore_password", "target_keystore_password_file"])
))]
#[command(group(
    ArgGroup::new("target_entry_secret")
        .required(true)
        .args(["target_entry_password", "target_entry_password_file"])
))]
pub struct Args {
    /// Path to the source keystore
    #[arg(short = 's', long, value_name = "PATH")]
    pub source_keystore: PathBuf,

    /// Password of the source keystore
    #[arg(short = 'p', long, value_name = "PASSWORD")]
    pub source_keystore_password: Option<String>,

    /// File whose first line is the source keystore password
    #[arg(short = 'f', long, value_name = "FILE")]
    pub source_keystore_password_file: Option<PathBuf>,

    /// Alias of the entry to copy
    #[arg(short = 'a', long)]
    pub source_alias: String,

    /// Password of the source entry
    #[arg(short = 'e', long, value_name = "PASSWORD")]
    pub source_entry_password: Option<String>,

    /// File whose first line is the source entry password
    #[arg(short = 'n', long, value_name = "FILE")]
    pub source_entry_password_file: Option<PathBuf>,

    /// Path to the target keystore
    #[arg(short = 't', long, value_name = "PATH")]
    pub target_keystore: PathBuf,

    /// Password of the target keystore
    #[arg(short = 'o', long, value_name = "PASSWORD")]
    pub target_keystore_password: Option<String>,

    /// File whose first line is the target keystore password
    #[arg(short = 'u', long, value_name = "FILE")]
    pub target_keystore_password_file: Option<PathBuf>,

    /// Alias under which the entry is stored in the target keystore
    #[arg(short = 'l', long)]
    pub target_alias: String,

    /// Password protecting the entry in the target keystore
    #[arg(short = 'r', long, value_name = "PASSWORD")]
    pub target_entry_password: Option<String>,

    /// File whose first line is the target entry password
    #[arg(short = 'z', long, value_name = "FILE")]
    pub target_entry_password_file: Option<PathBuf>,
}

#[instrument(
    level = "info",
    name = "cmd::copy",
    skip_all,
    fields(
        source = %args.source_keystore.display(),
        target = %args.target_keystore.display(),
    )
)]
pub fn execute(args: Args, reporter: &mut dyn Reporter) -> Result<()> {
    let source_master = resolve_password(
        "source keystore password",
        args.source_keystore_password,
        args.source_keystore_password_file,
        reporter,
    )?;
    let source_entry = resolve_password(
        "source entry password",
        args.source_entry_password,
        args.source_entry_password_file,
        reporter,
    )?;
    let target_master = resolve_password(
        "target keystore password",
        args.target_keystore_password,
        args.target_keystore_password_file,
        reporter,
    )?;
    let target_entry = resolve_password(
        "target entry password",
        args.target_entry_password,
        args.target_entry_password_file,
        reporter,
    )?;

    let source = EntryLocator::new(
        StoreHandle::new(args.source_keystore, source_master),
        args.source_alias,
        source_entry,
    );
    let target = EntryLocator::new(
        StoreHandle::new(args.target_keystore, target_master),
        args.target_alias,
        target_entry,
    );

    workflow::transfer(&source, &target, reporter)?;
    Ok(())
}
