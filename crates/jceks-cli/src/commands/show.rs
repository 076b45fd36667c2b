//! Show command - print the value of a secret key entry.
//!
//! # Examples
//!
//! ```bash
//! jceks-tool show -k vault.jceks -p mpass -a db-secret -e epass
//! jceks-tool show --quiet -k vault.jceks -f master.txt -a db-secret -n entry.txt
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Args as ClapArgs};
use tracing::instrument;

use jceks_core::workflow::{self, EntryLocator};
use jceks_core::{Reporter, StoreHandle};

use super::resolve_password;

#[derive(ClapArgs)]
#[command(group(
    ArgGroup::new("keystore_secret")
        .required(true)
        .args(["keystore_password", "keystore_password_file"])
))]
#[command(group(
    ArgGroup::new("entry_secret")
        .required(true)
        .args(["entry_password", "entry_password_file"])
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

    /// Alias of the entry to show
    #[arg(short = 'a', long)]
    pub alias: String,

    /// Password of the entry
    #[arg(short = 'e', long, value_name = "PASSWORD")]
    pub entry_password: Option<String>,

    /// File whose first line is the entry password
    #[arg(short = 'n', long, value_name = "FILE")]
    pub entry_password_file: Option<PathBuf>,
}

#[instrument(level = "info", name = "cmd::show", skip_all, fields(keystore = %args.keystore.display(), alias = %args.alias))]
pub fn execute(args: Args, reporter: &mut dyn Reporter) -> Result<()> {
    let master = resolve_password(
        "keystore password",
        args.keystore_password,
        args.keystore_password_file,
        reporter,
    )?;
    let entry_password = resolve_password(
        "entry password",
        args.entry_password,
        args.entry_password_file,
        reporter,
    )?;

    let locator = EntryLocator::new(StoreHandle::new(args.keystore, master), args.alias, entry_password);
    let rendered = workflow::inspect(&locator, reporter)?;
    println!("{}", rendered.as_str());
    Ok(())
}
