//! Shell completion generation.
//!
//! ```bash
//! eval "$(jceks-tool completions bash)"
//! ```

use std::io;

use anyhow::Result;
use clap::{Args as ClapArgs, CommandFactory};
use clap_complete::{Shell, generate};

use crate::Cli;

#[derive(ClapArgs)]
pub struct Args {
    /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn execute(args: &Args) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_owned();
    generate(args.shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
