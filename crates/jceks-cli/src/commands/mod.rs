pub mod completions;
pub mod copy;
pub mod list;
pub mod show;

use std::path::PathBuf;

use anyhow::{Context, Result};

use jceks_core::{Password, PasswordSource, Reporter};

/// Resolve a literal-or-file password pair. Clap guarantees exactly one is set.
fn resolve_password(
    what: &str,
    literal: Option<String>,
    file: Option<PathBuf>,
    reporter: &mut dyn Reporter,
) -> Result<Password> {
    PasswordSource::from_options(literal, file)
        .with_context(|| format!("No {what} given"))?
        .resolve(reporter)
        .with_context(|| format!("Failed to resolve the {what}"))
}
