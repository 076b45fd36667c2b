//! Exit codes for the CLI.

/// Successful execution
pub const SUCCESS: u8 = 0;

/// Any failure while running a command
pub const GENERAL_ERROR: u8 = 1;

/// Command-line usage error (bad or missing arguments)
pub const USAGE_ERROR: u8 = 2;
