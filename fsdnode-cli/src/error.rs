//! CLI error handling with user-friendly messages.
//!
//! Centralizes boot-failure formatting and the process exit code. Once
//! the daemon is up, nothing in the core escalates to this layer; the
//! controller logs and carries on.

use std::fmt;
use std::process;

use fsdnode::controller::BootError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to resolve the base directory or initialize logging
    LoggingInit(String),
    /// Configuration could not be loaded or is unusable
    Boot(BootError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Boot(BootError::MissingIdent) = self {
            eprintln!();
            eprintln!("The [system] section of the config file must name this node:");
            eprintln!("  [system]");
            eprintln!("  ident = MYNODE");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Boot(e) => write!(f, "Failed to boot node: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Boot(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BootError> for CliError {
    fn from(e: BootError) -> Self {
        CliError::Boot(e)
    }
}
