//! relayctl command-line front-end.
//!
//! `main` parses arguments, initializes tracing and dispatches to the
//! handlers; [`bootstrap`] is the only place where the runtime is wired
//! together.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod options;
pub mod parser;
pub mod presentation;
pub mod session;

// Re-export primary types for convenient access
pub use bootstrap::{CliContext, SessionKind, bootstrap};
pub use commands::Commands;
pub use error::CliError;
pub use options::RelayOptions;
pub use parser::Cli;
