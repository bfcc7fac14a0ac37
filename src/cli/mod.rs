//! CLI operation mode handlers.
//!
//! This module contains the implementations for the operation modes:
//! - [`migrations`]: Database schema migrations
//! - [`cache`]: Cache store selection and clearing
//! - [`report`]: Fetch contributions and print the report
//!
//! Output formatting utilities are in [`output`].

use tally::ForgeError;
use tally::persistence::PersistenceError;
use thiserror::Error;

pub mod cache;
pub mod migrations;
pub mod output;
pub mod report;

/// Failures surfaced to the user by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration or GitHub failure.
    #[error(transparent)]
    Forge(#[from] ForgeError),

    /// Local database failure.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Writing output failed.
    #[error("failed to write output: {message}")]
    Io {
        /// Writer error detail.
        message: String,
    },
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}
