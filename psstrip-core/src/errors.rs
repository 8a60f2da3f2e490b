//! errors.rs - Error types for the psstrip-core library.
//!
//! Every failure is fatal for a run: a missed identity or an unreadable file
//! could leave sensitive data in the copy, so nothing is downgraded to a skip.
//!
//! License: GPL-3.0-or-later

use std::path::{Path, PathBuf};
use thiserror::Error;

/// All error kinds raised by the stripping engine.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StripError {
    /// An identity record or rule set could not be read or is malformed.
    #[error("Configuration error in '{}': {reason}", path.display())]
    Configuration { path: PathBuf, reason: String },

    /// A read, write or copy failed while walking or emitting.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source tree could not be enumerated.
    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// One or more patterns failed to compile.
    #[error("Invalid pattern(s):\n{0}")]
    Pattern(String),
}

impl StripError {
    pub fn configuration(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        StripError::Configuration {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        StripError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Shorthand used throughout the crate.
pub type Result<T, E = StripError> = std::result::Result<T, E>;
