//! Configuration module
//!
//! JSON settings that pick an action sequence preset, override individual
//! profile values and optionally fix the random seed.

pub mod settings;

use std::path::PathBuf;

use thiserror::Error;

pub use settings::{KeyboardOverrides, MouseOverrides, SequenceOverrides, Settings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}
