//! # Gameplay Error Types
//!
//! Failures that reach the application driver: unreadable configuration,
//! settings I/O, pool capability failures and stale character handles.

use std::path::PathBuf;

use tavern_core::CoreError;
use tavern_shared::CharacterId;
use thiserror::Error;

/// Errors raised by the gameplay layer.
#[derive(Error, Debug)]
pub enum GameError {
    /// Configuration text is not valid.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A file could not be read or written.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying failure.
        source: std::io::Error,
    },

    /// The settings blob could not be encoded.
    #[error("settings encoding failed: {0}")]
    Settings(#[from] serde_json::Error),

    /// A kernel precondition failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No live character has this id.
    #[error("unknown character: {0}")]
    UnknownCharacter(CharacterId),

    /// No pool exists for this character role.
    #[error("no pool for role `{0}`; was the session initialized?")]
    UnknownPool(&'static str),
}

impl GameError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Result type for gameplay operations.
pub type GameResult<T> = Result<T, GameError>;
