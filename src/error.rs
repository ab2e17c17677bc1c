use std::path::PathBuf;
use thiserror::Error;

/// Failures the player window handles itself. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    #[error("failed to load {}: {reason}", path.display())]
    SourceLoad { path: PathBuf, reason: String },

    #[error("no video has been selected")]
    NoSourceSelected,

    #[error("dialog dismissed without a choice")]
    UserCancelled,

    #[error("playback is disabled until another file is opened")]
    PlaybackDisabled,

    #[error("{} is not a supported video file", path.display())]
    UnsupportedFile { path: PathBuf },
}

impl PlayerError {
    /// Outcomes that need no more than a debug log line.
    pub fn is_quiet(&self) -> bool {
        matches!(self, PlayerError::UserCancelled)
    }
}
