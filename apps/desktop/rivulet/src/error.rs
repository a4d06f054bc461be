use common::ErrorLocation;

use thiserror::Error;

/// Errors raised while wiring the shell together.
///
/// Core failures are flattened to their display form here; the structured
/// error (and its location) has already been logged where it happened.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Error from the shell's own wiring (directories, logger, runtime).
    #[error("Shell Error: {message} {location}")]
    Shell {
        message: String,
        location: ErrorLocation,
    },

    /// Error from a host-core component during startup.
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },
}

impl ShellError {
    #[track_caller]
    pub fn shell(message: impl Into<String>) -> Self {
        Self::Shell {
            message: message.into(),
            location: ErrorLocation::capture(),
        }
    }

    #[track_caller]
    pub fn core(reason: impl std::fmt::Display) -> Self {
        Self::Core {
            message: reason.to_string(),
            location: ErrorLocation::capture(),
        }
    }
}
