use {
    crate::{display::*, prelude::*},
    ga4_mp_sdk::MpError,
    thiserror::Error,
};

/// Custom error definitions for the `mp` CLI. Takes care of displaying a
/// pretty summary in the console.
#[derive(Debug, Error)]
pub(crate) enum MpCliError {
    #[error("{error}{separator}\n{0}", error = "Syntax Error".red().bold(), separator = separator())]
    SyntaxError(clap::error::Error),
    #[error("{error}{separator}\n{0}", error = "IO Error".red().bold(), separator = separator())]
    IoError(std::io::Error),
    #[error("{error}{separator}\n{0}", error = "Measurement Protocol Error".red().bold(), separator = separator())]
    Mp(MpError),
    #[error("{error}{separator}\n{0}", error = "Event Error".red().bold(), separator = separator())]
    Event(anyhow::Error),
    /// Validation finished and reported findings. They were printed already.
    #[error("{error}{separator}\nValidation reported {0} message(s)", error = "Invalid Event".red().bold(), separator = separator())]
    Invalid(usize),
    #[error("{error}{separator}\n{0}", error = "Error".red().bold(), separator = separator())]
    Any(anyhow::Error),
}

impl From<MpError> for MpCliError {
    fn from(e: MpError) -> Self {
        Self::Mp(e)
    }
}
