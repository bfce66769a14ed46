use thiserror::Error;

/// Failures originating in the CLI itself rather than in a collaborator
/// API. Every fatal error exits with code 1; the kind only shapes the
/// message.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Validation(String),
    #[error("configuration error: {0}")]
    Config(String),
}
