//! Error types for the vault-rest crate.

use thiserror::Error;

/// Errors that can occur while registering or dispatching an API operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The payload failed its declared request or query schema. Carries the
    /// first violation's instance path; the request never reaches the network.
    #[error("validation failed at '{path}': {message}")]
    Validation { path: String, message: String },

    /// Underlying network or connection failure.
    #[error("HTTP request failed")]
    Transport(#[source] reqwest::Error),

    /// The call completed but the server reported failure. The message is the
    /// first entry of the server's error envelope when present, otherwise
    /// `Status <code>`.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Dispatch by a name that is not in the command table.
    #[error("unknown operation: {name}")]
    UnknownOperation { name: String },

    /// A command-table entry could not be registered: invalid or reserved
    /// name, duplicate, or malformed schema.
    #[error("invalid command table entry '{name}': {message}")]
    Command { name: String, message: String },
}
