use thiserror::Error;

use pve_login::error::{ApiTokenError, ResponseError};

/// Errors which prevent a session from being set up or used.
///
/// Failures of individual API calls are not reported through this type but through the
/// [`ResponseEnvelope`](crate::ResponseEnvelope).
#[derive(Debug, Error)]
pub enum Error {
    /// None of the candidate hosts could be reached.
    #[error("no reachable host among the given candidates")]
    HostNotValid,

    /// The selected candidate has a port outside of `1..=65535`.
    #[error("invalid port {0}")]
    PortNotValid(i64),

    /// The ticket request failed, carries the server's reason phrase.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The account requires a second factor but none was given.
    #[error("couldn't authenticate user: missing two factor authentication (TFA)")]
    TfaRequired,

    /// Neither user credentials nor an API token were given.
    #[error("no credentials or api token given")]
    MissingCredentials,

    #[error(transparent)]
    InvalidApiToken(#[from] ApiTokenError),

    #[error(transparent)]
    BadTicketResponse(#[from] ResponseError),

    #[error("failed to serialize request parameters: {0}")]
    Parameters(#[source] serde_json::Error),

    /// No session was passed and none was stored on this thread.
    #[error("no session available, connect first")]
    NoSession,

    /// The session's ticket has an unknown format and cannot be used to renew itself.
    #[error("the session's ticket cannot be renewed")]
    NotRenewable,
}
