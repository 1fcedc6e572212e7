//! Error types.

use thiserror::Error;

/// Ticket parsing error.
#[derive(Clone, Copy, Debug, Error)]
#[error("invalid ticket")]
pub struct TicketError;

/// API token parsing error.
#[derive(Clone, Copy, Debug, Error)]
#[error("invalid api token, expected 'USER@REALM!TOKENID=SECRET'")]
pub struct ApiTokenError;

/// Error parsing an API response.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// An error happened when decoding the JSON response.
    #[error("bad ticket response: {0}")]
    Json(#[from] serde_json::Error),

    /// Some unexpected error occurred.
    #[error("bad ticket response: {0}")]
    Msg(&'static str),
}

impl From<&'static str> for ResponseError {
    fn from(err: &'static str) -> Self {
        ResponseError::Msg(err)
    }
}
