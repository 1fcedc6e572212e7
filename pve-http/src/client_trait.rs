use std::sync::Arc;

use anyhow::Error;
use http::{Request, Response, StatusCode};
use thiserror::Error;

/// A blocking HTTP client.
///
/// Implementations send the request as is and hand back every response, including the ones with
/// a non-success status. Errors are reserved for the cases where no response could be obtained.
pub trait HttpClient {
    fn request(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Error>;
}

/// A transport failure which still carries a HTTP status.
///
/// Transports may return this (wrapped in an [`anyhow::Error`]) so that callers can report the
/// status instead of a generic failure.
#[derive(Clone, Debug, Error)]
#[error("{status}: {reason}")]
pub struct HttpError {
    pub status: StatusCode,
    pub reason: String,
}

impl HttpError {
    pub fn new(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// Use the canonical reason phrase of the status.
    pub fn from_status(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("unknown status");
        Self::new(status, reason)
    }
}

impl<C> HttpClient for &C
where
    C: HttpClient + ?Sized,
{
    fn request(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Error> {
        C::request(self, request)
    }
}

impl<C> HttpClient for Arc<C>
where
    C: HttpClient + ?Sized,
{
    fn request(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Error> {
        C::request(self, request)
    }
}

impl<C> HttpClient for Box<C>
where
    C: HttpClient + ?Sized,
{
    fn request(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Error> {
        C::request(self, request)
    }
}
