use std::time::Duration;

/// How to verify the server's certificate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TlsOptions {
    /// Default TLS verification against the platform's trust store.
    #[default]
    Verify,

    /// Insecure: ignore invalid certificates.
    Insecure,
}

impl TlsOptions {
    /// Map the "skip certificate check" flag of a session.
    pub fn from_skip_certificate_check(skip: bool) -> Self {
        if skip {
            TlsOptions::Insecure
        } else {
            TlsOptions::Verify
        }
    }
}

/// Options for an HTTP client.
#[derive(Clone, Debug, Default)]
pub struct HttpOptions {
    /// `User-Agent` header value
    pub user_agent: Option<String>,
    /// Upper bound for a whole request, unlimited by default.
    pub timeout: Option<Duration>,
    /// Certificate verification.
    pub tls: TlsOptions,
}
