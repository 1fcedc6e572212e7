use anyhow::Error;
use http::{Request, Response, StatusCode};

use crate::{HttpClient, HttpError, HttpOptions, TlsOptions};

const DEFAULT_USER_AGENT: &str = concat!("pve-rest-client/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP client for usage with [`HttpClient`].
#[derive(Default)]
pub struct Client {
    options: HttpOptions,
}

impl Client {
    pub fn new(options: HttpOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &HttpOptions {
        &self.options
    }

    fn agent(&self) -> ureq::Agent {
        let tls_config = ureq::tls::TlsConfig::builder()
            .provider(ureq::tls::TlsProvider::NativeTls)
            .root_certs(ureq::tls::RootCerts::PlatformVerifier)
            .disable_verification(self.options.tls == TlsOptions::Insecure)
            .build();

        let user_agent = self
            .options
            .user_agent
            .as_deref()
            .unwrap_or(DEFAULT_USER_AGENT);

        ureq::Agent::config_builder()
            .tls_config(tls_config)
            .user_agent(user_agent)
            .timeout_global(self.options.timeout)
            .http_status_as_error(false)
            .build()
            .into()
    }

    fn convert_response(res: Response<ureq::Body>) -> Result<Response<Vec<u8>>, Error> {
        let (parts, mut body) = res.into_parts();
        let body = body.read_to_vec()?;
        Ok(Response::from_parts(parts, body))
    }
}

fn convert_error(err: ureq::Error) -> Error {
    match err {
        ureq::Error::StatusCode(code) => match StatusCode::from_u16(code) {
            Ok(status) => HttpError::from_status(status).into(),
            Err(_) => Error::from(err),
        },
        err => Error::from(err),
    }
}

impl HttpClient for Client {
    fn request(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Error> {
        let (parts, body) = request.into_parts();
        log::trace!("{} {}", parts.method, parts.uri);

        let agent = self.agent();
        let response = if body.is_empty() {
            agent.run(Request::from_parts(parts, ureq::SendBody::none()))
        } else {
            agent.run(Request::from_parts(parts, body.as_slice()))
        };

        response
            .map_err(convert_error)
            .and_then(Self::convert_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_keep_their_status() {
        let err = convert_error(ureq::Error::StatusCode(595));
        let err = err.downcast_ref::<HttpError>().unwrap();
        assert_eq!(err.status.as_u16(), 595);

        let err = convert_error(ureq::Error::StatusCode(401));
        let err = err.downcast_ref::<HttpError>().unwrap();
        assert_eq!(err.reason, "Unauthorized");
    }
}
