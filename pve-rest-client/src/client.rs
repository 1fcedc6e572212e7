use std::sync::{Arc, Mutex};

use serde::Serialize;

use pve_http::{HttpClient, HttpOptions, TlsOptions};
use pve_login::{Login, Ticket, TicketResult};

use crate::endpoints::ApiEndpoint;
use crate::error::Error;
use crate::params::{to_parameters, ParameterMap};
use crate::session::{self, Session};
use crate::{RequestDescriptor, ResponseEnvelope, ResponseType, Verb};

/// Send a request for `session` through `http`.
///
/// This never fails, every problem is reported by the returned [`ResponseEnvelope`].
pub fn invoke<C>(http: &C, session: &Session, request: RequestDescriptor) -> ResponseEnvelope
where
    C: HttpClient + ?Sized,
{
    log::debug!(
        "{} {} on {}",
        request.verb.method(),
        request.resource,
        session.host
    );

    let http_request = match request.to_http_request(session) {
        Ok(http_request) => http_request,
        Err(err) => {
            log::warn!("failed to build request for {}: {err}", request.resource);
            return ResponseEnvelope::from_error(request, &err.into());
        }
    };

    match http.request(http_request) {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            if !parts.status.is_success() {
                log::debug!("{} returned {}", request.resource, parts.status);
            }
            ResponseEnvelope::from_response(request, parts.status, body)
        }
        Err(err) => {
            log::warn!("request to {} failed: {err:#}", request.resource);
            ResponseEnvelope::from_error(request, &err)
        }
    }
}

/// A Proxmox VE API client for one session.
///
/// The session is kept behind a lock so a ticket refresh can replace it while the client is
/// shared.
pub struct Client<C = pve_http::client::Client> {
    session: Mutex<Arc<Session>>,
    http: C,
}

impl Client {
    /// Create a client with the default blocking transport for `session`.
    ///
    /// Certificate verification follows the session's `skip_certificate_check` flag.
    pub fn new(session: impl Into<Arc<Session>>) -> Self {
        Self::with_options(session, HttpOptions::default())
    }

    /// Like [`new`](Self::new), with custom HTTP options. The TLS mode is always taken from the
    /// session.
    pub fn with_options(session: impl Into<Arc<Session>>, mut options: HttpOptions) -> Self {
        let session = session.into();
        options.tls = TlsOptions::from_skip_certificate_check(session.skip_certificate_check);
        Self::with_client(session, pve_http::client::Client::new(options))
    }

    /// Create a client for the session last stored on this thread, see
    /// [`last_session`](crate::session::last_session).
    pub fn from_last_session() -> Result<Self, Error> {
        session::last_session()
            .map(Self::new)
            .ok_or(Error::NoSession)
    }
}

impl<C> Client<C>
where
    C: HttpClient,
{
    /// Instantiate a client for a session with a given HTTP client instance.
    pub fn with_client(session: impl Into<Arc<Session>>, http: C) -> Self {
        Self {
            session: Mutex::new(session.into()),
            http,
        }
    }

    /// Get the underlying HTTP client.
    pub fn http_client(&self) -> &C {
        &self.http
    }

    /// Get the current session.
    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.session.lock().unwrap())
    }

    /// Send a prepared request.
    pub fn request(&self, request: RequestDescriptor) -> ResponseEnvelope {
        invoke(&self.http, &self.session(), request)
    }

    /// Call `resource` with `verb` and `parameters`.
    pub fn invoke(
        &self,
        resource: &str,
        verb: Verb,
        parameters: ParameterMap,
        response_type: ResponseType,
    ) -> ResponseEnvelope {
        self.request(
            RequestDescriptor::new(verb, resource)
                .parameters(parameters)
                .response_type(response_type),
        )
    }

    pub fn get(&self, resource: &str, parameters: ParameterMap) -> ResponseEnvelope {
        self.invoke(resource, Verb::Get, parameters, ResponseType::Json)
    }

    pub fn set(&self, resource: &str, parameters: ParameterMap) -> ResponseEnvelope {
        self.invoke(resource, Verb::Set, parameters, ResponseType::Json)
    }

    pub fn create(&self, resource: &str, parameters: ParameterMap) -> ResponseEnvelope {
        self.invoke(resource, Verb::Create, parameters, ResponseType::Json)
    }

    pub fn delete(&self, resource: &str, parameters: ParameterMap) -> ResponseEnvelope {
        self.invoke(resource, Verb::Delete, parameters, ResponseType::Json)
    }

    /// Call `resource` with the parameters of a typed request.
    pub fn invoke_typed<T>(
        &self,
        resource: &str,
        verb: Verb,
        params: &T,
    ) -> Result<ResponseEnvelope, Error>
    where
        T: Serialize + ?Sized,
    {
        let parameters = to_parameters(params).map_err(Error::Parameters)?;
        Ok(self.invoke(resource, verb, parameters, ResponseType::Json))
    }

    /// Call a typed endpoint.
    pub fn call<E: ApiEndpoint>(&self, endpoint: &E) -> Result<ResponseEnvelope, Error> {
        let parameters = to_parameters(endpoint).map_err(Error::Parameters)?;
        Ok(self.request(
            RequestDescriptor::new(E::VERB, endpoint.resource())
                .parameters(parameters)
                .response_type(E::RESPONSE_TYPE),
        ))
    }

    /// Renew the session's ticket.
    ///
    /// Token sessions need no renewal. Tickets which cannot be parsed cannot be renewed.
    pub fn refresh_ticket(&self) -> Result<(), Error> {
        let current = self.session();
        if current.has_api_token() {
            return Ok(());
        }

        let ticket: Ticket = current.ticket.parse().map_err(|_| Error::NotRenewable)?;
        let login = Login::renew(&ticket);

        let response = self.invoke_typed(pve_login::TICKET_PATH, Verb::Create, &login.request())?;
        if !response.is_success() {
            return Err(Error::AuthenticationFailed(response.reason().to_string()));
        }

        match login.response(response.response())? {
            TicketResult::Full(auth) => {
                log::debug!("renewed ticket for {}", login.userid());
                let renewed = Session {
                    ticket: auth.ticket,
                    csrf_token: auth.csrfprevention_token,
                    ..Session::clone(&current)
                };
                *self.session.lock().unwrap() = Arc::new(renewed);
                Ok(())
            }
            TicketResult::TfaRequired => Err(Error::TfaRequired),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_mode_follows_session() {
        let mut session = Session::new("pve1", 8006);
        let client = Client::new(session.clone());
        assert_eq!(client.http_client().options().tls, TlsOptions::Verify);

        session.skip_certificate_check = true;
        let client = Client::new(session.clone());
        assert_eq!(client.http_client().options().tls, TlsOptions::Insecure);

        let options = HttpOptions {
            tls: TlsOptions::Verify,
            ..Default::default()
        };
        let client = Client::with_options(session, options);
        assert_eq!(client.http_client().options().tls, TlsOptions::Insecure);
    }
}
