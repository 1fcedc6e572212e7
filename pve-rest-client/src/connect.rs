//! Establishing a [`Session`].

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use pve_http::{HttpClient, HttpOptions, TlsOptions};
use pve_login::{ApiToken, Login, TicketResult};

use crate::client::invoke;
use crate::error::Error;
use crate::params::to_parameters;
use crate::session::{self, HostAndPort, Session, DEFAULT_PORT};
use crate::{Client, RequestDescriptor};

/// Decides whether a candidate host is worth connecting to.
pub trait ReachabilityProbe {
    fn is_reachable(&self, candidate: &HostAndPort) -> bool;
}

impl<F> ReachabilityProbe for F
where
    F: Fn(&HostAndPort) -> bool,
{
    fn is_reachable(&self, candidate: &HostAndPort) -> bool {
        self(candidate)
    }
}

/// Probe with a single TCP connection attempt.
///
/// Candidates with an invalid port are probed on the default port, the invalid port is reported
/// once such a candidate is selected.
#[derive(Clone, Debug)]
pub struct TcpProbe {
    pub timeout: Duration,
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
        }
    }
}

impl ReachabilityProbe for TcpProbe {
    fn is_reachable(&self, candidate: &HostAndPort) -> bool {
        let port = candidate.valid_port().unwrap_or(DEFAULT_PORT);
        let addrs = match (candidate.host.as_str(), port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(err) => {
                log::debug!("cannot resolve {}: {err}", candidate.host);
                return false;
            }
        };

        addrs
            .into_iter()
            .any(|addr| {
                TcpStream::connect_timeout(&addr, self.timeout).is_ok()
            })
    }
}

/// Builder for the connect operation.
///
/// ```no_run
/// use pve_rest_client::Connector;
///
/// # fn main() -> Result<(), pve_rest_client::Error> {
/// let session = Connector::new(["10.1.1.90:8006", "10.1.1.91"])
///     .credentials("root", "secret")
///     .skip_certificate_check(true)
///     .connect()?;
/// # Ok(())
/// # }
/// ```
pub struct Connector {
    candidates: Vec<HostAndPort>,
    username: String,
    password: String,
    api_token: String,
    otp: Option<String>,
    skip_certificate_check: bool,
    skip_refresh_last: bool,
    probe: Box<dyn ReachabilityProbe>,
    http_options: HttpOptions,
}

impl Connector {
    /// Start with an ordered list of `host[:port]` candidates.
    pub fn new<I, S>(hosts_and_ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            candidates: hosts_and_ports
                .into_iter()
                .map(|candidate| HostAndPort::parse(candidate.as_ref()))
                .collect(),
            username: String::new(),
            password: String::new(),
            api_token: String::new(),
            otp: None,
            skip_certificate_check: false,
            skip_refresh_last: false,
            probe: Box::new(TcpProbe::default()),
            http_options: HttpOptions::default(),
        }
    }

    /// Log in with a user name and password. Names without a realm are taken as `@pam` users.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Use an API token (`USER@REALM!TOKENID=SECRET`) instead of logging in.
    pub fn api_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = api_token.into();
        self
    }

    /// Pass a one-time password for accounts with a second factor.
    pub fn otp(mut self, otp: impl Into<String>) -> Self {
        self.otp = Some(otp.into());
        self
    }

    pub fn skip_certificate_check(mut self, skip: bool) -> Self {
        self.skip_certificate_check = skip;
        self
    }

    /// Do not store the new session as this thread's last used session.
    pub fn skip_refresh_last(mut self, skip: bool) -> Self {
        self.skip_refresh_last = skip;
        self
    }

    pub fn probe(mut self, probe: impl ReachabilityProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Options for the HTTP client used by [`connect`](Self::connect) and
    /// [`connect_client`](Self::connect_client).
    pub fn http_options(mut self, options: HttpOptions) -> Self {
        self.http_options = options;
        self
    }

    /// The first reachable candidate.
    pub fn select_host(&self) -> Result<(String, u16), Error> {
        let candidate = self
            .candidates
            .iter()
            .find(|candidate| {
                let reachable = self.probe.is_reachable(candidate);
                if !reachable {
                    log::info!("host {} is not reachable", candidate.host);
                }
                reachable
            })
            .ok_or(Error::HostNotValid)?;

        let port = candidate
            .valid_port()
            .ok_or(Error::PortNotValid(candidate.port))?;

        Ok((candidate.host.clone(), port))
    }

    /// Connect using the default blocking HTTP client.
    pub fn connect(&self) -> Result<Session, Error> {
        let mut options = self.http_options.clone();
        options.tls = TlsOptions::from_skip_certificate_check(self.skip_certificate_check);
        self.connect_with(&pve_http::client::Client::new(options))
    }

    /// Connect and wrap the session into a [`Client`].
    pub fn connect_client(&self) -> Result<Client, Error> {
        let session = self.connect()?;
        Ok(Client::with_options(session, self.http_options.clone()))
    }

    /// Connect using the given HTTP client.
    pub fn connect_with<C>(&self, http: &C) -> Result<Session, Error>
    where
        C: HttpClient + ?Sized,
    {
        let (host, port) = self.select_host()?;

        let mut session = Session::new(host, port);
        session.skip_certificate_check = self.skip_certificate_check;

        if !self.api_token.is_empty() {
            self.api_token.parse::<ApiToken>()?;
            session.api_token = self.api_token.clone();
        } else {
            self.login(http, &mut session)?;
        }

        log::info!("connected to {}:{}", session.host, session.port);

        if !self.skip_refresh_last {
            session::set_last_session(Arc::new(session.clone()));
        }

        Ok(session)
    }

    fn login<C>(&self, http: &C, session: &mut Session) -> Result<(), Error>
    where
        C: HttpClient + ?Sized,
    {
        if self.username.is_empty() {
            return Err(Error::MissingCredentials);
        }

        let login = Login::new(&self.username, self.password.clone()).otp(self.otp.clone());
        let parameters = to_parameters(&login.request()).map_err(Error::Parameters)?;

        let response = invoke(
            http,
            session,
            RequestDescriptor::create(pve_login::TICKET_PATH).parameters(parameters),
        );
        if !response.is_success() {
            return Err(Error::AuthenticationFailed(response.reason().to_string()));
        }

        match login.response(response.response())? {
            TicketResult::Full(auth) => {
                session.ticket = auth.ticket;
                session.csrf_token = auth.csrfprevention_token;
                Ok(())
            }
            TicketResult::TfaRequired if login.has_otp() => Err(Error::AuthenticationFailed(
                "second factor was rejected".to_string(),
            )),
            TicketResult::TfaRequired => Err(Error::TfaRequired),
        }
    }
}
