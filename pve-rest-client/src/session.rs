//! Session data and the per-thread "last used session".

use std::cell::RefCell;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use pve_login::{Ticket, Validity};

/// The port the Proxmox VE API listens on.
pub const DEFAULT_PORT: u16 = 8006;

/// An authenticated (or token based) session with one API endpoint.
///
/// Exactly one credential is meant to be active: either `ticket` + `csrf_token` or `api_token`.
/// If an API token is set, it decides how the server authenticates the request.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Session {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub skip_certificate_check: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ticket: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub csrf_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_token: String,
}

impl Session {
    /// A session without credentials, used to obtain a ticket.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// A session authenticated by an API token.
    pub fn with_api_token(
        host: impl Into<String>,
        port: u16,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            api_token: api_token.into(),
            ..Self::new(host, port)
        }
    }

    /// `https://{host}:{port}`, IPv6 addresses are put in brackets.
    pub fn base_url(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("https://[{}]:{}", self.host, self.port)
        } else {
            format!("https://{}:{}", self.host, self.port)
        }
    }

    pub fn has_api_token(&self) -> bool {
        !self.api_token.is_empty()
    }

    pub fn has_ticket(&self) -> bool {
        !self.ticket.is_empty()
    }

    /// Validity of the ticket, `None` for token sessions and tickets we cannot parse.
    pub fn ticket_validity(&self) -> Option<Validity> {
        if self.has_api_token() {
            return None;
        }
        self.ticket
            .parse::<Ticket>()
            .ok()
            .map(|ticket| ticket.validity())
    }
}

/// A `host[:port]` candidate for [`Connector`](crate::Connector).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostAndPort {
    pub host: String,
    /// Kept signed so an invalid port can be reported once the candidate is selected.
    pub port: i64,
}

impl HostAndPort {
    /// Parse `host`, `host:port`, `[v6addr]` or `[v6addr]:port`.
    ///
    /// A port which is not a number falls back to [`DEFAULT_PORT`].
    pub fn parse(candidate: &str) -> Self {
        let candidate = candidate.trim();

        let (host, port) = if let Some(rest) = candidate.strip_prefix('[') {
            match rest.split_once(']') {
                Some((host, tail)) => (host, tail.strip_prefix(':')),
                None => (rest, None),
            }
        } else {
            match candidate.split_once(':') {
                // more than one colon: a bare IPv6 address
                Some((_, port)) if port.contains(':') => (candidate, None),
                Some((host, port)) => (host, Some(port)),
                None => (candidate, None),
            }
        };

        let port = port
            .and_then(|port| port.trim().parse::<i64>().ok())
            .unwrap_or(i64::from(DEFAULT_PORT));

        Self {
            host: host.to_string(),
            port,
        }
    }

    /// The port if it is a usable TCP port.
    pub fn valid_port(&self) -> Option<u16> {
        u16::try_from(self.port).ok().filter(|port| *port > 0)
    }
}

impl std::str::FromStr for HostAndPort {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

thread_local! {
    static LAST_SESSION: RefCell<Option<Arc<Session>>> = const { RefCell::new(None) };
}

/// The session most recently stored on this thread, usually by a successful connect.
pub fn last_session() -> Option<Arc<Session>> {
    LAST_SESSION.with(|last| last.borrow().clone())
}

/// Remember a session as the last used one on this thread.
pub fn set_last_session(session: Arc<Session>) {
    LAST_SESSION.with(|last| *last.borrow_mut() = Some(session));
}

/// Forget the last used session of this thread.
pub fn clear_last_session() -> Option<Arc<Session>> {
    LAST_SESSION.with(|last| last.borrow_mut().take())
}

/// Restores the previously stored session when dropped.
pub struct SessionGuard(Option<Arc<Session>>);

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let previous = self.0.take();
        LAST_SESSION.with(|last| *last.borrow_mut() = previous);
    }
}

/// Make `session` the last used session until the returned guard is dropped.
pub fn push_session(session: Arc<Session>) -> SessionGuard {
    SessionGuard(LAST_SESSION.with(|last| last.borrow_mut().replace(session)))
}

/// Run `func` with `session` as the last used session, restoring the previous one afterwards.
pub fn with_session<R>(session: Arc<Session>, func: impl FnOnce() -> R) -> R {
    let _guard = push_session(session);
    func()
}
