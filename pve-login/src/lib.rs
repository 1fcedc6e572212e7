//! This package provides the helpers for logging into the Proxmox VE API: building the
//! `/access/ticket` request, interpreting its response and dealing with tickets and API tokens.

use serde_json::Value;

pub mod api;
pub mod error;
pub mod parse;
pub mod ticket;

#[doc(inline)]
pub use ticket::{ApiToken, Ticket, Validity};

use error::ResponseError;

/// The header name for the CSRF prevention token.
pub const CSRF_HEADER_NAME: &str = "CSRFPreventionToken";

/// The cookie carrying the ticket.
pub const AUTH_COOKIE_NAME: &str = "PVEAuthCookie";

/// The scheme used in the `Authorization` header for API tokens.
pub const API_TOKEN_PREFIX: &str = "PVEAPIToken";

/// The `Authorization` header value for an API token given as `USER@REALM!TOKENID=SECRET`.
pub fn api_token_header(token: &str) -> String {
    format!("{API_TOKEN_PREFIX}={token}")
}

/// The realm assumed for user names without an `@realm` suffix.
pub const DEFAULT_REALM: &str = "pam";

/// The resource path of the ticket API call.
pub const TICKET_PATH: &str = "/access/ticket";

/// Append `@pam` to a user name without a realm.
pub fn normalize_userid(username: &str) -> String {
    if username.contains('@') {
        username.to_string()
    } else {
        format!("{username}@{DEFAULT_REALM}")
    }
}

/// Login or ticket renewal request builder.
///
/// The request is a `POST` of the [`CreateTicket`](api::CreateTicket) parameters to
/// [`TICKET_PATH`], the decoded response body is passed to [`response`](Login::response).
#[derive(Debug)]
pub struct Login {
    userid: String,
    password: String,
    otp: Option<String>,
}

impl Login {
    /// Prepare a request given a user name and password.
    pub fn new(username: &str, password: impl Into<String>) -> Self {
        Self {
            userid: normalize_userid(username),
            password: password.into(),
            otp: None,
        }
    }

    /// Prepare a renewal request for a still valid ticket.
    pub fn renew(ticket: &Ticket) -> Self {
        Self {
            userid: ticket.userid().to_string(),
            password: ticket.to_string(),
            otp: None,
        }
    }

    /// Pass a one-time password along with the credentials.
    pub fn otp(mut self, otp: Option<String>) -> Self {
        self.otp = otp.filter(|otp| !otp.is_empty());
        self
    }

    /// Get the userid this request is for.
    pub fn userid(&self) -> &str {
        &self.userid
    }

    /// Whether a one-time password is sent with this request.
    pub fn has_otp(&self) -> bool {
        self.otp.is_some()
    }

    /// The parameters of the ticket request.
    pub fn request(&self) -> api::CreateTicket {
        api::CreateTicket {
            username: self.userid.clone(),
            password: self.password.clone(),
            otp: self.otp.clone(),
        }
    }

    /// Interpret the decoded body of a successful ticket request.
    pub fn response(&self, body: &Value) -> Result<TicketResult, ResponseError> {
        let response: api::ApiResponse<api::CreateTicketResponse> =
            serde_json::from_value(body.clone())?;
        let response = response.data.ok_or("missing response data")?;

        if response.need_tfa {
            return Ok(TicketResult::TfaRequired);
        }

        if let Some(username) = &response.username {
            if *username != self.userid {
                return Err("ticket response contained unexpected userid".into());
            }
        }

        Ok(TicketResult::Full(Authentication {
            ticket: response.ticket.ok_or("no ticket in response")?,
            csrfprevention_token: response
                .csrfprevention_token
                .ok_or("missing CSRFPreventionToken in ticket response")?,
            clustername: response.clustername,
        }))
    }
}

/// This is the result of a ticket call. It will either yield a ticket, or tell us that a second
/// factor is needed.
#[derive(Clone, Debug)]
pub enum TicketResult {
    /// The response contained a ticket.
    Full(Authentication),

    /// The account needs a second factor which was missing or rejected.
    TfaRequired,
}

/// A finished authentication state.
#[derive(Clone, Debug)]
pub struct Authentication {
    /// The authentication ticket, kept opaque.
    pub ticket: String,

    /// The CSRFPreventionToken header.
    pub csrfprevention_token: String,

    /// The cluster name (if any)
    pub clustername: Option<String>,
}
