//! API types used during authentication.

use serde::{Deserialize, Serialize};

/// The JSON parameter object for the `/api2/json/access/ticket` API call.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateTicket {
    /// One-time password for Two-factor authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,

    /// The secret password. This can also be a valid ticket.
    pub password: String,

    /// User name, always including the `@realm` part.
    pub username: String,
}

/// The API response for an `api2/json/access/ticket` call.
///
/// Every field is optional since a response requesting a second factor only carries part of
/// them, and older servers do not echo the username.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateTicketResponse {
    /// The CSRF prevention token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "CSRFPreventionToken")]
    pub csrfprevention_token: Option<String>,

    /// The cluster's visual name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustername: Option<String>,

    /// The ticket as is supposed to be used in the authentication cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,

    /// The full userid with the `@realm` part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Set when the account has a second factor configured which was not provided.
    #[serde(default, rename = "NeedTFA")]
    #[serde(deserialize_with = "crate::parse::deserialize_bool")]
    pub need_tfa: bool,
}

#[derive(Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
}
