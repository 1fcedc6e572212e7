//! Ticket and API token data.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ApiTokenError, TicketError};

/// A parsed `PVE:user@realm:HEXTIME::signature` ticket.
///
/// Sessions store tickets as opaque strings, this is only used to look at the user id and age of
/// a ticket the server handed out.
#[derive(Clone, Debug)]
pub struct Ticket {
    data: Box<str>,
    timestamp: i64,
    product_len: u16,
    userid_len: u16,
}

/// Tickets are valid for 2 hours.
const TICKET_LIFETIME: i64 = 2 * 3600;
/// We refresh during the last half hour.
const REFRESH_EARLY_BY: i64 = 1800;

impl Ticket {
    /// The ticket's product prefix.
    pub fn product(&self) -> &str {
        &self.data[..usize::from(self.product_len)]
    }

    /// The userid contained in the ticket.
    pub fn userid(&self) -> &str {
        let start = usize::from(self.product_len) + 1;
        &self.data[start..(start + usize::from(self.userid_len))]
    }

    /// The ticket's timestamp as a UNIX epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// The ticket age in seconds.
    pub fn age(&self) -> i64 {
        epoch_i64() - self.timestamp
    }

    /// Check the ticket's validity assuming the usual ticket lifetime of 2 hours.
    pub fn validity(&self) -> Validity {
        Validity::for_age(self.age())
    }
}

/// Whether a ticket should be refreshed or is already invalid and needs to be completely renewed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Validity {
    /// The ticket is still valid for longer than half an hour.
    Valid,

    /// The ticket is within its final half hour validity period and should be renewed with the
    /// ticket as password.
    Refresh,

    /// The ticket is already invalid and a new ticket needs to be created.
    Expired,
}

impl Validity {
    fn for_age(age: i64) -> Self {
        if age > TICKET_LIFETIME {
            Validity::Expired
        } else if age >= TICKET_LIFETIME - REFRESH_EARLY_BY {
            Validity::Refresh
        } else {
            Validity::Valid
        }
    }

    /// Whether the ticket is still accepted by the server, even if it should be renewed.
    pub fn is_valid(self) -> bool {
        matches!(self, Validity::Valid | Validity::Refresh)
    }
}

impl std::str::FromStr for Ticket {
    type Err = TicketError;

    fn from_str(data: &str) -> Result<Self, TicketError> {
        let (product, rest) = data.split_once(':').ok_or(TicketError)?;
        if product.is_empty() || product.len() >= 10 {
            return Err(TicketError);
        }

        let (userid, rest) = rest.split_once(':').ok_or(TicketError)?;
        if !userid.contains('@') {
            return Err(TicketError);
        }

        let (timestamp, rest) = rest.split_once(':').ok_or(TicketError)?;
        let timestamp = i64::from_str_radix(timestamp, 16).map_err(|_| TicketError)?;

        // the signature is separated by a double colon
        match rest.strip_prefix(':') {
            Some(signature) if !signature.is_empty() => (),
            _ => return Err(TicketError),
        }

        Ok(Self {
            product_len: u16::try_from(product.len()).map_err(|_| TicketError)?,
            userid_len: u16::try_from(userid.len()).map_err(|_| TicketError)?,
            timestamp,
            data: data.into(),
        })
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.data)
    }
}

impl From<Ticket> for String {
    fn from(ticket: Ticket) -> String {
        ticket.data.into()
    }
}

/// A long lived API token in the form `USER@REALM!TOKENID=SECRET`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiToken {
    userid: String,
    tokenid: String,
    secret: String,
}

impl ApiToken {
    /// The user owning the token, including the realm.
    pub fn userid(&self) -> &str {
        &self.userid
    }

    /// The token's name.
    pub fn tokenid(&self) -> &str {
        &self.tokenid
    }
}

impl std::str::FromStr for ApiToken {
    type Err = ApiTokenError;

    fn from_str(s: &str) -> Result<Self, ApiTokenError> {
        let (authid, secret) = s.split_once('=').ok_or(ApiTokenError)?;
        let (userid, tokenid) = authid.split_once('!').ok_or(ApiTokenError)?;

        match userid.split_once('@') {
            Some((name, realm)) if !name.is_empty() && !realm.is_empty() => (),
            _ => return Err(ApiTokenError),
        }

        if tokenid.is_empty() || secret.is_empty() {
            return Err(ApiTokenError);
        }

        Ok(Self {
            userid: userid.to_string(),
            tokenid: tokenid.to_string(),
            secret: secret.to_string(),
        })
    }
}

impl fmt::Display for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}!{}={}", self.userid, self.tokenid, self.secret)
    }
}

impl Serialize for ApiToken {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApiToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        std::borrow::Cow::<'de, str>::deserialize(deserializer)?
            .parse()
            .map_err(D::Error::custom)
    }
}

fn epoch_i64() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
        Err(err) => -i64::try_from(err.duration().as_secs()).unwrap_or(i64::MAX),
    }
}
