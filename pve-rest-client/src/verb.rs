use http::Method;
use serde::{Deserialize, Serialize};

/// The four logical operations of the API.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// Read a resource (`GET`).
    Get,
    /// Update a resource (`PUT`).
    Set,
    /// Create a resource or trigger an action (`POST`).
    Create,
    /// Remove a resource (`DELETE`).
    Delete,
}
serde_plain::derive_display_from_serialize!(Verb);
serde_plain::derive_fromstr_from_deserialize!(Verb);

impl Verb {
    /// The HTTP method this verb is sent as.
    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Set => Method::PUT,
            Verb::Create => Method::POST,
            Verb::Delete => Method::DELETE,
        }
    }

    /// Parameters of `GET` and `DELETE` requests go into the query string, the others are sent
    /// as JSON body.
    pub fn uses_query(self) -> bool {
        matches!(self, Verb::Get | Verb::Delete)
    }
}

/// The formatter selected by the `/api2/{format}` path segment.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Json,
    Extjs,
    Html,
    Text,
    Png,
    /// No formatter segment at all, the endpoint returns its payload as is.
    #[serde(rename = "")]
    Raw,
}
serde_plain::derive_display_from_serialize!(ResponseType);
serde_plain::derive_fromstr_from_deserialize!(ResponseType);

impl ResponseType {
    /// Whether the body is expected to be a JSON document.
    pub fn is_json(self) -> bool {
        matches!(self, ResponseType::Json | ResponseType::Extjs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_method_mapping() {
        assert_eq!(Verb::Get.method(), Method::GET);
        assert_eq!(Verb::Set.method(), Method::PUT);
        assert_eq!(Verb::Create.method(), Method::POST);
        assert_eq!(Verb::Delete.method(), Method::DELETE);
    }

    #[test]
    fn response_type_names() {
        assert_eq!(ResponseType::Json.to_string(), "json");
        assert_eq!(ResponseType::Extjs.to_string(), "extjs");
        assert_eq!(ResponseType::Raw.to_string(), "");
        assert_eq!("png".parse::<ResponseType>().unwrap(), ResponseType::Png);
        assert_eq!("".parse::<ResponseType>().unwrap(), ResponseType::Raw);
        assert_eq!("create".parse::<Verb>().unwrap(), Verb::Create);
        assert!("xml".parse::<ResponseType>().is_err());
    }
}
