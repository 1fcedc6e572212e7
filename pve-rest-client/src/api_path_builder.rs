use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::ResponseType;

/// Everything except the RFC 3986 "unreserved" characters gets encoded.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Builder for API paths with a query.
///
/// ```rust
/// use pve_rest_client::{ApiPathBuilder, ResponseType};
///
/// let node = "pve01";
/// let query = ApiPathBuilder::api(ResponseType::Json, &format!("/nodes/{node}/storage"))
///     .arg("storage", "my storage")
///     .bool_arg("enabled", true)
///     .build();
///
/// assert_eq!(&query, "/api2/json/nodes/pve01/storage?storage=my%20storage&enabled=1");
/// ```
#[derive(Clone, Debug)]
pub struct ApiPathBuilder {
    url: String,
    separator: char,
}

impl ApiPathBuilder {
    /// Creates a new builder from a base path.
    pub fn new<'a>(base: impl Into<Cow<'a, str>>) -> Self {
        Self {
            url: base.into().into_owned(),
            separator: '?',
        }
    }

    /// Creates a builder for `/api2[/{response_type}]{resource}`.
    ///
    /// A missing leading slash on the resource is added.
    pub fn api(response_type: ResponseType, resource: &str) -> Self {
        let mut url = String::from("/api2");
        if response_type != ResponseType::Raw {
            url.push('/');
            url.push_str(&response_type.to_string());
        }
        if !resource.starts_with('/') {
            url.push('/');
        }
        url.push_str(resource);
        Self::new(url)
    }

    /// Adds an argument to the query.
    ///
    /// The name and value will be percent-encoded.
    pub fn arg<T: std::fmt::Display>(mut self, name: &str, value: T) -> Self {
        self.push_separator_and_name(name);
        self.push_encoded(value.to_string().as_bytes());
        self
    }

    /// Adds an optional argument to the query.
    ///
    /// Does nothing if the value is `None`. See [`arg`](Self::arg) for more details.
    pub fn maybe_arg<T: std::fmt::Display>(mut self, name: &str, value: &Option<T>) -> Self {
        if let Some(value) = value {
            self = self.arg(name, value);
        }
        self
    }

    /// Adds a boolean argument, `true` is sent as `1` and `false` as `0`.
    pub fn bool_arg(mut self, name: &str, value: bool) -> Self {
        self.push_separator_and_name(name);
        self.url.push(if value { '1' } else { '0' });
        self
    }

    /// Adds a JSON parameter value.
    ///
    /// Booleans are sent as `1`/`0`, arrays repeat the parameter for every element, objects are
    /// sent as compact JSON and `null` is skipped.
    pub fn value_arg(self, name: &str, value: &Value) -> Self {
        match value {
            Value::Null => self,
            Value::Bool(b) => self.bool_arg(name, *b),
            Value::String(s) => self.arg(name, s),
            Value::Number(n) => self.arg(name, n),
            Value::Array(list) => list
                .iter()
                .fold(self, |this, value| this.value_arg(name, value)),
            Value::Object(_) => self.arg(name, value),
        }
    }

    /// Builds the url.
    pub fn build(self) -> String {
        self.url
    }

    fn push_separator_and_name(&mut self, name: &str) {
        self.url.push(self.separator);
        self.separator = '&';
        self.push_encoded(name.as_bytes());
        self.url.push('=');
    }

    fn push_encoded(&mut self, value: &[u8]) {
        self.url
            .extend(percent_encoding::percent_encode(value, QUERY_ENCODE_SET));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_builder() {
        let query = ApiPathBuilder::api(ResponseType::Json, "/cluster/resources")
            .arg("type", "vm")
            .build();
        assert_eq!(&query, "/api2/json/cluster/resources?type=vm");

        let snapshot = None::<&str>;
        let query = ApiPathBuilder::api(ResponseType::Extjs, "nodes/pve1/qemu/100/config")
            .arg("current", 1)
            .maybe_arg("snapshot", &snapshot)
            .build();
        assert_eq!(&query, "/api2/extjs/nodes/pve1/qemu/100/config?current=1");

        let query = ApiPathBuilder::api(ResponseType::Raw, "/nodes/pve1/qemu/100/spiceproxy")
            .build();
        assert_eq!(&query, "/api2/nodes/pve1/qemu/100/spiceproxy");
    }

    #[test]
    fn test_encoding() {
        let query = ApiPathBuilder::new("/api2/json/nodes/pve1/tasks")
            .arg("local-only", "a&b=c #d")
            .arg("vmid", 100)
            .build();
        assert_eq!(
            &query,
            "/api2/json/nodes/pve1/tasks?local-only=a%26b%3Dc%20%23d&vmid=100"
        );
    }

    #[test]
    fn test_value_args() {
        let query = ApiPathBuilder::new("/api2/json/x")
            .value_arg("history", &json!(true))
            .value_arg("local", &json!(false))
            .value_arg("skip", &Value::Null)
            .value_arg("ids", &json!(["a", 2]))
            .value_arg("limit", &json!(1.5))
            .build();
        assert_eq!(
            &query,
            "/api2/json/x?history=1&local=0&ids=a&ids=2&limit=1.5"
        );

        let query = ApiPathBuilder::new("/api2/json/x")
            .value_arg("filter", &json!({ "a": 1 }))
            .build();
        assert_eq!(&query, "/api2/json/x?filter=%7B%22a%22%3A1%7D");
    }
}
