use serde::Serialize;

use crate::params::ParameterMap;
use crate::{ApiPathBuilder, ResponseType, Session, Verb};

/// A single API call: which resource, how, and with what.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequestDescriptor {
    /// The resource path with its path parameters already filled in.
    pub resource: String,
    pub verb: Verb,
    pub parameters: ParameterMap,
    pub response_type: ResponseType,
}

impl RequestDescriptor {
    pub fn new(verb: Verb, resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            verb,
            parameters: ParameterMap::new(),
            response_type: ResponseType::Json,
        }
    }

    pub fn get(resource: impl Into<String>) -> Self {
        Self::new(Verb::Get, resource)
    }

    pub fn set(resource: impl Into<String>) -> Self {
        Self::new(Verb::Set, resource)
    }

    pub fn create(resource: impl Into<String>) -> Self {
        Self::new(Verb::Create, resource)
    }

    pub fn delete(resource: impl Into<String>) -> Self {
        Self::new(Verb::Delete, resource)
    }

    pub fn parameters(mut self, parameters: ParameterMap) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// The path including the query string for `GET` and `DELETE` requests.
    pub fn path_and_query(&self) -> String {
        let builder = ApiPathBuilder::api(self.response_type, &self.resource);
        if !self.verb.uses_query() {
            return builder.build();
        }

        self.parameters
            .iter()
            .fold(builder, |builder, (name, value)| {
                builder.value_arg(name, value)
            })
            .build()
    }

    /// The JSON body for `POST` and `PUT` requests, `{}` if there are no parameters.
    pub fn body(&self) -> Option<Vec<u8>> {
        if self.verb.uses_query() {
            None
        } else {
            Some(self.parameters.to_json_body().to_string().into_bytes())
        }
    }

    /// Build the HTTP request for `session` including the authentication headers.
    pub fn to_http_request(
        &self,
        session: &Session,
    ) -> Result<http::Request<Vec<u8>>, http::Error> {
        let uri = format!("{}{}", session.base_url(), self.path_and_query());

        let mut request = http::Request::builder()
            .method(self.verb.method())
            .uri(uri)
            .header(pve_login::CSRF_HEADER_NAME, session.csrf_token.as_str());

        if session.has_ticket() {
            request = request.header(
                http::header::COOKIE,
                format!("{}={}", pve_login::AUTH_COOKIE_NAME, session.ticket),
            );
        }

        if session.has_api_token() {
            request = request.header(
                http::header::AUTHORIZATION,
                pve_login::api_token_header(&session.api_token),
            );
        }

        match self.body() {
            Some(body) => request
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(body),
            None => request.body(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn session() -> Session {
        Session {
            ticket: "PVE:root@pam:65A1B2C3::sig".to_string(),
            csrf_token: "65A1B2C3:csrf".to_string(),
            ..Session::new("10.1.1.90", 8006)
        }
    }

    #[test]
    fn query_for_get_and_delete() {
        let params = ParameterMap::new().with("full", true).with("vmid", 100);

        for request in [
            RequestDescriptor::get("/cluster/resources"),
            RequestDescriptor::delete("/cluster/resources"),
        ] {
            let request = request.parameters(params.clone());
            assert_eq!(
                request.path_and_query(),
                "/api2/json/cluster/resources?full=1&vmid=100"
            );
            assert_eq!(request.body(), None);
        }

        assert_eq!(
            RequestDescriptor::get("/version").path_and_query(),
            "/api2/json/version"
        );
    }

    #[test]
    fn body_for_create_and_set() {
        let params = ParameterMap::new().with("force", false).with("name", "vm1");

        for request in [
            RequestDescriptor::create("/nodes/pve1/qemu"),
            RequestDescriptor::set("/nodes/pve1/qemu"),
        ] {
            let request = request.parameters(params.clone());
            assert_eq!(request.path_and_query(), "/api2/json/nodes/pve1/qemu");
            let body: serde_json::Value = serde_json::from_slice(&request.body().unwrap()).unwrap();
            assert_eq!(body, json!({ "force": 0, "name": "vm1" }));
        }
    }

    #[test]
    fn http_request_headers() {
        let request = RequestDescriptor::create("/nodes/pve1/qemu/100/status/start")
            .to_http_request(&session())
            .unwrap();

        assert_eq!(request.method(), http::Method::POST);
        assert_eq!(
            request.uri().to_string(),
            "https://10.1.1.90:8006/api2/json/nodes/pve1/qemu/100/status/start"
        );
        assert_eq!(request.headers()["CSRFPreventionToken"], "65A1B2C3:csrf");
        assert_eq!(
            request.headers()[http::header::COOKIE],
            "PVEAuthCookie=PVE:root@pam:65A1B2C3::sig"
        );
        assert_eq!(
            request.headers()[http::header::CONTENT_TYPE],
            "application/json"
        );
        assert!(request.headers().get(http::header::AUTHORIZATION).is_none());
        assert_eq!(request.body(), b"{}");
    }

    #[test]
    fn token_request_headers() {
        let session = Session::with_api_token("pve1", 8006, "root@pam!ci=1234");
        let request = RequestDescriptor::get("/version")
            .response_type(ResponseType::Extjs)
            .to_http_request(&session)
            .unwrap();

        assert_eq!(request.method(), http::Method::GET);
        assert_eq!(
            request.uri().to_string(),
            "https://pve1:8006/api2/extjs/version"
        );
        assert_eq!(
            request.headers()[http::header::AUTHORIZATION],
            "PVEAPIToken=root@pam!ci=1234"
        );
        assert_eq!(request.headers()["CSRFPreventionToken"], "");
        assert!(request.headers().get(http::header::COOKIE).is_none());
        assert!(request.body().is_empty());
    }
}
