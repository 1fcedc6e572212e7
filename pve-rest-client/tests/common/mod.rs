#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use anyhow::Error;
use http::{Request, Response};
use serde_json::Value;

use pve_rest_client::{HttpClient, Session};

type Responder = Box<dyn Fn(&Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Error>>;

/// Records every request and answers it with a fixed function.
pub struct MockHttp {
    responder: Responder,
    requests: RefCell<Vec<Request<Vec<u8>>>>,
    calls: Cell<usize>,
}

impl MockHttp {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Error> + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: RefCell::new(Vec::new()),
            calls: Cell::new(0),
        }
    }

    /// Answer everything with the same JSON document.
    pub fn json(status: u16, body: Value) -> Self {
        Self::new(move |_| json_response(status, &body))
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn with_request<R>(&self, index: usize, func: impl FnOnce(&Request<Vec<u8>>) -> R) -> R {
        func(&self.requests.borrow()[index])
    }

    pub fn uri(&self, index: usize) -> String {
        self.with_request(index, |request| request.uri().to_string())
    }

    pub fn header(&self, index: usize, name: &str) -> Option<String> {
        self.with_request(index, |request| {
            request
                .headers()
                .get(name)
                .map(|value| value.to_str().unwrap().to_string())
        })
    }

    pub fn body_json(&self, index: usize) -> Value {
        self.with_request(index, |request| {
            serde_json::from_slice(request.body()).unwrap()
        })
    }
}

impl HttpClient for MockHttp {
    fn request(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Error> {
        self.calls.set(self.calls.get() + 1);
        let response = (self.responder)(&request);
        self.requests.borrow_mut().push(request);
        response
    }
}

pub fn json_response(status: u16, body: &Value) -> Result<Response<Vec<u8>>, Error> {
    Ok(Response::builder()
        .status(status)
        .body(body.to_string().into_bytes())?)
}

pub fn ticket_session() -> Session {
    Session {
        ticket: "T".to_string(),
        csrf_token: "C".to_string(),
        ..Session::new("10.1.1.90", 8006)
    }
}
