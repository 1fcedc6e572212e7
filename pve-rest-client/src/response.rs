//! The uniform result of every API call.

use std::io::{self, Write};

use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use pve_http::HttpError;

use crate::params::ParameterMap;
use crate::{RequestDescriptor, ResponseType, Verb};

/// Status reported when the request failed without any HTTP status.
pub const NO_STATUS: i32 = -1;

/// The decoded response of an API call together with the request that produced it.
///
/// Invoking a request never fails, transport problems and HTTP errors are reported through
/// [`is_success`](Self::is_success), [`status`](Self::status) and [`reason`](Self::reason).
/// Application level errors sent with a successful status are reported by
/// [`is_error`](Self::is_error).
#[derive(Clone, Debug)]
pub struct ResponseEnvelope {
    response: Value,
    raw_body: Vec<u8>,
    status: i32,
    success: bool,
    reason: String,
    request: RequestDescriptor,
}

impl ResponseEnvelope {
    /// Wrap a received HTTP response.
    ///
    /// For error statuses the server's `message` is used as reason when the body carries one,
    /// otherwise the canonical reason phrase of the status.
    pub fn from_response(request: RequestDescriptor, status: StatusCode, body: Vec<u8>) -> Self {
        let response = decode_body(request.response_type, &body);
        let message = response["message"]
            .as_str()
            .map(str::trim)
            .filter(|message| !message.is_empty() && !status.is_success());
        let reason = message
            .or_else(|| status.canonical_reason())
            .map(str::to_string)
            .unwrap_or_else(|| status.as_str().to_string());

        Self {
            response,
            raw_body: body,
            status: i32::from(status.as_u16()),
            success: status.is_success(),
            reason,
            request,
        }
    }

    /// Wrap a failed request.
    ///
    /// If the error is a [`HttpError`] its status and reason are used, otherwise the status is
    /// [`NO_STATUS`] and the reason is the error message.
    pub fn from_error(request: RequestDescriptor, err: &anyhow::Error) -> Self {
        let (status, reason) = match err.downcast_ref::<HttpError>() {
            Some(err) => (i32::from(err.status.as_u16()), err.reason.clone()),
            None => (NO_STATUS, format!("{err:#}")),
        };

        Self {
            response: Value::Null,
            raw_body: Vec::new(),
            status,
            success: false,
            reason,
            request,
        }
    }

    /// The decoded body.
    pub fn response(&self) -> &Value {
        &self.response
    }

    /// The undecoded body, e.g. for `png` responses.
    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    /// The HTTP status, or [`NO_STATUS`].
    pub fn status(&self) -> i32 {
        self.status
    }

    /// Whether the request went through with a success status.
    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    pub fn resource(&self) -> &str {
        &self.request.resource
    }

    pub fn verb(&self) -> Verb {
        self.request.verb
    }

    pub fn parameters(&self) -> &ParameterMap {
        &self.request.parameters
    }

    pub fn response_type(&self) -> ResponseType {
        self.request.response_type
    }

    /// Whether the body carries an `error` field, independent of the HTTP status.
    pub fn is_error(&self) -> bool {
        self.response.get("error").is_some_and(|err| !err.is_null())
    }

    /// The payload in the `data` field, `null` if there is none.
    pub fn data(&self) -> &Value {
        &self.response["data"]
    }

    /// Deserialize the `data` field.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(self.data())
    }

    /// Render [`data`](Self::data) as a plain text table.
    pub fn to_table(&self) -> String {
        let (columns, rows) = tabulate(self.data());

        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, label)| {
                rows.iter()
                    .map(|row| row[i].chars().count())
                    .fold(label.chars().count(), usize::max)
            })
            .collect();

        let mut out = String::new();
        let mut push_line = |cells: &[String]| {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:width$}"))
                .collect();
            out.push_str(line.join("  ").trim_end());
            out.push('\n');
        };

        push_line(&columns);
        for row in &rows {
            push_line(row);
        }
        out
    }

    /// Write [`data`](Self::data) as CSV with a header line.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let (columns, rows) = tabulate(self.data());

        for line in std::iter::once(&columns).chain(rows.iter()) {
            let line: Vec<String> = line.iter().map(|cell| csv_field(cell)).collect();
            writeln!(writer, "{}", line.join(","))?;
        }
        writer.flush()
    }
}

fn decode_body(response_type: ResponseType, body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }

    if response_type.is_json() {
        if let Ok(value) = serde_json::from_slice(body) {
            return value;
        }
    }

    match std::str::from_utf8(body) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => Value::Null,
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        v => v.to_string(),
    }
}

/// Split a payload into column names and rows of cell texts.
fn tabulate(data: &Value) -> (Vec<String>, Vec<Vec<String>>) {
    let items: Vec<&Value> = match data {
        Value::Null => Vec::new(),
        Value::Array(list) => list.iter().collect(),
        other => vec![other],
    };

    let mut columns: Vec<String> = Vec::new();
    for item in &items {
        match item {
            Value::Object(map) => {
                for key in map.keys() {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
            }
            _ => {
                if !columns.iter().any(|column| column == "value") {
                    columns.push("value".to_string());
                }
            }
        }
    }

    let rows = items
        .iter()
        .map(|item| {
            columns
                .iter()
                .map(|column| match item {
                    Value::Object(map) => map.get(column).map(cell_text).unwrap_or_default(),
                    other if column == "value" => cell_text(other),
                    _ => String::new(),
                })
                .collect()
        })
        .collect();

    (columns, rows)
}

fn csv_field(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
