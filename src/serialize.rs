//! Invocation outcome serialization: JSON payloads and full HTTP responses.

use bytes::Bytes;
use http::{
    Extensions, HeaderValue, Response, StatusCode,
    header::{CONTENT_LENGTH, CONTENT_TYPE},
};
use serde_json::Value;

use crate::{common::log, invocation::Outcome};

const JSON_UTF8: HeaderValue = HeaderValue::from_static("application/json; charset=utf-8");
const TEXT_UTF8: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");

// ===== SerializationMode =====

/// Per-request JSON output mode.
///
/// Stored as a typed entry in the request [`Extensions`]; a request
/// without one serializes pretty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializationMode {
    minified: bool,
}

impl SerializationMode {
    /// Indented output, the default.
    pub const PRETTY: Self = Self { minified: false };

    /// Compact output.
    pub const MINIFIED: Self = Self { minified: true };

    pub const fn is_minified(self) -> bool {
        self.minified
    }

    /// Read the request-scoped mode, pretty when absent.
    pub fn of(extensions: &Extensions) -> Self {
        extensions.get().copied().unwrap_or_default()
    }

    /// Store the request-scoped mode.
    pub fn store(self, extensions: &mut Extensions) {
        extensions.insert(self);
    }
}

// ===== Payload =====

/// A serialized invocation outcome: status, content type, and body bytes.
#[derive(Debug)]
pub struct Payload {
    content_type: HeaderValue,
    status: StatusCode,
    body: Bytes,
}

impl Payload {
    /// Serialize an outcome.
    ///
    /// Returns `None` when the outcome carries nothing to write, the caller
    /// must not produce a response body for it.
    ///
    /// Minified output is labeled `application/json; charset=utf-8` while
    /// pretty output is labeled `text/plain; charset=utf-8`, the framework's
    /// long-standing response labeling.
    ///
    /// Failures serialize as `{"error": <message>}` with a 500 status, the
    /// message taken from the failure with its invocation wrapper stripped.
    pub fn from_outcome(outcome: &Outcome, mode: SerializationMode) -> Option<Self> {
        match outcome {
            Outcome::Pending | Outcome::Unit => None,
            Outcome::Value(value) => Some(Self {
                content_type: content_type(mode),
                status: StatusCode::OK,
                body: encode(value, mode),
            }),
            Outcome::Failure(failure) => {
                let body = serde_json::json!({ "error": failure.root_message() });
                Some(Self {
                    content_type: content_type(mode),
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: encode(&body, mode),
                })
            }
        }
    }

    pub fn content_type(&self) -> &HeaderValue {
        &self.content_type
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

fn content_type(mode: SerializationMode) -> HeaderValue {
    if mode.is_minified() { JSON_UTF8 } else { TEXT_UTF8 }
}

fn encode(value: &Value, mode: SerializationMode) -> Bytes {
    let encoded = if mode.is_minified() {
        serde_json::to_vec(value)
    } else {
        serde_json::to_vec_pretty(value)
    };

    match encoded {
        Ok(body) => body.into(),
        Err(_err) => {
            log!("failed to encode response body: {_err}");
            Bytes::new()
        }
    }
}

// ===== Response =====

/// Build a full HTTP response from an outcome.
///
/// `Content-Type` and an exact `Content-Length` are set whenever a body is
/// produced; a void outcome yields an empty `200` with neither header.
pub fn respond(outcome: &Outcome, mode: SerializationMode) -> Response<Bytes> {
    match Payload::from_outcome(outcome, mode) {
        Some(Payload { content_type, status, body }) => {
            let length = HeaderValue::from(body.len());
            let mut res = Response::new(body);
            *res.status_mut() = status;
            res.headers_mut().insert(CONTENT_TYPE, content_type);
            res.headers_mut().insert(CONTENT_LENGTH, length);
            res
        }
        None => Response::new(Bytes::new()),
    }
}
