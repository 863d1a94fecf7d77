// API response helpers

use crate::http::{self, HttpResponse};
use hyper::StatusCode;
use serde::Serialize;

/// Reasons a config request is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Missing/invalid length, malformed JSON, or a list field with no elements
    BadRequest,
    /// Shared key absent or wrong
    Forbidden,
    /// Declared body larger than `http.max_body_size`
    PayloadTooLarge,
    /// Storage failed
    Internal,
}

impl Rejection {
    pub const fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::BadRequest => "bad request",
            Self::Forbidden => "forbidden",
            Self::PayloadTooLarge => "payload too large",
            Self::Internal => "internal server error",
        }
    }

    pub fn into_response(self) -> HttpResponse {
        http::build_json_error(self.status(), self.message())
    }
}

#[derive(Serialize)]
struct Ack {
    ok: bool,
}

/// `{"ok":true}`
pub fn ok() -> HttpResponse {
    http::build_json_response(StatusCode::OK, &Ack { ok: true })
}

/// Allowed methods on the config route
pub fn method_not_allowed() -> HttpResponse {
    http::build_405_response("GET, POST")
}
