use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::StatusClass;

/// Uniform response body: `{ "data": .., "message": .., "status": .. }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub message: String,
    pub status: u16,
    #[serde(skip)]
    code: StatusCode,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self::with(Some(data), String::new(), StatusClass::Ok.http_status())
    }

    /// Successful response without a payload.
    pub fn message(msg: impl Into<String>) -> Self {
        Self::with(None, msg.into(), StatusClass::Ok.http_status())
    }

    pub fn error(msg: impl Into<String>, code: StatusCode) -> Self {
        Self::with(None, msg.into(), code)
    }

    fn with(data: Option<T>, message: String, code: StatusCode) -> Self {
        Self {
            data,
            message,
            status: code.as_u16(),
            code,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.code, Json(self)).into_response()
    }
}
