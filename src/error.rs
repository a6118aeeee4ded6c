//! API error taxonomy and its HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::engine::EngineError;
use crate::report::ParseError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("缺少必需参数: {0}")]
    MissingField(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("请求处理错误: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    kind: &'static str,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_output: Option<&'a str>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) | ApiError::Validation(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Engine(_) => StatusCode::BAD_GATEWAY,
            ApiError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error category reported to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MissingField(_) | ApiError::Validation(_) | ApiError::BadRequest(_) => {
                "validation"
            }
            ApiError::Engine(_) => "engine",
            ApiError::Parse(_) => "parse",
        }
    }

    fn raw_output(&self) -> Option<&str> {
        match self {
            ApiError::Engine(e) => e.stdout(),
            ApiError::Parse(e) => Some(e.raw_output.as_str()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            kind: self.kind(),
            error: self.to_string(),
            raw_output: self.raw_output(),
        };
        let json = serde_json::to_value(&body).unwrap_or(serde_json::Value::Null);
        (self.status(), Json(json)).into_response()
    }
}
