use std::sync::OnceLock;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crudkit_db::DbError;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};

use crate::envelope::Envelope;
use crate::messages::{self, codes};

/// One entry of a validation error list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `list_of_notification_id.2`.
    pub field: String,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_value: Option<Value>,
}

fn first_integer(message: &str) -> Option<i64> {
    static DIGITS: OnceLock<Option<Regex>> = OnceLock::new();
    DIGITS
        .get_or_init(|| Regex::new(r"\d+").ok())
        .as_ref()?
        .find(message)?
        .as_str()
        .parse()
        .ok()
}

impl FieldError {
    /// The first integer in `message` becomes the limit named by `code`
    /// (`MAX*` → `max_limit`, `MIN*` → `min_limit`, `*EXACT*` → `expected`).
    pub fn new(field: impl Into<String>, code: &str, message: impl Into<String>) -> Self {
        let code = code.to_uppercase();
        let message = message.into();
        let mut err = Self {
            field: field.into(),
            code: String::new(),
            message,
            max_limit: None,
            min_limit: None,
            expected: None,
            user_value: None,
        };
        if let Some(n) = first_integer(&err.message) {
            if code.contains("MAX") {
                err.max_limit = Some(n);
            } else if code.contains("MIN") {
                err.min_limit = Some(n);
            } else if code.contains("EXACT") {
                err.expected = Some(n);
            }
        }
        err.code = code;
        err
    }

    pub fn with_user_value(mut self, value: &Value) -> Self {
        if !value.is_null() {
            self.user_value = Some(value.clone());
        }
        self
    }

    /// Re-roots the path under `prefix` (used for list items).
    pub fn nested_under(mut self, prefix: &str) -> Self {
        self.field = format!("{prefix}.{}", self.field);
        self
    }

    pub fn duplicate(field: impl Into<String>) -> Self {
        Self::new(field, codes::DUPLICATE_ENTRY, messages::ALREADY_EXIST)
    }

    pub fn not_found(field: impl Into<String>) -> Self {
        Self::new(field, codes::NO_DATA_FOUND, messages::NO_DATA_FOUND)
    }
}

/// Error taxonomy of the HTTP layer; every variant renders into an [`Envelope`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("{}", messages::NO_DATA_FOUND)]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("{}", messages::UNAUTHORIZED_ACCESS)]
    Unauthorized,

    #[error("{}", messages::WRONG_CREDENTIALS)]
    WrongCredentials,

    #[error("{}", messages::PERMISSION_DENIED)]
    PermissionDenied,

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized | ApiError::WrongCredentials => StatusCode::UNAUTHORIZED,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::InvalidOperation(_) | ApiError::Configuration(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn errors(&self) -> Value {
        let entry = |message: &str, code: &str| json!({ "message": message, "code": code });
        match self {
            ApiError::Validation(list) => serde_json::to_value(list).unwrap_or(Value::Null),
            ApiError::NotFound => entry(messages::NO_DATA_FOUND, codes::NO_DATA_FOUND),
            ApiError::BadRequest(msg) => entry(msg, codes::BAD_REQUEST),
            ApiError::Unauthorized => entry(messages::UNAUTHORIZED_ACCESS, codes::UNAUTHORIZED),
            ApiError::WrongCredentials => {
                entry(messages::WRONG_CREDENTIALS, codes::WRONG_CREDENTIALS)
            }
            ApiError::PermissionDenied => {
                entry(messages::PERMISSION_DENIED, codes::PERMISSION_DENIED)
            }
            ApiError::InvalidOperation(_) | ApiError::Configuration(_) | ApiError::Internal(_) => {
                json!({ "code": codes::UNKNOWN_ERROR, "message": messages::INTERNAL_SERVER_ERROR })
            }
        }
    }

    pub fn into_envelope(self) -> Envelope {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }
        Envelope::new(status).with_errors(self.errors())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_envelope().into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::InvalidOperation(msg) => ApiError::InvalidOperation(msg.to_string()),
            other => ApiError::Internal(anyhow::Error::new(other)),
        }
    }
}
