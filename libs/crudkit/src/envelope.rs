use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Uniform body of every API response.
///
/// `is_success` is taken from [`Envelope::with_success`] when set; otherwise it
/// is `false` whenever `errors` carries anything and `true` otherwise.
#[derive(Debug, Clone)]
pub struct Envelope {
    status: StatusCode,
    data: Value,
    errors: Value,
    messages: Value,
    success: Option<bool>,
}

#[derive(Debug, Serialize)]
struct Body<'a> {
    data: &'a Value,
    errors: &'a Value,
    messages: &'a Value,
    status_code: u16,
    is_success: bool,
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    }
}

impl Envelope {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            data: Value::Null,
            errors: Value::Null,
            messages: Value::Null,
            success: None,
        }
    }

    /// 200 with `data`.
    pub fn ok(data: Value) -> Self {
        Self::new(StatusCode::OK).with_data(data)
    }

    /// 201 with `data` and a `{message}`.
    pub fn created(data: Value, message: &str) -> Self {
        Self::new(StatusCode::CREATED)
            .with_data(data)
            .with_message(message)
    }

    /// 204 with `data: null` and a `{message}`.
    pub fn no_content(message: &str) -> Self {
        Self::new(StatusCode::NO_CONTENT).with_message(message)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_messages(mut self, messages: Value) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_message(self, message: &str) -> Self {
        self.with_messages(json!({ "message": message }))
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn is_success(&self) -> bool {
        self.success.unwrap_or_else(|| !is_truthy(&self.errors))
    }

    /// Serialized body as a JSON value.
    pub fn body(&self) -> Value {
        serde_json::to_value(self.as_body()).unwrap_or(Value::Null)
    }

    fn as_body(&self) -> Body<'_> {
        Body {
            data: &self.data,
            errors: &self.errors,
            messages: &self.messages,
            status_code: self.status.as_u16(),
            is_success: self.is_success(),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let mut resp = Json(self.as_body()).into_response();
        *resp.status_mut() = self.status;
        resp
    }
}
