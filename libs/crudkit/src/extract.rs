use std::collections::HashMap;

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// JSON request body as an untyped value; malformed bodies become
/// [`ApiError::BadRequest`] instead of axum's plain-text rejection.
#[derive(Debug, Clone)]
pub struct Payload(pub Value);

impl<S: Send + Sync> FromRequest<S> for Payload {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(v)) => Ok(Payload(v)),
            Err(rejection) => {
                tracing::debug!(%rejection, "rejected request body");
                Err(ApiError::BadRequest(rejection.body_text()))
            }
        }
    }
}

/// Query string as a JSON object of strings, ready for [`crate::Schema::clean`].
#[derive(Debug, Clone, Default)]
pub struct QueryParams(pub Value);

impl<S: Send + Sync> FromRequestParts<S> for QueryParams {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        let map: Map<String, Value> = raw
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        Ok(QueryParams(Value::Object(map)))
    }
}
