use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use crudkit::{
    ApiError, ApiResult, CreateView, Created, Envelope, FieldSpec, Principal, RequestContext,
    Resource, Schema,
};
use crudkit_db::{Manager, Query, Record};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::infra::crypto::{generate_token, verify_password};
use crate::infra::storage::entity::{token, user};

pub const BEARER: &str = "Bearer";
pub const LOGGED_IN: &str = "Logged in successful.";
pub const LOGGED_OUT: &str = "Logged out successfully.";

fn by_user(user_id: &str) -> Query {
    let mut q = Query::new();
    q.insert("user_id".into(), json!(user_id));
    q
}

/// `POST /auth/login`: trades `{username, password}` for a fresh token.
/// Earlier tokens of the user are revoked.
pub struct Login {
    tokens: Manager<token::Entity>,
    users: Manager<user::Entity>,
    schema: Schema,
    token_bytes: usize,
}

impl Login {
    pub fn new(db: DatabaseConnection, token_bytes: usize) -> Self {
        Self {
            tokens: Manager::new(db.clone()),
            users: Manager::new(db),
            schema: Schema::new()
                .field(FieldSpec::email("username"))
                .field(FieldSpec::char("password")),
            token_bytes,
        }
    }

    async fn check_credentials(&self, username: &str, password: &str) -> ApiResult<user::Model> {
        let mut q = Query::new();
        q.insert("email".into(), json!(username));
        let user = self.users.get(&q).await?.ok_or(ApiError::WrongCredentials)?;
        match user.password.as_deref() {
            Some(hash) if verify_password(password, hash) => Ok(user),
            _ => Err(ApiError::WrongCredentials),
        }
    }
}

impl Resource for Login {
    type Entity = token::Entity;
    type Model = token::Model;
    type Active = token::ActiveModel;
    const LOOKUP_FIELD: &'static str = "token";

    fn manager(&self) -> &Manager<token::Entity> {
        &self.tokens
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn to_dict(&self, model: &token::Model) -> Value {
        model.to_dict()
    }
}

#[async_trait]
impl CreateView for Login {
    const INJECT_AUDIT: bool = false;

    async fn pre_save(&self, _ctx: &RequestContext, rows: Vec<Record>) -> ApiResult<Vec<Record>> {
        let row = rows.into_iter().next().ok_or(ApiError::WrongCredentials)?;
        let username = row.get("username").and_then(Value::as_str).unwrap_or_default();
        let password = row.get("password").and_then(Value::as_str).unwrap_or_default();

        let user = self.check_credentials(username, password).await?;
        let revoked = self
            .tokens
            .delete(Some(&by_user(&user.user_id)), None, false, false)
            .await?;
        info!(user_id = %user.user_id, revoked, "login");

        let mut out = Record::new();
        out.insert("token".into(), json!(generate_token(self.token_bytes)));
        out.insert("user_id".into(), json!(user.user_id));
        Ok(vec![out])
    }

    async fn post_save(
        &self,
        _ctx: &RequestContext,
        created: Created<token::Model>,
    ) -> ApiResult<Envelope> {
        let data = match created {
            Created::One(t) => t.to_dict(),
            Created::Many(ts) => Value::Array(ts.iter().map(token::Model::to_dict).collect()),
        };
        Ok(Envelope::created(data, LOGGED_IN))
    }
}

/// Resolves bearer tokens into principals.
#[derive(Clone)]
pub struct Authenticator {
    tokens: Manager<token::Entity>,
    users: Manager<user::Entity>,
}

impl Authenticator {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            tokens: Manager::new(db.clone()),
            users: Manager::new(db),
        }
    }

    /// Expects exactly `Authorization: Bearer <token>` naming a live token of
    /// a non-deleted user.
    pub async fn authenticate(&self, headers: &HeaderMap) -> ApiResult<Principal> {
        let raw = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let parts: Vec<&str> = raw.split(' ').collect();
        let [scheme, token] = parts.as_slice() else {
            return Err(ApiError::Unauthorized);
        };
        if *scheme != BEARER || token.is_empty() {
            return Err(ApiError::Unauthorized);
        }

        let mut q = Query::new();
        q.insert("token".into(), json!(token));
        let token = self.tokens.get(&q).await?.ok_or(ApiError::Unauthorized)?;

        let mut q = Query::new();
        q.insert("user_id".into(), json!(token.user_id));
        let user = self.users.get(&q).await?.ok_or(ApiError::Unauthorized)?;
        if !user.is_active {
            return Err(ApiError::Unauthorized);
        }
        Ok(Principal {
            user_id: user.user_id,
            email: user.email,
        })
    }
}

/// Middleware: 401 envelope unless the request carries a valid bearer token.
pub async fn require_bearer(
    State(auth): State<Authenticator>,
    mut req: Request,
    next: Next,
) -> Response {
    match auth.authenticate(req.headers()).await {
        Ok(principal) => {
            debug!(user_id = %principal.user_id, "authenticated");
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// `DELETE /auth/logout`: revokes every token of the caller.
pub async fn logout(
    State(tokens): State<Manager<token::Entity>>,
    principal: Principal,
) -> ApiResult<Envelope> {
    let revoked = tokens
        .delete(Some(&by_user(&principal.user_id)), None, false, false)
        .await?;
    info!(user_id = %principal.user_id, revoked, "logout");
    Ok(Envelope::no_content(LOGGED_OUT))
}

/// `GET /user/profile`: the caller's own user record.
pub async fn profile(
    State(users): State<Arc<super::users::Users>>,
    principal: Principal,
) -> ApiResult<Envelope> {
    let user = users.get_object(&principal.user_id).await?;
    Ok(Envelope::ok(users.to_dict(&user)))
}
