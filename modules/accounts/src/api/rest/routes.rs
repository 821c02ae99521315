use std::sync::Arc;

use axum::{
    routing::{delete, get},
    Router,
};
use crudkit::{shared_crud_routes, ResourceRouter};
use crudkit_db::Manager;
use sea_orm::DatabaseConnection;

use super::auth::{logout, profile, Login};
use super::users::Users;

/// Authenticated routes: user CRUD, the caller's profile and logout.
pub fn register_routes(router: Router, db: DatabaseConnection) -> anyhow::Result<Router> {
    let users = Arc::new(Users::new(db.clone()));

    // Static `/user/profile` wins over `/user/{id}` in the matcher.
    let profile_route = Router::new()
        .route("/user/profile", get(profile))
        .with_state(users.clone());
    let logout_route = Router::new()
        .route("/auth/logout", delete(logout))
        .with_state(Manager::new(db));

    Ok(router
        .merge(profile_route)
        .merge(shared_crud_routes("/user", users))
        .merge(logout_route))
}

/// Routes reachable without a token.
pub fn register_public_routes(
    router: Router,
    db: DatabaseConnection,
    token_bytes: usize,
) -> anyhow::Result<Router> {
    let login = ResourceRouter::new(Login::new(db, token_bytes))
        .create()
        .into_router("/auth/login");
    Ok(router.merge(login))
}
