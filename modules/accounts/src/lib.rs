//! Users, login/logout with bearer tokens, and the authentication middleware
//! guarding every other route.

pub mod api;
pub mod config;
pub mod infra;
pub mod module;
pub mod seed;

pub use api::rest::auth::{require_bearer, Authenticator};
pub use config::AccountsConfig;
pub use infra::storage::entity::{token, user};
pub use infra::storage::migrations::Migrator;
pub use module::Accounts;
pub use seed::load_users;
