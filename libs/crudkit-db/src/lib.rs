//! SeaORM-backed record management.
//!
//! This crate turns [`query_core`] predicates into SeaORM conditions and wraps
//! the common per-entity data-access operations (get, list, paginate, create,
//! update, upsert, soft/hard delete) in one generic [`Manager`].
//!
//! # Features
//! - `sqlite` (default), `pg`: enable the matching SeaORM/SQLx backend
//!
//! # Example
//! ```rust,no_run
//! # async fn demo<E>(db: sea_orm::DatabaseConnection) -> crudkit_db::Result<()>
//! # where
//! #     E: crudkit_db::ManagedEntity,
//! #     E::Model: sea_orm::IntoActiveModel<E::Active> + serde::Serialize + Sync,
//! # {
//! use crudkit_db::Manager;
//! use serde_json::json;
//!
//! let customers = Manager::<E>::new(db);
//! let query = json!({"OR": [{"first_name__icontains": "ali"}, {"email__endswith": "@acme.io"}]});
//! let rows = customers.list(query.as_object().unwrap(), &["-created_dtm"]).await?;
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

pub mod connect;
pub mod fields;
pub mod filter;
pub mod manager;

pub use connect::{connect, connect_memory, redact_credentials_in_dsn, ConnectOpts, DbEngine};
pub use fields::{coerce, coerce_for_write, encode_value, Field, FieldError, FieldKind, FieldMap};
pub use filter::{apply_order, predicate_to_condition};
pub use manager::{
    ManagedEntity, Manager, CREATED_DTM, DELETED_DTM, IS_ACTIVE, IS_DELETED, UPDATED_DTM,
};

pub use query_core::{OrderKey, PageParams, PaginationInfo, Query};

use thiserror::Error;

/// Wire-level row: field name → JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

pub const DELETE_WITHOUT_QUERY: &str = "Provide the Query To delete the records.";

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Query(#[from] query_core::QueryError),

    #[error(transparent)]
    Build(#[from] FieldError),

    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}
