//! Bulk user loader for local environments.

use std::path::Path;

use anyhow::{bail, Context};
use crudkit::{FieldSpec, Schema};
use crudkit_db::{Manager, Record};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::api::rest::users::hash_record_password;
use crate::infra::storage::entity::{token, user};

#[derive(Debug, Deserialize)]
struct SeedFile {
    data: Vec<Value>,
}

fn seed_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::email("email"))
        .field(FieldSpec::char("password"))
        .field(FieldSpec::char("first_name").optional().allow_blank().max_length(128))
        .field(FieldSpec::char("last_name").optional().allow_blank().max_length(128))
        .field(FieldSpec::char("phone_number").optional().allow_blank().max_length(128))
        .field(FieldSpec::char("profile_photo").optional().nullable().max_length(512))
}

/// Replaces every user (and token) with the users listed in `path`,
/// a JSON document shaped `{"data": [{email, password, ...}, ...]}`.
pub async fn load_users(db: &DatabaseConnection, path: &Path) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read seed file {}", path.display()))?;
    let file: SeedFile = serde_json::from_str(&raw)
        .with_context(|| format!("invalid seed file {}", path.display()))?;

    let schema = seed_schema();
    let mut rows: Vec<Record> = Vec::with_capacity(file.data.len());
    for (idx, item) in file.data.iter().enumerate() {
        let (mut row, errors) = schema.clean(item, false);
        if let Some(e) = errors.first() {
            bail!("seed user #{idx}: {}: {}", e.field, e.message);
        }
        hash_record_password(&mut row).map_err(|e| anyhow::anyhow!("seed user #{idx}: {e}"))?;
        rows.push(row);
    }

    let users = Manager::<user::Entity>::new(db.clone());
    let tokens = Manager::<token::Entity>::new(db.clone());
    tokens.delete(None, None, false, true).await?;
    let removed = users.delete(None, None, false, true).await?;
    info!(removed, "cleared users");

    let created = users
        .create_many(&rows)
        .await
        .context("cannot insert seed users")?;
    info!(count = created.len(), file = %path.display(), "seeded users");
    Ok(created.len())
}
