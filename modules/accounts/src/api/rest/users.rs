use async_trait::async_trait;
use crudkit::{
    ApiError, ApiResult, CreateView, DeleteView, FieldError, FieldSpec, ListView, Lookup,
    RequestContext, Resource, RetrieveView, Schema, UpdateView,
};
use crudkit_db::{Manager, Query, Record};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use crate::infra::crypto::hash_password;
use crate::infra::storage::entity::user;

pub const PASSWORD: &str = "password";

/// `/user` CRUD.
pub struct Users {
    manager: Manager<user::Entity>,
    schema: Schema,
}

impl Users {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            manager: Manager::new(db),
            schema: user_schema(),
        }
    }
}

pub fn user_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::email("email").max_length(254))
        .field(FieldSpec::char("first_name").max_length(16))
        .field(FieldSpec::char("last_name").max_length(16))
        .field(FieldSpec::char("phone_number").max_length(15))
        .field(FieldSpec::char("profile_photo").optional().nullable().max_length(512))
        .field(FieldSpec::char(PASSWORD).optional().min_length(6).max_length(128))
}

/// Replaces a plain `password` with its hash.
pub fn hash_record_password(row: &mut Record) -> ApiResult<()> {
    let hashed = match row.get(PASSWORD) {
        Some(Value::String(plain)) => hash_password(plain)?,
        _ => return Ok(()),
    };
    row.insert(PASSWORD.to_string(), Value::String(hashed));
    Ok(())
}

/// `email` must not belong to another non-deleted user.
pub async fn email_taken(
    manager: &Manager<user::Entity>,
    email: &str,
    except_user: Option<&str>,
) -> ApiResult<bool> {
    let mut query = Query::new();
    query.insert("email".into(), json!(email));
    if let Some(id) = except_user {
        query.insert("user_id".into(), json!({ "NOT": id }));
    }
    Ok(manager.exists(&query).await?)
}

#[async_trait]
impl Resource for Users {
    type Entity = user::Entity;
    type Model = user::Model;
    type Active = user::ActiveModel;
    const LOOKUP_FIELD: &'static str = "user_id";

    fn manager(&self) -> &Manager<user::Entity> {
        &self.manager
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn to_dict(&self, model: &user::Model) -> Value {
        model.to_dict()
    }

    async fn validate(
        &self,
        data: &Record,
        instance: Option<&user::Model>,
    ) -> ApiResult<Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(email) = data.get("email").and_then(Value::as_str) {
            let except = instance.map(|u| u.user_id.as_str());
            if email_taken(&self.manager, email, except).await? {
                errors.push(FieldError::duplicate("email").with_user_value(&json!(email)));
            }
        }
        Ok(errors)
    }
}

#[async_trait]
impl CreateView for Users {
    async fn pre_save(&self, _ctx: &RequestContext, mut rows: Vec<Record>) -> ApiResult<Vec<Record>> {
        for row in &mut rows {
            hash_record_password(row)?;
        }
        Ok(rows)
    }
}

impl ListView for Users {
    fn list_schema(&self) -> Schema {
        Schema::pagination()
            .field(FieldSpec::char("email").optional().max_length(254))
            .field(FieldSpec::char("first_name").optional().max_length(16))
            .field(FieldSpec::char("last_name").optional().max_length(16))
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["email", "first_name", "last_name", "phone_number"]
    }

    fn filter_fields(&self) -> &'static [(&'static str, Lookup)] {
        &[
            ("email", Lookup::IContains),
            ("first_name", Lookup::IContains),
            ("last_name", Lookup::IContains),
        ]
    }

    fn order_by(&self) -> &'static [&'static str] {
        &["-created_dtm"]
    }
}

impl RetrieveView for Users {}

#[async_trait]
impl UpdateView for Users {
    async fn pre_update(
        &self,
        _ctx: &RequestContext,
        _instance: &user::Model,
        mut data: Record,
    ) -> ApiResult<Record> {
        hash_record_password(&mut data)?;
        Ok(data)
    }
}

#[async_trait]
impl DeleteView for Users {
    async fn pre_delete(&self, ctx: &RequestContext, instance: &user::Model) -> ApiResult<()> {
        if ctx.principal()?.user_id == instance.user_id {
            return Err(ApiError::PermissionDenied);
        }
        Ok(())
    }
}
