use async_trait::async_trait;
use crudkit::{
    ApiResult, CreateView, DeleteView, FieldError, FieldSpec, ListView, Lookup, Resource,
    RetrieveView, Schema, UpdateView,
};
use crudkit_db::{Manager, Query, Record};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use crate::infra::storage::entity::customer::{self, CUSTOMER_TYPES};

/// `/customer` CRUD.
pub struct Customers {
    manager: Manager<customer::Entity>,
    schema: Schema,
}

impl Customers {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            manager: Manager::new(db),
            schema: Schema::new()
                .field(FieldSpec::choice("customer_type", CUSTOMER_TYPES))
                .field(FieldSpec::char("company_name").max_length(100))
                .field(FieldSpec::char("first_name").optional().allow_blank().max_length(50))
                .field(FieldSpec::char("last_name").optional().allow_blank().max_length(50))
                .field(FieldSpec::char("mobile_number").max_length(15))
                .field(FieldSpec::email("email").max_length(100))
                .field(FieldSpec::char("address").max_length(255)),
        }
    }
}

#[async_trait]
impl Resource for Customers {
    type Entity = customer::Entity;
    type Model = customer::Model;
    type Active = customer::ActiveModel;
    const LOOKUP_FIELD: &'static str = "customer_id";

    fn manager(&self) -> &Manager<customer::Entity> {
        &self.manager
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn to_dict(&self, model: &customer::Model) -> Value {
        model.to_dict()
    }

    async fn validate(
        &self,
        data: &Record,
        instance: Option<&customer::Model>,
    ) -> ApiResult<Vec<FieldError>> {
        let Some(email) = data.get("email").and_then(Value::as_str) else {
            return Ok(Vec::new());
        };
        let mut query = Query::new();
        query.insert("email".into(), json!(email));
        if let Some(c) = instance {
            query.insert("customer_id".into(), json!({ "NOT": c.customer_id }));
        }
        if self.manager.exists(&query).await? {
            return Ok(vec![FieldError::duplicate("email").with_user_value(&json!(email))]);
        }
        Ok(Vec::new())
    }
}

impl CreateView for Customers {}

impl ListView for Customers {
    fn list_schema(&self) -> Schema {
        Schema::pagination()
            .field(FieldSpec::choice("customer_type", CUSTOMER_TYPES).optional())
            .field(FieldSpec::char("company_name").optional().max_length(100))
            .field(FieldSpec::char("first_name").optional().max_length(50))
            .field(FieldSpec::char("last_name").optional().max_length(50))
            .field(FieldSpec::char("email").optional().max_length(100))
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["company_name", "first_name", "last_name", "email", "mobile_number"]
    }

    fn filter_fields(&self) -> &'static [(&'static str, Lookup)] {
        &[
            ("customer_type", Lookup::Exact),
            ("company_name", Lookup::IContains),
            ("first_name", Lookup::IContains),
            ("last_name", Lookup::IContains),
            ("email", Lookup::IContains),
        ]
    }

    fn order_by(&self) -> &'static [&'static str] {
        &["-created_dtm"]
    }
}

impl RetrieveView for Customers {}

impl UpdateView for Customers {}

impl DeleteView for Customers {}
