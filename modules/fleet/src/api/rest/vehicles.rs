use async_trait::async_trait;
use crudkit::{
    ApiResult, CreateView, DeleteView, FieldError, FieldSpec, ListView, Lookup, Resource,
    RetrieveView, Schema, UpdateView,
};
use crudkit_db::{Manager, Query, Record};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use crate::infra::storage::entity::vehicle;

/// `/vehicle` CRUD.
pub struct Vehicles {
    manager: Manager<vehicle::Entity>,
    schema: Schema,
}

impl Vehicles {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            manager: Manager::new(db),
            schema: Schema::new()
                .field(FieldSpec::char("vehicle_name").max_length(50))
                .field(FieldSpec::char("vehicle_type").max_length(50))
                .field(FieldSpec::char("vehicle_number").max_length(15))
                .field(FieldSpec::char("vehicle_model").max_length(50))
                .field(FieldSpec::char("vehicle_color").max_length(50)),
        }
    }
}

#[async_trait]
impl Resource for Vehicles {
    type Entity = vehicle::Entity;
    type Model = vehicle::Model;
    type Active = vehicle::ActiveModel;
    const LOOKUP_FIELD: &'static str = "vehicle_id";

    fn manager(&self) -> &Manager<vehicle::Entity> {
        &self.manager
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn to_dict(&self, model: &vehicle::Model) -> Value {
        model.to_dict()
    }

    async fn validate(
        &self,
        data: &Record,
        instance: Option<&vehicle::Model>,
    ) -> ApiResult<Vec<FieldError>> {
        let Some(number) = data.get("vehicle_number").and_then(Value::as_str) else {
            return Ok(Vec::new());
        };
        let mut query = Query::new();
        query.insert("vehicle_number".into(), json!(number));
        if let Some(v) = instance {
            query.insert("vehicle_id".into(), json!({ "NOT": v.vehicle_id }));
        }
        if self.manager.exists(&query).await? {
            return Ok(vec![
                FieldError::duplicate("vehicle_number").with_user_value(&json!(number))
            ]);
        }
        Ok(Vec::new())
    }
}

impl CreateView for Vehicles {}

impl ListView for Vehicles {
    fn list_schema(&self) -> Schema {
        Schema::pagination()
            .field(FieldSpec::char("vehicle_name").optional().max_length(50))
            .field(FieldSpec::char("vehicle_type").optional().max_length(50))
            .field(FieldSpec::char("vehicle_number").optional().max_length(15))
            .field(FieldSpec::char("vehicle_model").optional().max_length(50))
            .field(FieldSpec::char("vehicle_color").optional().max_length(50))
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["vehicle_name", "vehicle_number", "vehicle_model"]
    }

    fn filter_fields(&self) -> &'static [(&'static str, Lookup)] {
        &[
            ("vehicle_name", Lookup::IContains),
            ("vehicle_type", Lookup::IContains),
            ("vehicle_number", Lookup::IContains),
            ("vehicle_model", Lookup::IContains),
            ("vehicle_color", Lookup::IContains),
        ]
    }

    fn order_by(&self) -> &'static [&'static str] {
        &["-created_dtm"]
    }
}

impl RetrieveView for Vehicles {}

impl UpdateView for Vehicles {}

impl DeleteView for Vehicles {}
