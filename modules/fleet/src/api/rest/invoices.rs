use async_trait::async_trait;
use crudkit::{
    default_list_query, messages, ApiResult, CreateView, Created, DeleteView, Envelope,
    FieldError, FieldSpec, ListView, Lookup, RequestContext, Resource, RetrieveView, Schema,
    UpdateView,
};
use crudkit_db::{Manager, Query, Record};
use notifications::{Notice, NotificationType, Notifier};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::infra::storage::entity::customer::{self, CUSTOMER_TYPES};
use crate::infra::storage::entity::invoice::{self, INVOICE_STATUSES};
use crate::infra::storage::entity::vehicle;

/// List params matched against the invoice's customer.
const CUSTOMER_FILTERS: &[(&str, Lookup)] = &[
    ("customer_type", Lookup::Exact),
    ("company_name", Lookup::IContains),
    ("first_name", Lookup::IContains),
    ("last_name", Lookup::IContains),
];

/// List params matched against the invoice's vehicle.
const VEHICLE_FILTERS: &[(&str, Lookup)] = &[
    ("vehicle_name", Lookup::IContains),
    ("vehicle_type", Lookup::IContains),
    ("vehicle_number", Lookup::IContains),
];

/// `/invoice` CRUD. Listing embeds the customer and vehicle of every row.
pub struct Invoices {
    manager: Manager<invoice::Entity>,
    customers: Manager<customer::Entity>,
    vehicles: Manager<vehicle::Entity>,
    notifier: Notifier,
    schema: Schema,
}

impl Invoices {
    pub fn new(db: DatabaseConnection, notifier: Notifier) -> Self {
        Self {
            manager: Manager::new(db.clone()),
            customers: Manager::new(db.clone()),
            vehicles: Manager::new(db),
            notifier,
            schema: Schema::new()
                .field(FieldSpec::char("invoice_number").max_length(50))
                .field(FieldSpec::char("customer_id").max_length(36))
                .field(FieldSpec::char("vehicle_id").max_length(36))
                .field(FieldSpec::date("date"))
                .field(FieldSpec::char("loading_address").max_length(255))
                .field(FieldSpec::char("delivery_address").max_length(255))
                .field(FieldSpec::decimal("weight", 10, 2))
                .field(FieldSpec::decimal("rate", 10, 2))
                .field(FieldSpec::decimal("total", 12, 2))
                .field(FieldSpec::choice("status", INVOICE_STATUSES)),
        }
    }

    /// Best effort: the invoice is already committed, so a failed delivery is
    /// logged and the create still succeeds.
    async fn notify_created(&self, ctx: &RequestContext, invoice: &invoice::Model) {
        let recipient = match ctx.principal() {
            Ok(p) => p.user_id.clone(),
            Err(_) => {
                warn!(invoice_id = %invoice.invoice_id, "no caller to notify of invoice creation");
                return;
            }
        };
        let notice = Notice::new(
            NotificationType::Invoice,
            "Invoice Created",
            format!("Invoice {} has been created.", invoice.invoice_number),
        )
        .with_data(json!({
            "invoice_id": invoice.invoice_id,
            "invoice_number": invoice.invoice_number,
        }));
        if let Err(e) = self.notifier.send(&notice, &[recipient]).await {
            warn!(invoice_id = %invoice.invoice_id, error = %e, "invoice notification failed");
        }
    }
}

/// `{key__in: [...]}` of the `key` values of every row matching the filter
/// params; `None` when no such param was given.
async fn related_ids<E>(
    manager: &Manager<E>,
    params: &Record,
    filters: &[(&str, Lookup)],
    key: &str,
) -> ApiResult<Option<Value>>
where
    E: crudkit_db::ManagedEntity,
    E::Model: sea_orm::IntoActiveModel<E::Active> + serde::Serialize + Sync,
{
    let query = default_list_query(params, &[], filters);
    if query.is_empty() {
        return Ok(None);
    }
    let rows = manager.list_only(&query, &[key], &[]).await?;
    let ids = rows
        .into_iter()
        .filter_map(|mut r| r.remove(key))
        .collect();
    Ok(Some(Value::Array(ids)))
}

fn exists_query(field: &str, id: &str) -> Query {
    let mut q = Query::new();
    q.insert(field.into(), json!(id));
    q
}

#[async_trait]
impl Resource for Invoices {
    type Entity = invoice::Entity;
    type Model = invoice::Model;
    type Active = invoice::ActiveModel;
    const LOOKUP_FIELD: &'static str = "invoice_id";

    fn manager(&self) -> &Manager<invoice::Entity> {
        &self.manager
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn to_dict(&self, model: &invoice::Model) -> Value {
        model.to_dict()
    }

    async fn validate(
        &self,
        data: &Record,
        instance: Option<&invoice::Model>,
    ) -> ApiResult<Vec<FieldError>> {
        let mut errors = Vec::new();

        if let Some(number) = data.get("invoice_number").and_then(Value::as_str) {
            let mut query = exists_query("invoice_number", number);
            if let Some(i) = instance {
                query.insert("invoice_id".into(), json!({ "NOT": i.invoice_id }));
            }
            if self.manager.exists(&query).await? {
                errors.push(FieldError::duplicate("invoice_number").with_user_value(&json!(number)));
            }
        }
        if let Some(id) = data.get("customer_id").and_then(Value::as_str) {
            if !self.customers.exists(&exists_query("customer_id", id)).await? {
                errors.push(FieldError::not_found("customer_id").with_user_value(&json!(id)));
            }
        }
        if let Some(id) = data.get("vehicle_id").and_then(Value::as_str) {
            if !self.vehicles.exists(&exists_query("vehicle_id", id)).await? {
                errors.push(FieldError::not_found("vehicle_id").with_user_value(&json!(id)));
            }
        }
        Ok(errors)
    }
}

#[async_trait]
impl CreateView for Invoices {
    async fn post_save(
        &self,
        ctx: &RequestContext,
        created: Created<invoice::Model>,
    ) -> ApiResult<Envelope> {
        let invoices = match created {
            Created::One(m) => vec![m],
            Created::Many(ms) => ms,
        };
        for inv in &invoices {
            self.notify_created(ctx, inv).await;
        }
        let data = match invoices.as_slice() {
            [one] => self.to_dict(one),
            many => Value::Array(many.iter().map(|m| self.to_dict(m)).collect()),
        };
        Ok(Envelope::created(data, messages::CREATED))
    }
}

#[async_trait]
impl ListView for Invoices {
    fn list_schema(&self) -> Schema {
        Schema::pagination()
            .field(FieldSpec::date("date").optional())
            .field(FieldSpec::choice("status", INVOICE_STATUSES).optional())
            .field(FieldSpec::choice("customer_type", CUSTOMER_TYPES).optional())
            .field(FieldSpec::char("company_name").optional().max_length(100))
            .field(FieldSpec::char("first_name").optional().max_length(50))
            .field(FieldSpec::char("last_name").optional().max_length(50))
            .field(FieldSpec::char("vehicle_name").optional().max_length(50))
            .field(FieldSpec::char("vehicle_type").optional().max_length(50))
            .field(FieldSpec::char("vehicle_number").optional().max_length(15))
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["invoice_number", "loading_address", "delivery_address"]
    }

    fn filter_fields(&self) -> &'static [(&'static str, Lookup)] {
        &[("date", Lookup::Exact), ("status", Lookup::Exact)]
    }

    fn order_by(&self) -> &'static [&'static str] {
        &["-date", "-created_dtm"]
    }

    async fn list_query(&self, _ctx: &RequestContext, params: &Record) -> ApiResult<Query> {
        let mut query = default_list_query(params, self.search_fields(), self.filter_fields());
        if let Some(ids) = related_ids(&self.customers, params, CUSTOMER_FILTERS, "customer_id").await? {
            query.insert("customer_id__in".into(), ids);
        }
        if let Some(ids) = related_ids(&self.vehicles, params, VEHICLE_FILTERS, "vehicle_id").await? {
            query.insert("vehicle_id__in".into(), ids);
        }
        debug!(?query, "invoice list query");
        Ok(query)
    }

    async fn to_list(
        &self,
        _ctx: &RequestContext,
        rows: Vec<invoice::Model>,
    ) -> ApiResult<Vec<Value>> {
        let customer_ids: Vec<Value> = rows.iter().map(|r| json!(r.customer_id)).collect();
        let vehicle_ids: Vec<Value> = rows.iter().map(|r| json!(r.vehicle_id)).collect();

        let mut q = Query::new();
        q.insert("customer_id__in".into(), Value::Array(customer_ids));
        let customers = self
            .customers
            .get_objects_mapping(&q, &[], "customer_id")
            .await?;
        let mut q = Query::new();
        q.insert("vehicle_id__in".into(), Value::Array(vehicle_ids));
        let vehicles = self
            .vehicles
            .get_objects_mapping(&q, &[], "vehicle_id")
            .await?;

        Ok(rows
            .iter()
            .map(|inv| {
                let mut dict = inv.to_dict();
                dict["customer"] = customers
                    .get(&inv.customer_id)
                    .map_or(Value::Null, customer::Model::to_dict);
                dict["vehicle"] = vehicles
                    .get(&inv.vehicle_id)
                    .map_or(Value::Null, vehicle::Model::to_dict);
                dict
            })
            .collect())
    }
}

impl RetrieveView for Invoices {}

impl UpdateView for Invoices {}

impl DeleteView for Invoices {}
