use std::collections::HashMap;

use async_trait::async_trait;
use crudkit::{ApiResult, ListView, RequestContext, Resource, Schema};
use crudkit_db::{Manager, Query};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use crate::infra::storage::entity::invoice::{self, amount};
use crate::infra::storage::entity::customer;

/// Invoiced and paid totals of one customer.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Balance {
    pub total: Decimal,
    pub paid: Decimal,
}

impl Balance {
    pub fn pending(&self) -> Decimal {
        self.total - self.paid
    }

    fn add(&mut self, inv: &invoice::Model) {
        self.total += inv.total;
        if inv.is_paid() {
            self.paid += inv.total;
        }
    }
}

/// Folds invoices into per-customer balances.
pub fn balances<'a>(invoices: impl IntoIterator<Item = &'a invoice::Model>) -> HashMap<String, Balance> {
    let mut out: HashMap<String, Balance> = HashMap::new();
    for inv in invoices {
        out.entry(inv.customer_id.clone()).or_default().add(inv);
    }
    out
}

/// `GET /payment`: payment summary of every customer, unpaginated.
pub struct Payments {
    customers: Manager<customer::Entity>,
    invoices: Manager<invoice::Entity>,
    schema: Schema,
}

impl Payments {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            customers: Manager::new(db.clone()),
            invoices: Manager::new(db),
            schema: Schema::new(),
        }
    }
}

impl Resource for Payments {
    type Entity = customer::Entity;
    type Model = customer::Model;
    type Active = customer::ActiveModel;
    const LOOKUP_FIELD: &'static str = "customer_id";

    fn manager(&self) -> &Manager<customer::Entity> {
        &self.customers
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn to_dict(&self, model: &customer::Model) -> Value {
        model.to_dict()
    }
}

#[async_trait]
impl ListView for Payments {
    const PAGINATED: bool = false;

    fn list_schema(&self) -> Schema {
        Schema::new()
    }

    fn order_by(&self) -> &'static [&'static str] {
        &["-created_dtm"]
    }

    async fn to_list(
        &self,
        _ctx: &RequestContext,
        rows: Vec<customer::Model>,
    ) -> ApiResult<Vec<Value>> {
        let ids: Vec<Value> = rows.iter().map(|c| json!(c.customer_id)).collect();
        let mut query = Query::new();
        query.insert("customer_id__in".into(), Value::Array(ids));
        let invoices = self.invoices.list(&query, &[]).await?;
        let by_customer = balances(&invoices);

        Ok(rows
            .iter()
            .map(|c| {
                let b = by_customer.get(&c.customer_id).copied().unwrap_or_default();
                json!({
                    "customer_id": c.customer_id,
                    "full_name": c.full_name(),
                    "total_amount": amount(&b.total),
                    "paid_amount": amount(&b.paid),
                    "pending_amount": amount(&b.pending()),
                })
            })
            .collect())
    }
}
