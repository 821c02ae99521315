use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use crudkit::messages::{self, codes};
use crudkit::{
    ApiError, ApiResult, Envelope, FieldError, FieldSpec, ListView, Payload, Principal,
    RequestContext, Resource, Schema,
};
use crudkit_db::{Manager, Query, Record};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::infra::storage::entity::{notification, user_notification};

pub const MARK_ALL: &str = "mark_all_as_read";
pub const ID_LIST: &str = "list_of_notification_id";
pub const NOTHING_TO_MARK: &str = "Please provide the notification id";

/// `/notifications`: the caller's unread inbox and mark-as-read.
pub struct Inbox {
    manager: Manager<user_notification::Entity>,
    notifications: Manager<notification::Entity>,
    schema: Schema,
}

impl Inbox {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            manager: Manager::new(db.clone()),
            notifications: Manager::new(db),
            schema: Schema::new()
                .field(FieldSpec::boolean(MARK_ALL).default(json!(false)))
                .field(FieldSpec::char_list(ID_LIST).optional().max_length(128)),
        }
    }

    /// Flags the caller's deliveries as read: every one with
    /// `mark_all_as_read`, otherwise those whose notification is listed.
    pub async fn mark_as_read(&self, user_id: &str, payload: &Value) -> ApiResult<Envelope> {
        let (data, errors) = self.schema.clean(payload, false);
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        let mark_all = data.get(MARK_ALL).and_then(Value::as_bool).unwrap_or(false);
        let ids = data
            .get(ID_LIST)
            .and_then(Value::as_array)
            .filter(|ids| !ids.is_empty());

        let mut query = Query::new();
        query.insert("user_id".into(), json!(user_id));
        if !mark_all {
            let Some(ids) = ids else {
                return Err(ApiError::Validation(vec![FieldError::new(
                    ID_LIST,
                    codes::REQUIRED,
                    messages::REQUIRED,
                )]));
            };
            query.insert("notification_id__in".into(), Value::Array(ids.clone()));
        }

        let count = self.manager.count(&query).await?;
        if count == 0 {
            debug!(user_id, "nothing to mark as read");
            return Ok(Envelope::ok(Value::Null)
                .with_messages(json!({ "message": NOTHING_TO_MARK, "type": "warning" })));
        }

        let mut read = Record::new();
        read.insert("is_read".into(), json!(true));
        self.manager.update_many(&read, &query).await?;
        info!(user_id, count, "notifications marked as read");
        Ok(Envelope::ok(Value::Null).with_message(&format!("{count} Messages marked as read!...")))
    }
}

impl Resource for Inbox {
    type Entity = user_notification::Entity;
    type Model = user_notification::Model;
    type Active = user_notification::ActiveModel;
    const LOOKUP_FIELD: &'static str = "user_notification_id";

    fn manager(&self) -> &Manager<user_notification::Entity> {
        &self.manager
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn to_dict(&self, model: &user_notification::Model) -> Value {
        model.to_dict()
    }
}

#[async_trait]
impl ListView for Inbox {
    fn order_by(&self) -> &'static [&'static str] {
        &["-created_dtm"]
    }

    async fn list_query(&self, ctx: &RequestContext, _params: &Record) -> ApiResult<Query> {
        let mut query = Query::new();
        query.insert("user_id".into(), json!(ctx.principal()?.user_id));
        query.insert("is_read".into(), json!(false));
        Ok(query)
    }

    async fn to_list(
        &self,
        _ctx: &RequestContext,
        rows: Vec<user_notification::Model>,
    ) -> ApiResult<Vec<Value>> {
        let ids: Vec<Value> = rows.iter().map(|r| json!(r.notification_id)).collect();
        let mut query = Query::new();
        query.insert("notification_id__in".into(), Value::Array(ids));
        let by_id = self
            .notifications
            .get_objects_mapping(&query, &[], "notification_id")
            .await?;

        Ok(rows
            .iter()
            .filter_map(|r| by_id.get(&r.notification_id))
            .map(|n| json!({ "notification": n.to_dict() }))
            .collect())
    }
}

/// `PUT /notifications`
pub async fn mark_as_read(
    State(inbox): State<Arc<Inbox>>,
    principal: Principal,
    Payload(body): Payload,
) -> ApiResult<Envelope> {
    inbox.mark_as_read(&principal.user_id, &body).await
}
