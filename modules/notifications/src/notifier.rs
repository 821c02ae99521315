use crudkit_db::{Manager, Record};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tracing::info;

use crate::infra::storage::entity::notification::{self, NotificationType};
use crate::infra::storage::entity::user_notification;

/// Content of a notification before it is delivered.
#[derive(Debug, Clone)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    pub data: Option<Value>,
}

impl Notice {
    pub fn new(kind: NotificationType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Stores notifications and fans them out to user inboxes.
#[derive(Clone)]
pub struct Notifier {
    notifications: Manager<notification::Entity>,
    deliveries: Manager<user_notification::Entity>,
}

impl Notifier {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            notifications: Manager::new(db.clone()),
            deliveries: Manager::new(db),
        }
    }

    /// Creates the notification once and one unread inbox row per recipient.
    /// Returns `false` without touching storage when `user_ids` is empty.
    pub async fn send(&self, notice: &Notice, user_ids: &[String]) -> crudkit_db::Result<bool> {
        if user_ids.is_empty() {
            return Ok(false);
        }

        let mut data = Record::new();
        data.insert("title".into(), json!(notice.title));
        data.insert("message".into(), json!(notice.message));
        data.insert("notification_type".into(), json!(notice.kind.as_str()));
        data.insert(
            "notification_data".into(),
            notice.data.clone().unwrap_or(Value::Null),
        );
        let created = self.notifications.create(&data).await?;

        let rows: Vec<Record> = user_ids
            .iter()
            .map(|user_id| {
                let mut row = Record::new();
                row.insert("user_id".into(), json!(user_id));
                row.insert("notification_id".into(), json!(created.notification_id));
                row.insert("is_read".into(), json!(false));
                row
            })
            .collect();
        self.deliveries.create_many(&rows).await?;

        info!(
            notification_id = %created.notification_id,
            kind = notice.kind.as_str(),
            recipients = user_ids.len(),
            "notification sent"
        );
        Ok(true)
    }
}
