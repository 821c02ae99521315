//! In-app notifications: storage, per-user inbox and the [`Notifier`] other
//! modules use to deliver them.

pub mod api;
pub mod infra;
pub mod module;
pub mod notifier;

pub use infra::storage::entity::notification::{self, NotificationType};
pub use infra::storage::entity::user_notification;
pub use infra::storage::migrations::Migrator;
pub use module::Notifications;
pub use notifier::{Notice, Notifier};
