pub mod notification;
pub mod user_notification;
