use std::sync::Arc;

use axum::{routing::put, Router};
use crudkit::ResourceRouter;
use sea_orm::DatabaseConnection;

use super::inbox::{mark_as_read, Inbox};

/// `GET /notifications` lists the inbox, `PUT /notifications` marks entries read.
pub fn register_routes(router: Router, db: DatabaseConnection) -> anyhow::Result<Router> {
    let inbox = Arc::new(Inbox::new(db));

    let list = ResourceRouter::from_arc(inbox.clone())
        .list()
        .into_router("/notifications");
    let mark = Router::new()
        .route("/notifications", put(mark_as_read))
        .with_state(inbox);

    Ok(router.merge(list).merge(mark))
}
