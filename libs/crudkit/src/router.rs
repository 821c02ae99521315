use std::sync::Arc;

use axum::{
    extract::Path,
    http::{Method, StatusCode},
    routing::{MethodFilter, MethodRouter},
    Router,
};
use serde_json::json;
use tracing::Instrument;

use crate::envelope::Envelope;
use crate::extract::{Payload, QueryParams};
use crate::messages;
use crate::principal::Principal;
use crate::views::{
    Action, BaseView, CreateView, DeleteView, ListView, RequestContext, Resource, RetrieveView,
    UpdateView,
};

/// Mounts the capabilities of one resource on `/{path}` (collection) and
/// `/{path}/{id}` (item).
pub struct ResourceRouter<R> {
    resource: Arc<R>,
    collection: Option<MethodRouter>,
    item: Option<MethodRouter>,
}

fn method_filter(method: &Method) -> Option<MethodFilter> {
    match MethodFilter::try_from(method.clone()) {
        Ok(f) => Some(f),
        Err(_) => {
            tracing::warn!(%method, "method cannot be routed, skipping");
            None
        }
    }
}

fn view_span(action: Action, method: &Method) -> tracing::Span {
    tracing::debug_span!("view", action = %action, method = %method)
}

impl<R: Resource> ResourceRouter<R> {
    pub fn new(resource: R) -> Self {
        Self::from_arc(Arc::new(resource))
    }

    pub fn from_arc(resource: Arc<R>) -> Self {
        Self {
            resource,
            collection: None,
            item: None,
        }
    }

    fn add<H, T>(mut self, action: Action, method: &Method, handler: H) -> Self
    where
        H: axum::handler::Handler<T, ()>,
        T: 'static,
    {
        let Some(filter) = method_filter(method) else {
            return self;
        };
        let slot = if action.on_item() {
            &mut self.item
        } else {
            &mut self.collection
        };
        *slot = Some(slot.take().unwrap_or_else(MethodRouter::new).on(filter, handler));
        self
    }

    fn mount_create(self, method: Method) -> Self
    where
        R: CreateView,
    {
        let r = self.resource.clone();
        let m = method.clone();
        let handler = move |principal: Option<Principal>, Payload(body): Payload| {
            let span = view_span(Action::Create, &m);
            let ctx = RequestContext::new(m, principal);
            async move { r.create(ctx, body).await }.instrument(span)
        };
        self.add(Action::Create, &method, handler)
    }

    fn mount_list(self, method: Method) -> Self
    where
        R: ListView,
    {
        let r = self.resource.clone();
        let m = method.clone();
        let handler = move |principal: Option<Principal>, QueryParams(params): QueryParams| {
            let span = view_span(Action::ListAll, &m);
            let ctx = RequestContext::new(m, principal);
            async move { r.list_all(ctx, params).await }.instrument(span)
        };
        self.add(Action::ListAll, &method, handler)
    }

    fn mount_retrieve(self, method: Method) -> Self
    where
        R: RetrieveView,
    {
        let r = self.resource.clone();
        let m = method.clone();
        let handler = move |principal: Option<Principal>, Path(id): Path<String>| {
            let span = view_span(Action::Retrieve, &m);
            let ctx = RequestContext::new(m, principal);
            async move { r.retrieve(ctx, id).await }.instrument(span)
        };
        self.add(Action::Retrieve, &method, handler)
    }

    fn mount_update(self, method: Method) -> Self
    where
        R: UpdateView,
    {
        let r = self.resource.clone();
        let m = method.clone();
        let handler = move |principal: Option<Principal>,
                            Path(id): Path<String>,
                            Payload(body): Payload| {
            let span = view_span(Action::Update, &m);
            let ctx = RequestContext::new(m, principal);
            async move { r.update(ctx, id, body).await }.instrument(span)
        };
        self.add(Action::Update, &method, handler)
    }

    fn mount_destroy(self, method: Method) -> Self
    where
        R: DeleteView,
    {
        let r = self.resource.clone();
        let m = method.clone();
        let handler = move |principal: Option<Principal>, Path(id): Path<String>| {
            let span = view_span(Action::Destroy, &m);
            let ctx = RequestContext::new(m, principal);
            async move { r.destroy(ctx, id).await }.instrument(span)
        };
        self.add(Action::Destroy, &method, handler)
    }

    pub fn create(self) -> Self
    where
        R: CreateView,
    {
        <R as CreateView>::method_mapping()
            .into_iter()
            .fold(self, |rr, (m, _)| rr.mount_create(m))
    }

    pub fn list(self) -> Self
    where
        R: ListView,
    {
        <R as ListView>::method_mapping()
            .into_iter()
            .fold(self, |rr, (m, _)| rr.mount_list(m))
    }

    pub fn retrieve(self) -> Self
    where
        R: RetrieveView,
    {
        <R as RetrieveView>::method_mapping()
            .into_iter()
            .fold(self, |rr, (m, _)| rr.mount_retrieve(m))
    }

    pub fn update(self) -> Self
    where
        R: UpdateView,
    {
        <R as UpdateView>::method_mapping()
            .into_iter()
            .fold(self, |rr, (m, _)| rr.mount_update(m))
    }

    pub fn destroy(self) -> Self
    where
        R: DeleteView,
    {
        <R as DeleteView>::method_mapping()
            .into_iter()
            .fold(self, |rr, (m, _)| rr.mount_destroy(m))
    }

    /// Routes one `(method, action)` pair of a full CRUD resource.
    pub fn mount(self, method: Method, action: Action) -> Self
    where
        R: BaseView,
    {
        match action {
            Action::Create => self.mount_create(method),
            Action::ListAll => self.mount_list(method),
            Action::Retrieve => self.mount_retrieve(method),
            Action::Update => self.mount_update(method),
            Action::Destroy => self.mount_destroy(method),
        }
    }

    pub fn into_router(self, path: &str) -> Router {
        let mut router = Router::new();
        if let Some(collection) = self.collection {
            router = router.route(path, collection);
        }
        if let Some(item) = self.item {
            router = router.route(&format!("{path}/{{id}}"), item);
        }
        router
    }
}

/// Every route of a [`BaseView`] resource, dispatched through its
/// `method_view_mapping`.
pub fn crud_routes<R: BaseView>(path: &str, resource: R) -> Router {
    shared_crud_routes(path, Arc::new(resource))
}

/// [`crud_routes`] for a resource that other handlers also hold.
pub fn shared_crud_routes<R: BaseView>(path: &str, resource: Arc<R>) -> Router {
    R::method_view_mapping(false)
        .into_iter()
        .chain(R::method_view_mapping(true))
        .fold(ResourceRouter::from_arc(resource), |rr, (m, a)| rr.mount(m, a))
        .into_router(path)
}

/// 404 for unknown routes.
pub async fn not_found() -> Envelope {
    Envelope::new(StatusCode::NOT_FOUND)
        .with_errors(json!({ "message": messages::RESOURCE_NOT_FOUND }))
}
