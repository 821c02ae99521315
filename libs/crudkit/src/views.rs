//! CRUD view capabilities.
//!
//! A [`Resource`] ties an entity to its [`Manager`], payload [`Schema`] and
//! serialisation. The five capability traits add one request flow each and
//! can be implemented independently; hooks have no-op defaults so a resource
//! only overrides what it customises. Anything implementing all five is a
//! [`BaseView`].

use std::fmt;

use async_trait::async_trait;
use axum::http::Method;
use crudkit_db::{ManagedEntity, Manager, PageParams, Query, Record};
use query_core::Lookup;
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, FromQueryResult, IntoActiveModel, ModelTrait};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::envelope::Envelope;
use crate::error::{ApiError, ApiResult, FieldError};
use crate::messages::{self, codes};
use crate::principal::Principal;
use crate::schema::{Schema, NON_FIELD_ERRORS};

pub const CREATED_BY: &str = "created_by";
pub const UPDATED_BY: &str = "updated_by";
pub const SEARCH_PARAM: &str = "search";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    ListAll,
    Retrieve,
    Update,
    Destroy,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::ListAll => "list_all",
            Action::Retrieve => "retrieve",
            Action::Update => "update",
            Action::Destroy => "destroy",
        }
    }

    /// Whether the action is served on `/{resource}/{id}`.
    pub fn on_item(self) -> bool {
        matches!(self, Action::Retrieve | Action::Update | Action::Destroy)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type MethodMapping = Vec<(Method, Action)>;

/// Per-request inputs shared by every view flow.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub principal: Option<Principal>,
}

impl RequestContext {
    pub fn new(method: Method, principal: Option<Principal>) -> Self {
        Self { method, principal }
    }

    pub fn principal(&self) -> ApiResult<&Principal> {
        self.principal.as_ref().ok_or(ApiError::Unauthorized)
    }

    /// PATCH validates only the submitted fields.
    pub fn is_partial(&self) -> bool {
        self.method == Method::PATCH
    }
}

#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Entity: ManagedEntity<Model = Self::Model, Active = Self::Active>;
    type Model: IntoActiveModel<Self::Active>
        + FromQueryResult
        + ModelTrait<Entity = Self::Entity>
        + Serialize
        + Send
        + Sync
        + 'static;
    type Active: ActiveModelTrait<Entity = Self::Entity>
        + ActiveModelBehavior
        + Send
        + Sync
        + 'static;

    /// Wire field matched against the `{id}` path segment.
    const LOOKUP_FIELD: &'static str;

    fn manager(&self) -> &Manager<Self::Entity>;

    fn schema(&self) -> &Schema;

    fn to_dict(&self, model: &Self::Model) -> Value;

    /// Asynchronous field checks (uniqueness, references) run on the cleaned
    /// payload; `instance` is the stored row on update.
    async fn validate(
        &self,
        _data: &Record,
        _instance: Option<&Self::Model>,
    ) -> ApiResult<Vec<FieldError>> {
        Ok(Vec::new())
    }

    fn lookup_query(&self, id: &str) -> Query {
        let mut q = Query::new();
        q.insert(Self::LOOKUP_FIELD.to_string(), Value::String(id.to_string()));
        q
    }

    async fn get_object(&self, id: &str) -> ApiResult<Self::Model> {
        self.manager()
            .get(&self.lookup_query(id))
            .await?
            .ok_or(ApiError::NotFound)
    }
}

/// Rows produced by [`CreateView::create`].
#[derive(Debug)]
pub enum Created<M> {
    One(M),
    Many(Vec<M>),
}

#[async_trait]
pub trait CreateView: Resource {
    /// Accept a JSON array and insert every item in one transaction.
    const MANY: bool = false;
    /// Stamp `created_by`/`updated_by` with the caller's user id.
    const INJECT_AUDIT: bool = true;

    fn method_mapping() -> MethodMapping {
        vec![(Method::POST, Action::Create)]
    }

    async fn pre_save(&self, _ctx: &RequestContext, rows: Vec<Record>) -> ApiResult<Vec<Record>> {
        Ok(rows)
    }

    async fn post_save(
        &self,
        _ctx: &RequestContext,
        created: Created<Self::Model>,
    ) -> ApiResult<Envelope> {
        let data = match &created {
            Created::One(m) => self.to_dict(m),
            Created::Many(ms) => Value::Array(ms.iter().map(|m| self.to_dict(m)).collect()),
        };
        Ok(Envelope::created(data, messages::CREATED))
    }

    async fn create(&self, ctx: RequestContext, payload: Value) -> ApiResult<Envelope> {
        let items = if Self::MANY {
            match payload {
                Value::Array(items) => items,
                other => {
                    return Err(ApiError::Validation(vec![FieldError::new(
                        NON_FIELD_ERRORS,
                        codes::NOT_A_LIST,
                        "Expected a list of items.",
                    )
                    .with_user_value(&other)]))
                }
            }
        } else {
            vec![payload]
        };

        let mut rows = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            let (data, mut errs) = self.schema().clean(item, false);
            errs.extend(self.validate(&data, None).await?);
            if Self::MANY {
                let prefix = idx.to_string();
                errors.extend(errs.into_iter().map(|e| e.nested_under(&prefix)));
            } else {
                errors.extend(errs);
            }
            rows.push(data);
        }
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        if Self::INJECT_AUDIT {
            let user_id = Value::String(ctx.principal()?.user_id.clone());
            for row in &mut rows {
                row.insert(CREATED_BY.to_string(), user_id.clone());
                row.insert(UPDATED_BY.to_string(), user_id.clone());
            }
        }

        let rows = self.pre_save(&ctx, rows).await?;
        let created = if Self::MANY {
            Created::Many(self.manager().create_many(&rows).await?)
        } else {
            let row = rows
                .first()
                .ok_or_else(|| ApiError::bad_request(messages::DATA_NOT_PROVIDED))?;
            Created::One(self.manager().create(row).await?)
        };
        self.post_save(&ctx, created).await
    }
}

/// Builds the default listing filter: declared filter params are ANDed
/// (`exact` or their lookup suffix), `search` becomes an OR of `icontains`
/// over `search_fields`.
pub fn default_list_query(
    params: &Record,
    search_fields: &[&str],
    filter_fields: &[(&str, Lookup)],
) -> Query {
    let mut query = Query::new();
    for (field, lookup) in filter_fields {
        let Some(v) = params.get(*field) else {
            continue;
        };
        if v.is_null() || v.as_str() == Some("") {
            continue;
        }
        let key = match lookup {
            Lookup::Exact => field.to_string(),
            other => format!("{field}__{}", other.as_str()),
        };
        query.insert(key, v.clone());
    }

    let term = params
        .get(SEARCH_PARAM)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    if let Some(term) = term {
        if !search_fields.is_empty() {
            let any = search_fields
                .iter()
                .map(|f| {
                    let mut m = Map::new();
                    m.insert(format!("{f}__icontains"), Value::String(term.to_string()));
                    Value::Object(m)
                })
                .collect();
            query.insert(query_core::OR.to_string(), Value::Array(any));
        }
    }
    query
}

/// Reads the validated `page`/`page_size` params.
pub fn page_params(params: &Record) -> PageParams {
    let read = |key: &str, default: u64| {
        params
            .get(key)
            .and_then(Value::as_u64)
            .unwrap_or(default)
    };
    PageParams {
        page: read("page", query_core::DEFAULT_PAGE),
        page_size: read("page_size", query_core::DEFAULT_PAGE_SIZE),
    }
}

#[async_trait]
pub trait ListView: Resource {
    const PAGINATED: bool = true;

    fn method_mapping() -> MethodMapping {
        vec![(Method::GET, Action::ListAll)]
    }

    /// Schema for the query string; extend [`Schema::pagination`] with filters.
    fn list_schema(&self) -> Schema {
        Schema::pagination()
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &[]
    }

    fn filter_fields(&self) -> &'static [(&'static str, Lookup)] {
        &[]
    }

    fn order_by(&self) -> &'static [&'static str] {
        &[]
    }

    async fn list_query(&self, _ctx: &RequestContext, params: &Record) -> ApiResult<Query> {
        Ok(default_list_query(
            params,
            self.search_fields(),
            self.filter_fields(),
        ))
    }

    async fn to_list(&self, _ctx: &RequestContext, rows: Vec<Self::Model>) -> ApiResult<Vec<Value>> {
        Ok(rows.iter().map(|m| self.to_dict(m)).collect())
    }

    async fn list_all(&self, ctx: RequestContext, params: Value) -> ApiResult<Envelope> {
        let (params, errors) = self.list_schema().clean(&params, false);
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }
        let query = self.list_query(&ctx, &params).await?;

        if Self::PAGINATED {
            let (rows, pagination) = self
                .manager()
                .list_with_pagination(&query, self.order_by(), page_params(&params))
                .await?;
            if rows.is_empty() {
                return Err(ApiError::NotFound);
            }
            let list = self.to_list(&ctx, rows).await?;
            Ok(Envelope::ok(json!({ "list": list, "pagination": pagination })))
        } else {
            let rows = self.manager().list(&query, self.order_by()).await?;
            if rows.is_empty() {
                return Err(ApiError::NotFound);
            }
            let list = self.to_list(&ctx, rows).await?;
            Ok(Envelope::ok(json!({ "list": list })))
        }
    }
}

#[async_trait]
pub trait RetrieveView: Resource {
    fn method_mapping() -> MethodMapping {
        vec![(Method::GET, Action::Retrieve)]
    }

    async fn retrieve(&self, _ctx: RequestContext, id: String) -> ApiResult<Envelope> {
        let model = self.get_object(&id).await?;
        Ok(Envelope::ok(self.to_dict(&model)))
    }
}

#[async_trait]
pub trait UpdateView: Resource {
    /// Stamp `updated_by` with the caller's user id.
    const INJECT_UPDATED_BY: bool = true;

    fn method_mapping() -> MethodMapping {
        vec![(Method::PUT, Action::Update), (Method::PATCH, Action::Update)]
    }

    async fn pre_update(
        &self,
        _ctx: &RequestContext,
        _instance: &Self::Model,
        data: Record,
    ) -> ApiResult<Record> {
        Ok(data)
    }

    async fn update(&self, ctx: RequestContext, id: String, payload: Value) -> ApiResult<Envelope> {
        let instance = self.get_object(&id).await?;

        let (mut data, mut errors) = self.schema().clean(&payload, ctx.is_partial());
        errors.extend(self.validate(&data, Some(&instance)).await?);
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }
        if data.is_empty() {
            return Err(ApiError::bad_request(messages::DATA_NOT_PROVIDED));
        }

        if Self::INJECT_UPDATED_BY {
            let user_id = ctx.principal()?.user_id.clone();
            data.insert(UPDATED_BY.to_string(), Value::String(user_id));
        }
        let data = self.pre_update(&ctx, &instance, data).await?;

        let updated = self
            .manager()
            .update(&data, &self.lookup_query(&id))
            .await?
            .ok_or(ApiError::NotFound)?;
        Ok(Envelope::ok(self.to_dict(&updated)).with_message(messages::UPDATED))
    }
}

#[async_trait]
pub trait DeleteView: Resource {
    fn method_mapping() -> MethodMapping {
        vec![(Method::DELETE, Action::Destroy)]
    }

    async fn pre_delete(&self, _ctx: &RequestContext, _instance: &Self::Model) -> ApiResult<()> {
        Ok(())
    }

    async fn post_delete(&self, _ctx: &RequestContext, _instance: &Self::Model) -> ApiResult<()> {
        Ok(())
    }

    async fn destroy(&self, ctx: RequestContext, id: String) -> ApiResult<Envelope> {
        let instance = self.get_object(&id).await?;
        self.pre_delete(&ctx, &instance).await?;
        self.manager()
            .delete(Some(&self.lookup_query(&id)), None, true, false)
            .await?;
        self.post_delete(&ctx, &instance).await?;
        Ok(Envelope::no_content(messages::DELETED))
    }
}

/// Full CRUD: collection `{GET: list_all, POST: create}`, item
/// `{GET: retrieve, PUT/PATCH: update, DELETE: destroy}`.
pub trait BaseView: CreateView + ListView + RetrieveView + UpdateView + DeleteView {
    fn method_view_mapping(with_path_id: bool) -> MethodMapping {
        if with_path_id {
            [
                <Self as RetrieveView>::method_mapping(),
                <Self as UpdateView>::method_mapping(),
                <Self as DeleteView>::method_mapping(),
            ]
            .concat()
        } else {
            [
                <Self as ListView>::method_mapping(),
                <Self as CreateView>::method_mapping(),
            ]
            .concat()
        }
    }
}

impl<T> BaseView for T where T: CreateView + ListView + RetrieveView + UpdateView + DeleteView {}
