//! Generic per-entity data access built on the predicate compiler.
//!
//! One [`Manager`] is instantiated per entity type. Every read ANDs the
//! caller's query with `is_deleted = false` for soft-delete tracked entities,
//! and every write goes through the entity's [`FieldMap`] so wire-level
//! records can be applied to active models without reflection.

use std::collections::HashMap;
use std::marker::PhantomData;

use chrono::Utc;
use query_core::{build, OrderKey, PageParams, Pagination, PaginationInfo, Predicate, Query};
use sea_orm::{
    sea_query::Expr, ActiveModelBehavior, ActiveModelTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Select, TransactionTrait,
};
use serde::Serialize;
use serde_json::Value as Json;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::fields::{coerce_for_write, encode_value, FieldKind, FieldMap};
use crate::filter::{apply_order, predicate_to_condition};
use crate::{DbError, Record, Result, DELETE_WITHOUT_QUERY};

pub const IS_ACTIVE: &str = "is_active";
pub const IS_DELETED: &str = "is_deleted";
pub const CREATED_DTM: &str = "created_dtm";
pub const UPDATED_DTM: &str = "updated_dtm";
pub const DELETED_DTM: &str = "deleted_dtm";

/// Capability an entity needs to be served by [`Manager`].
pub trait ManagedEntity: EntityTrait {
    type Active: ActiveModelTrait<Entity = Self> + ActiveModelBehavior + Send + Sync + 'static;

    /// Wire name of the primary key. A `String` primary key is generated
    /// (UUID v4) on create when the caller leaves it out.
    const PRIMARY_KEY: &'static str;

    /// Soft-delete tracked entities carry `is_active`/`is_deleted` and are
    /// never physically removed by a default delete.
    const TRACKS_SOFT_DELETE: bool = true;

    fn field_map() -> &'static FieldMap<Self>;
}

pub struct Manager<E: ManagedEntity> {
    db: DatabaseConnection,
    _entity: PhantomData<fn() -> E>,
}

impl<E: ManagedEntity> Clone for Manager<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

fn now_value() -> sea_orm::Value {
    sea_orm::Value::ChronoDateTimeUtc(Some(Box::new(Utc::now())))
}

/// The serialized row, restricted to `only` unless it is empty.
fn project<M: Serialize>(model: &M, only: &[&str]) -> Result<Record> {
    let mut rec = match serde_json::to_value(model)? {
        Json::Object(map) => map,
        _ => Record::new(),
    };
    if !only.is_empty() {
        rec.retain(|k, _| only.contains(&k.as_str()));
    }
    Ok(rec)
}

impl<E> Manager<E>
where
    E: ManagedEntity,
    E::Model: IntoActiveModel<E::Active> + Serialize + Sync,
{
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /* ---------- reads ---------- */

    pub async fn get(&self, query: &Query) -> Result<Option<E::Model>> {
        let cond = Self::condition(Some(query))?;
        Ok(E::find().filter(cond).one(&self.db).await?)
    }

    pub async fn list(&self, query: &Query, order_by: &[&str]) -> Result<Vec<E::Model>> {
        let cond = Self::condition(Some(query))?;
        let rows = Self::ordered(cond, order_by)?.all(&self.db).await?;
        debug!(
            table = E::default().table_name(),
            rows = rows.len(),
            "list"
        );
        Ok(rows)
    }

    /// `list` projected onto the `only` keys of each serialized row.
    pub async fn list_only(
        &self,
        query: &Query,
        only: &[&str],
        order_by: &[&str],
    ) -> Result<Vec<Record>> {
        let rows = self.list(query, order_by).await?;
        rows.iter().map(|m| project(m, only)).collect()
    }

    pub async fn count(&self, query: &Query) -> Result<u64> {
        let cond = Self::condition(Some(query))?;
        Ok(E::find().filter(cond).count(&self.db).await?)
    }

    pub async fn exists(&self, query: &Query) -> Result<bool> {
        Ok(self.count(query).await? > 0)
    }

    /// Counts the filtered set, then fetches the requested window of the same
    /// query. The two reads are not a snapshot: concurrent writers may make
    /// `count` and the returned page disagree.
    pub async fn list_with_pagination(
        &self,
        query: &Query,
        order_by: &[&str],
        page: PageParams,
    ) -> Result<(Vec<E::Model>, PaginationInfo)> {
        let cond = Self::condition(Some(query))?;
        let count = E::find().filter(cond.clone()).count(&self.db).await?;
        let pagination = Pagination::from_params(count, page)?;
        // Pages past the end never reach the database; the binder cannot
        // take offsets beyond i64::MAX.
        if pagination.offset() >= count {
            return Ok((Vec::new(), pagination.info()));
        }

        let rows = Self::ordered(cond, order_by)?
            .offset(pagination.offset())
            .limit(pagination.page_size())
            .all(&self.db)
            .await?;
        debug!(
            table = E::default().table_name(),
            count,
            page = pagination.current_page(),
            rows = rows.len(),
            "list_with_pagination"
        );
        Ok((rows, pagination.info()))
    }

    /// Rows keyed by the string form of `key`'s value; rows whose key is NULL are skipped.
    pub async fn get_objects_mapping(
        &self,
        query: &Query,
        order_by: &[&str],
        key: &str,
    ) -> Result<HashMap<String, E::Model>> {
        let col = E::field_map().require(key)?.col;
        let rows = self.list(query, order_by).await?;
        Ok(rows
            .into_iter()
            .filter_map(|m| encode_value(&m.get(col)).map(|k| (k, m)))
            .collect())
    }

    /// [`Self::get_objects_mapping`] with each row projected onto `only`
    /// (all keys when empty). The key is read before projecting, so `key`
    /// need not be listed in `only`.
    pub async fn get_objects_mapping_only(
        &self,
        query: &Query,
        only: &[&str],
        order_by: &[&str],
        key: &str,
    ) -> Result<HashMap<String, Record>> {
        let col = E::field_map().require(key)?.col;
        let rows = self.list(query, order_by).await?;
        let mut out = HashMap::with_capacity(rows.len());
        for m in &rows {
            if let Some(k) = encode_value(&m.get(col)) {
                out.insert(k, project(m, only)?);
            }
        }
        Ok(out)
    }

    /* ---------- writes ---------- */

    pub async fn create(&self, data: &Record) -> Result<E::Model> {
        let model = Self::new_active(data)?.insert(&self.db).await?;
        debug!(table = E::default().table_name(), "created");
        Ok(model)
    }

    /// Inserts all rows in one transaction; any failure rolls back the batch.
    #[instrument(level = "debug", skip_all, fields(table = E::default().table_name()))]
    pub async fn create_many(&self, rows: &[Record]) -> Result<Vec<E::Model>> {
        let txn = self.db.begin().await?;
        let mut out = Vec::with_capacity(rows.len());
        for data in rows {
            out.push(Self::new_active(data)?.insert(&txn).await?);
        }
        txn.commit().await?;
        debug!(
            table = E::default().table_name(),
            rows = out.len(),
            "created many"
        );
        Ok(out)
    }

    /// `None` when nothing matches `query`.
    #[instrument(level = "debug", skip_all, fields(table = E::default().table_name()))]
    pub async fn update(&self, data: &Record, query: &Query) -> Result<Option<E::Model>> {
        match self.get(query).await? {
            Some(model) => Ok(Some(Self::apply_update(&self.db, model, data).await?)),
            None => Ok(None),
        }
    }

    pub async fn upsert(&self, data: &Record, query: &Query) -> Result<E::Model> {
        match self.get(query).await? {
            Some(model) => Self::apply_update(&self.db, model, data).await,
            None => self.create(data).await,
        }
    }

    /// Sets `data` on every match in one statement; returns the affected row count.
    #[instrument(level = "debug", skip_all, fields(table = E::default().table_name()))]
    pub async fn update_many(&self, data: &Record, query: &Query) -> Result<u64> {
        let fmap = E::field_map();
        let mut stmt = E::update_many().filter(Self::condition(Some(query))?);
        for (name, v) in data {
            let f = fmap.require(name)?;
            stmt = stmt.col_expr(f.col, Expr::value(coerce_for_write(name, f, v)?));
        }
        if let Some(f) = fmap.get(UPDATED_DTM) {
            if !data.contains_key(UPDATED_DTM) {
                stmt = stmt.col_expr(f.col, Expr::value(now_value()));
            }
        }
        let affected = stmt.exec(&self.db).await?.rows_affected;
        debug!(table = E::default().table_name(), affected, "updated many");
        Ok(affected)
    }

    /// Soft delete (default for tracked entities) flags the matches; otherwise
    /// they are removed. An empty or absent query needs `force_delete`.
    #[instrument(level = "debug", skip_all, fields(table = E::default().table_name()))]
    pub async fn delete(
        &self,
        query: Option<&Query>,
        data: Option<&Record>,
        soft_delete: bool,
        force_delete: bool,
    ) -> Result<u64> {
        let unfiltered = query.map_or(true, |q| q.is_empty());
        if unfiltered && !force_delete {
            return Err(DbError::InvalidOperation(DELETE_WITHOUT_QUERY));
        }

        let fmap = E::field_map();
        let cond = Self::condition(query)?;

        let affected = if E::TRACKS_SOFT_DELETE && soft_delete {
            let mut stmt = E::update_many()
                .col_expr(fmap.require(IS_DELETED)?.col, Expr::value(true))
                .filter(cond);
            if let Some(f) = fmap.get(DELETED_DTM) {
                stmt = stmt.col_expr(f.col, Expr::value(now_value()));
            }
            for (name, v) in data.into_iter().flatten() {
                let f = fmap.require(name)?;
                stmt = stmt.col_expr(f.col, Expr::value(coerce_for_write(name, f, v)?));
            }
            stmt.exec(&self.db).await?.rows_affected
        } else {
            E::delete_many().filter(cond).exec(&self.db).await?.rows_affected
        };

        debug!(
            table = E::default().table_name(),
            affected,
            soft = E::TRACKS_SOFT_DELETE && soft_delete,
            "deleted"
        );
        Ok(affected)
    }

    /* ---------- helpers ---------- */

    fn condition(query: Option<&Query>) -> Result<Condition> {
        let pred = match query {
            Some(q) => build(q)?,
            None => Predicate::True,
        };
        let fmap = E::field_map();
        let mut cond = predicate_to_condition(&pred, fmap)?;
        if E::TRACKS_SOFT_DELETE {
            let col = fmap.require(IS_DELETED)?.col;
            cond = Condition::all().add(cond).add(Expr::col(col).eq(false));
        }
        Ok(cond)
    }

    fn ordered(cond: Condition, order_by: &[&str]) -> Result<Select<E>> {
        let keys = OrderKey::parse_all(order_by)?;
        Ok(apply_order(E::find().filter(cond), &keys, E::field_map())?)
    }

    fn new_active(data: &Record) -> Result<E::Active> {
        let fmap = E::field_map();
        let mut am = <E::Active as ActiveModelBehavior>::new();

        for (name, v) in data {
            let f = fmap.require(name)?;
            am.set(f.col, coerce_for_write(name, f, v)?);
        }

        let missing = |name: &str| !data.get(name).is_some_and(|v| !v.is_null());

        if let Some(f) = fmap.get(E::PRIMARY_KEY) {
            if f.kind == FieldKind::String && missing(E::PRIMARY_KEY) {
                am.set(f.col, sea_orm::Value::from(Uuid::new_v4().to_string()));
            }
        }
        for stamp in [CREATED_DTM, UPDATED_DTM] {
            if let Some(f) = fmap.get(stamp) {
                if missing(stamp) {
                    am.set(f.col, now_value());
                }
            }
        }
        if E::TRACKS_SOFT_DELETE {
            for (flag, default) in [(IS_ACTIVE, true), (IS_DELETED, false)] {
                if let Some(f) = fmap.get(flag) {
                    if missing(flag) {
                        am.set(f.col, sea_orm::Value::from(default));
                    }
                }
            }
        }
        Ok(am)
    }

    /// Applies only the keys whose value differs from the stored one, so a
    /// repeated patch leaves the row (and its `updated_dtm`) untouched.
    async fn apply_update<C: ConnectionTrait>(
        conn: &C,
        model: E::Model,
        data: &Record,
    ) -> Result<E::Model> {
        let fmap = E::field_map();
        let mut changes = Vec::new();
        for (name, v) in data {
            let f = fmap.require(name)?;
            let value = coerce_for_write(name, f, v)?;
            if model.get(f.col) != value {
                changes.push((f.col, value));
            }
        }
        if changes.is_empty() {
            return Ok(model);
        }

        let mut am: E::Active = model.into_active_model();
        for (col, value) in changes {
            am.set(col, value);
        }
        if let Some(f) = fmap.get(UPDATED_DTM) {
            if !data.contains_key(UPDATED_DTM) {
                am.set(f.col, now_value());
            }
        }
        Ok(am.update(conn).await?)
    }
}
