#![allow(dead_code)]

use std::sync::OnceLock;

use crudkit_db::{connect_memory, FieldKind, FieldMap, ManagedEntity, Manager, Record};
use sea_orm::{ConnectionTrait, DatabaseConnection, Schema};
use serde_json::Value;

pub mod person {
    use sea_orm::entity::prelude::*;
    use serde::Serialize;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
    #[sea_orm(table_name = "people")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub first_name: String,
        pub last_name: String,
        pub city: String,
        pub age: i64,
        pub score: i64,
        pub high_score: i64,
        pub is_active: bool,
        pub is_deleted: bool,
        pub created_dtm: DateTimeUtc,
        pub updated_dtm: DateTimeUtc,
        pub deleted_dtm: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod tag {
    use sea_orm::entity::prelude::*;
    use serde::Serialize;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
    #[sea_orm(table_name = "tags")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub tag_id: String,
        pub label: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl ManagedEntity for person::Entity {
    type Active = person::ActiveModel;
    const PRIMARY_KEY: &'static str = "id";

    fn field_map() -> &'static FieldMap<Self> {
        use person::Column as C;
        static MAP: OnceLock<FieldMap<person::Entity>> = OnceLock::new();
        MAP.get_or_init(|| {
            FieldMap::new()
                .insert("id", C::Id, FieldKind::String)
                .insert("first_name", C::FirstName, FieldKind::String)
                .insert("last_name", C::LastName, FieldKind::String)
                .insert("city", C::City, FieldKind::String)
                .insert("age", C::Age, FieldKind::I64)
                .insert("score", C::Score, FieldKind::I64)
                .insert("high_score", C::HighScore, FieldKind::I64)
                .insert("is_active", C::IsActive, FieldKind::Bool)
                .insert("is_deleted", C::IsDeleted, FieldKind::Bool)
                .insert("created_dtm", C::CreatedDtm, FieldKind::DateTimeUtc)
                .insert("updated_dtm", C::UpdatedDtm, FieldKind::DateTimeUtc)
                .insert_nullable("deleted_dtm", C::DeletedDtm, FieldKind::DateTimeUtc)
        })
    }
}

impl ManagedEntity for tag::Entity {
    type Active = tag::ActiveModel;
    const PRIMARY_KEY: &'static str = "tag_id";
    const TRACKS_SOFT_DELETE: bool = false;

    fn field_map() -> &'static FieldMap<Self> {
        static MAP: OnceLock<FieldMap<tag::Entity>> = OnceLock::new();
        MAP.get_or_init(|| {
            FieldMap::new()
                .insert("tag_id", tag::Column::TagId, FieldKind::String)
                .insert("label", tag::Column::Label, FieldKind::String)
        })
    }
}

pub async fn setup() -> DatabaseConnection {
    let db = connect_memory().await.expect("in-memory sqlite");
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    db.execute(backend.build(&schema.create_table_from_entity(person::Entity)))
        .await
        .expect("create people");
    db.execute(backend.build(&schema.create_table_from_entity(tag::Entity)))
        .await
        .expect("create tags");
    db
}

pub fn rec(v: Value) -> Record {
    match v {
        Value::Object(m) => m,
        other => panic!("record must be an object, got {other}"),
    }
}

pub async fn seed_people(m: &Manager<person::Entity>) {
    let rows = [
        ("Alice", "Smith", "Boston", 30, 50, 70),
        ("alina", "Jones", "Los Angeles", 24, 90, 80),
        ("Bob", "Smith", "Boston", 41, 10, 10),
        ("Carol", "White", "Los Angeles", 35, 65, 60),
        ("Dave", "Brown", "Chicago", 19, 20, 40),
    ];
    let rows: Vec<Record> = rows
        .iter()
        .map(|(f, l, c, a, s, h)| {
            rec(serde_json::json!({
                "first_name": f, "last_name": l, "city": c,
                "age": a, "score": s, "high_score": h,
            }))
        })
        .collect();
    m.create_many(&rows).await.expect("seed");
}
