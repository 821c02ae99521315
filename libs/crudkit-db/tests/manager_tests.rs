mod common;

use std::collections::BTreeSet;

use common::{person, rec, seed_people, setup, tag};
use crudkit_db::{DbError, Manager, PageParams, Query, DELETE_WITHOUT_QUERY};
use sea_orm::EntityTrait;
use serde_json::{json, Value};

fn q(v: Value) -> Query {
    rec(v)
}

fn names(rows: &[person::Model]) -> BTreeSet<String> {
    rows.iter().map(|r| r.first_name.clone()).collect()
}

async fn people() -> Manager<person::Entity> {
    let m = Manager::<person::Entity>::new(setup().await);
    seed_people(&m).await;
    m
}

#[tokio::test]
async fn and_matches_the_intersection() {
    let m = people().await;
    let q1 = json!({"city": "Boston"});
    let q2 = json!({"age__gte": 35});

    let a = names(&m.list(&q(q1.clone()), &[]).await.unwrap());
    let b = names(&m.list(&q(q2.clone()), &[]).await.unwrap());
    let both = names(&m.list(&q(json!({"AND": [q1, q2]})), &[]).await.unwrap());

    assert_eq!(both, a.intersection(&b).cloned().collect());
    assert_eq!(both, BTreeSet::from(["Bob".to_string()]));
}

#[tokio::test]
async fn singleton_or_matches_the_same_rows() {
    let m = people().await;
    let inner = json!({"last_name": "Smith", "age__lt": 40});
    let direct = names(&m.list(&q(inner.clone()), &[]).await.unwrap());
    let wrapped = names(&m.list(&q(json!({"OR": [inner]})), &[]).await.unwrap());
    assert_eq!(direct, wrapped);
    assert_eq!(direct, BTreeSet::from(["Alice".to_string()]));
}

#[tokio::test]
async fn nested_query_with_not_and_icontains() {
    let m = people().await;
    let rows = m
        .list(
            &q(json!({
                "AND": [
                    {"first_name__icontains": "ali"},
                    {"age__gte": 25},
                    {"OR": [{"NOT": {"last_name": "Smith"}}, {"city": "Los Angeles"}]}
                ]
            })),
            &[],
        )
        .await
        .unwrap();
    // Alice is 30 but a Smith from Boston; alina is 24
    assert!(rows.is_empty());

    let rows = m
        .list(&q(json!({"first_name__icontains": "ALI"})), &["age"])
        .await
        .unwrap();
    let got: Vec<_> = rows.iter().map(|r| r.first_name.as_str()).collect();
    assert_eq!(got, ["alina", "Alice"]);
}

#[tokio::test]
async fn field_to_field_comparison() {
    let m = people().await;
    let rows = m
        .list(&q(json!({"score__gt": {"F": "high_score"}})), &[])
        .await
        .unwrap();
    assert_eq!(
        names(&rows),
        BTreeSet::from(["alina".to_string(), "Carol".to_string()])
    );
}

#[tokio::test]
async fn not_wrapper_and_empty_in() {
    let m = people().await;
    let rows = m
        .list(&q(json!({"city": {"NOT": "Boston"}})), &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);

    assert_eq!(m.count(&q(json!({"city__in": []}))).await.unwrap(), 0);
    assert_eq!(
        m.count(&q(json!({"city__in": ["Boston", "Chicago"]})))
            .await
            .unwrap(),
        3
    );
}

#[tokio::test]
async fn negation_on_nullable_column_keeps_null_rows() {
    let m = people().await;
    assert_eq!(
        m.count(&q(json!({"deleted_dtm": "2020-01-01T00:00:00Z"})))
            .await
            .unwrap(),
        0
    );
    // every seeded row has deleted_dtm = NULL
    let rows = m
        .list(&q(json!({"deleted_dtm": {"NOT": "2020-01-01T00:00:00Z"}})), &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 5);

    let rows = m
        .list(
            &q(json!({"NOT": {"AND": [{"deleted_dtm__lt": "2030-01-01T00:00:00Z"}, {"city": "Boston"}]}})),
            &[],
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 5);

    // non-nullable columns keep plain negation
    let rows = m
        .list(&q(json!({"NOT": {"city": "Boston"}})), &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn ordering_follows_keys() {
    let m = people().await;
    let rows = m.list(&q(json!({})), &["-age"]).await.unwrap();
    let ages: Vec<i64> = rows.iter().map(|r| r.age).collect();
    assert_eq!(ages, [41, 35, 30, 24, 19]);
}

#[tokio::test]
async fn unknown_field_is_an_error() {
    let m = people().await;
    let err = m.list(&q(json!({"nickname": "x"})), &[]).await.unwrap_err();
    assert!(matches!(err, DbError::Build(_)));
}

#[tokio::test]
async fn create_stamps_key_audit_and_flags() {
    let m = Manager::<person::Entity>::new(setup().await);
    let row = m
        .create(&rec(json!({
            "first_name": "Eve", "last_name": "Adams", "city": "Denver",
            "age": 28, "score": 1, "high_score": 2
        })))
        .await
        .unwrap();
    assert!(uuid::Uuid::parse_str(&row.id).is_ok());
    assert!(row.is_active);
    assert!(!row.is_deleted);
    assert!(row.deleted_dtm.is_none());
}

#[tokio::test]
async fn soft_delete_hides_but_keeps_the_row() {
    let m = people().await;
    let bob = m.get(&q(json!({"first_name": "Bob"}))).await.unwrap().unwrap();
    let by_id = q(json!({"id": bob.id}));

    let affected = m.delete(Some(&by_id), None, true, false).await.unwrap();
    assert_eq!(affected, 1);
    assert!(m.get(&by_id).await.unwrap().is_none());

    let raw = person::Entity::find_by_id(bob.id.clone())
        .one(m.db())
        .await
        .unwrap()
        .unwrap();
    assert!(raw.is_deleted);
    assert!(raw.deleted_dtm.is_some());
}

#[tokio::test]
async fn soft_delete_merges_extra_data() {
    let m = people().await;
    let by_name = q(json!({"first_name": "Dave"}));
    let dave = m.get(&by_name).await.unwrap().unwrap();
    m.delete(
        Some(&by_name),
        Some(&rec(json!({"is_active": false}))),
        true,
        false,
    )
    .await
    .unwrap();
    let raw = person::Entity::find_by_id(dave.id)
        .one(m.db())
        .await
        .unwrap()
        .unwrap();
    assert!(raw.is_deleted && !raw.is_active);
}

#[tokio::test]
async fn delete_without_query_needs_force() {
    let m = people().await;
    for query in [None, Some(q(json!({})))] {
        let err = m.delete(query.as_ref(), None, true, false).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidOperation(msg) if msg == DELETE_WITHOUT_QUERY));
    }
    assert_eq!(m.count(&q(json!({}))).await.unwrap(), 5);

    let affected = m.delete(None, None, true, true).await.unwrap();
    assert_eq!(affected, 5);
    assert_eq!(m.count(&q(json!({}))).await.unwrap(), 0);
}

#[tokio::test]
async fn untracked_entities_are_hard_deleted() {
    let db = setup().await;
    let tags = Manager::<tag::Entity>::new(db);
    tags.create(&rec(json!({"label": "urgent"}))).await.unwrap();
    tags.create(&rec(json!({"label": "later"}))).await.unwrap();

    let affected = tags
        .delete(Some(&q(json!({"label": "urgent"}))), None, true, false)
        .await
        .unwrap();
    assert_eq!(affected, 1);
    let left = tag::Entity::find().all(tags.db()).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].label, "later");
}

#[tokio::test]
async fn hard_delete_on_tracked_entity() {
    let m = people().await;
    let affected = m
        .delete(Some(&q(json!({"city": "Boston"}))), None, false, false)
        .await
        .unwrap();
    assert_eq!(affected, 2);
    let raw = person::Entity::find().all(m.db()).await.unwrap();
    assert_eq!(raw.len(), 3);
}

#[tokio::test]
async fn update_is_idempotent() {
    let m = people().await;
    let query = q(json!({"first_name": "Carol"}));
    let patch = rec(json!({"city": "Seattle", "age": 36}));

    let first = m.update(&patch, &query).await.unwrap().unwrap();
    let second = m.update(&patch, &query).await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(second.city, "Seattle");
    assert_eq!(second.age, 36);
}

#[tokio::test]
async fn update_missing_returns_none() {
    let m = people().await;
    let got = m
        .update(&rec(json!({"age": 1})), &q(json!({"first_name": "Nobody"})))
        .await
        .unwrap();
    assert!(got.is_none());
}

#[tokio::test]
async fn update_rejects_null_on_required_field() {
    let m = people().await;
    let err = m
        .update(&rec(json!({"city": null})), &q(json!({"first_name": "Bob"})))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Build(_)));
}

#[tokio::test]
async fn upsert_updates_or_creates() {
    let m = people().await;
    let updated = m
        .upsert(&rec(json!({"age": 42})), &q(json!({"first_name": "Bob"})))
        .await
        .unwrap();
    assert_eq!(updated.age, 42);

    let created = m
        .upsert(
            &rec(json!({
                "first_name": "Frank", "last_name": "Green", "city": "Austin",
                "age": 50, "score": 0, "high_score": 0
            })),
            &q(json!({"first_name": "Frank"})),
        )
        .await
        .unwrap();
    assert_eq!(created.first_name, "Frank");
    assert_eq!(m.count(&q(json!({}))).await.unwrap(), 6);
}

#[tokio::test]
async fn update_many_touches_every_match() {
    let m = people().await;
    let n = m
        .update_many(&rec(json!({"city": "Denver"})), &q(json!({"last_name": "Smith"})))
        .await
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(m.count(&q(json!({"city": "Denver"}))).await.unwrap(), 2);
    assert_eq!(m.count(&q(json!({"city": "Boston"}))).await.unwrap(), 0);
}

#[tokio::test]
async fn pagination_walks_the_filtered_set() {
    let m = people().await;
    let query = q(json!({}));

    let (page1, info) = m
        .list_with_pagination(&query, &["age"], PageParams { page: 1, page_size: 2 })
        .await
        .unwrap();
    assert_eq!(info.count, 5);
    assert_eq!(info.total_pages, 3);
    assert_eq!(page1.iter().map(|r| r.age).collect::<Vec<_>>(), [19, 24]);

    let (page3, info) = m
        .list_with_pagination(&query, &["age"], PageParams { page: 3, page_size: 2 })
        .await
        .unwrap();
    assert_eq!(info.current_page, 3);
    assert_eq!(page3.iter().map(|r| r.age).collect::<Vec<_>>(), [41]);

    let (past_end, _) = m
        .list_with_pagination(&query, &["age"], PageParams { page: 9, page_size: 2 })
        .await
        .unwrap();
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn pagination_far_past_the_end_is_empty() {
    let m = people().await;
    let (rows, info) = m
        .list_with_pagination(
            &q(json!({})),
            &["age"],
            PageParams {
                page: u64::MAX,
                page_size: 100,
            },
        )
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(info.count, 5);
    assert_eq!(info.current_page, u64::MAX);
    assert_eq!(info.total_pages, 1);
}

#[tokio::test]
async fn pagination_of_empty_set() {
    let m = Manager::<person::Entity>::new(setup().await);
    let (rows, info) = m
        .list_with_pagination(&q(json!({})), &[], PageParams::default())
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!((info.count, info.total_pages), (0, 0));
}

#[tokio::test]
async fn pagination_rejects_zero_page() {
    let m = people().await;
    let err = m
        .list_with_pagination(&q(json!({})), &[], PageParams { page: 0, page_size: 10 })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Query(_)));
}

#[tokio::test]
async fn objects_mapping_keys_rows() {
    let m = people().await;
    let map = m
        .get_objects_mapping(&q(json!({"city": "Boston"})), &[], "id")
        .await
        .unwrap();
    assert_eq!(map.len(), 2);
    for (key, row) in &map {
        assert_eq!(key, &row.id);
    }

    let by_name = m
        .get_objects_mapping(&q(json!({})), &[], "first_name")
        .await
        .unwrap();
    assert_eq!(by_name["Carol"].city, "Los Angeles");
}

#[tokio::test]
async fn objects_mapping_with_projection() {
    let m = people().await;
    let map = m
        .get_objects_mapping_only(&q(json!({"city": "Boston"})), &["city"], &[], "first_name")
        .await
        .unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(Value::Object(map["Alice"].clone()), json!({"city": "Boston"}));

    let full = m
        .get_objects_mapping_only(&q(json!({"first_name": "Carol"})), &[], &[], "id")
        .await
        .unwrap();
    assert_eq!(full.len(), 1);
    let (key, row) = full.iter().next().unwrap();
    assert_eq!(row["id"], json!(key));
    assert_eq!(row["city"], "Los Angeles");
    assert!(row.contains_key("age"));
}

#[tokio::test]
async fn list_only_projects_keys() {
    let m = people().await;
    let rows = m
        .list_only(&q(json!({"first_name": "Alice"})), &["first_name", "age"], &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(Value::Object(rows[0].clone()), json!({"first_name": "Alice", "age": 30}));
}

#[tokio::test]
async fn create_many_is_all_or_nothing() {
    let m = people().await;
    let rows = vec![
        rec(json!({"first_name": "Gina", "last_name": "Ok", "city": "X", "age": 1, "score": 0, "high_score": 0})),
        rec(json!({"first_name": "Hank", "last_name": "Bad", "city": "X", "age": "old", "score": 0, "high_score": 0})),
    ];
    assert!(m.create_many(&rows).await.is_err());
    assert_eq!(m.count(&q(json!({"city": "X"}))).await.unwrap(), 0);
}
