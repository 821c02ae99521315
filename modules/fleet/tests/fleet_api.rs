use std::collections::BTreeSet;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Extension, Router,
};
use crudkit::{Module, Principal};
use crudkit_db::{connect_memory, Manager, Query};
use fleet::Fleet;
use notifications::{user_notification, Notifier};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use tower::ServiceExt;

const CALLER: &str = "dispatcher-1";

async fn setup() -> Result<DatabaseConnection> {
    let db = connect_memory().await?;
    notifications::Migrator::up(&db, None).await?;
    fleet::Migrator::up(&db, None).await?;
    Ok(db)
}

fn app(db: &DatabaseConnection) -> Result<Router> {
    let module = Fleet::new(db.clone(), Notifier::new(db.clone()));
    Ok(module.register_rest(Router::new())?.layer(Extension(Principal {
        user_id: CALLER.into(),
        email: "dispatch@example.com".into(),
    })))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&v)?)
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(req.body(body)?).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, json))
}

async fn create(app: &Router, uri: &str, body: Value, key: &str) -> Result<String> {
    let (status, resp) = call(app, Method::POST, uri, Some(body)).await?;
    assert_eq!(status, StatusCode::CREATED, "{resp}");
    Ok(resp["data"][key].as_str().unwrap_or_default().to_string())
}

fn customer(kind: &str, company: &str, first: &str, last: &str, email: &str) -> Value {
    json!({
        "customer_type": kind,
        "company_name": company,
        "first_name": first,
        "last_name": last,
        "mobile_number": "5550100",
        "email": email,
        "address": "1 Dock Road",
    })
}

fn vehicle(name: &str, kind: &str, number: &str) -> Value {
    json!({
        "vehicle_name": name,
        "vehicle_type": kind,
        "vehicle_number": number,
        "vehicle_model": "2021",
        "vehicle_color": "White",
    })
}

fn invoice(number: &str, customer_id: &str, vehicle_id: &str, total: &str, status: &str) -> Value {
    json!({
        "invoice_number": number,
        "customer_id": customer_id,
        "vehicle_id": vehicle_id,
        "date": "2025-03-14",
        "loading_address": "Pune",
        "delivery_address": "Mumbai",
        "weight": "12.5",
        "rate": 80,
        "total": total,
        "status": status,
    })
}

struct Seeded {
    acme: String,
    bob: String,
    truck: String,
    van: String,
}

async fn seed(app: &Router) -> Result<Seeded> {
    let acme = create(
        app,
        "/customer",
        customer("BUSINESS", "Acme Logistics", "alice", "smith", "alice@acme.io"),
        "customer_id",
    )
    .await?;
    let bob = create(
        app,
        "/customer",
        customer("INDIVIDUAL", "Bob Freight", "bob", "jones", "bob@freight.io"),
        "customer_id",
    )
    .await?;
    let truck = create(app, "/vehicle", vehicle("Volvo FH", "TRUCK", "MH12AB1234"), "vehicle_id").await?;
    let van = create(app, "/vehicle", vehicle("Tata Ace", "MINI", "KA01XY9999"), "vehicle_id").await?;

    create(app, "/invoice", invoice("INV-1", &acme, &truck, "1000.50", "PAID"), "invoice_id").await?;
    create(app, "/invoice", invoice("INV-2", &acme, &van, "250", "PENDING"), "invoice_id").await?;
    create(app, "/invoice", invoice("INV-3", &bob, &truck, "400.00", "UNPAID"), "invoice_id").await?;
    Ok(Seeded { acme, bob, truck, van })
}

fn numbers(body: &Value) -> BTreeSet<String> {
    body["data"]["list"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|i| i["invoice_number"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn customer_email_is_unique_among_live_rows() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;

    let payload = customer("BUSINESS", "Acme", "ada", "", "ada@acme.io");
    let (status, body) = call(&app, Method::POST, "/customer", Some(payload.clone())).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["full_name"], "Ada");
    let id = body["data"]["customer_id"].as_str().unwrap_or_default().to_string();

    let (status, body) = call(&app, Method::POST, "/customer", Some(payload.clone())).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "email");
    assert_eq!(body["errors"][0]["code"], "DUPLICATE_ENTRY");

    // Re-submitting one's own email on update is allowed.
    let item = format!("/customer/{id}");
    let (status, _) = call(&app, Method::PUT, &item, Some(payload.clone())).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, Method::DELETE, &item, None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::POST, "/customer", Some(payload)).await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn customer_list_filters_and_searches() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;
    seed(&app).await?;

    let (status, body) = call(&app, Method::GET, "/customer?customer_type=INDIVIDUAL", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["count"], 1);
    assert_eq!(body["data"]["list"][0]["full_name"], "Bob Jones");

    let (_, body) = call(&app, Method::GET, "/customer?search=ACME", None).await?;
    assert_eq!(body["data"]["list"][0]["company_name"], "Acme Logistics");

    let (status, body) = call(&app, Method::GET, "/customer?customer_type=OTHER", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["code"], "INVALID_CHOICE");
    Ok(())
}

#[tokio::test]
async fn vehicle_number_is_unique() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;
    create(&app, "/vehicle", vehicle("Volvo FH", "TRUCK", "MH12AB1234"), "vehicle_id").await?;

    let (status, body) = call(
        &app,
        Method::POST,
        "/vehicle",
        Some(vehicle("Other", "TRUCK", "MH12AB1234")),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "vehicle_number");
    assert_eq!(body["errors"][0]["code"], "DUPLICATE_ENTRY");
    Ok(())
}

#[tokio::test]
async fn invoice_references_must_exist() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;

    let (status, body) = call(
        &app,
        Method::POST,
        "/invoice",
        Some(invoice("INV-9", "missing-customer", "missing-vehicle", "10", "PENDING")),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: BTreeSet<(String, String)> = body["errors"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|e| (e["field"].as_str().unwrap_or_default().to_string(), e["code"].as_str().unwrap_or_default().to_string()))
        .collect();
    assert_eq!(
        fields,
        BTreeSet::from([
            ("customer_id".to_string(), "NO_DATA_FOUND".to_string()),
            ("vehicle_id".to_string(), "NO_DATA_FOUND".to_string()),
        ])
    );
    Ok(())
}

#[tokio::test]
async fn invoice_amounts_are_validated_and_returned_as_numbers() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;
    let s = seed(&app).await?;

    let mut bad = invoice("INV-4", &s.bob, &s.van, "10", "PAID");
    bad["weight"] = json!("1.234");
    let (status, body) = call(&app, Method::POST, "/invoice", Some(bad)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "weight");
    assert_eq!(body["errors"][0]["code"], "MAX_DECIMAL_PLACES");
    assert_eq!(body["errors"][0]["max_limit"], 2);

    let (status, body) = call(
        &app,
        Method::POST,
        "/invoice",
        Some(invoice("INV-4", &s.bob, &s.van, "99.90", "PAID")),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["total"].as_f64(), Some(99.9));
    assert_eq!(body["data"]["weight"].as_f64(), Some(12.5));
    assert_eq!(body["data"]["date"], "2025-03-14");
    Ok(())
}

#[tokio::test]
async fn invoice_creation_notifies_the_creator() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;
    seed(&app).await?;

    let mut q = Query::new();
    q.insert("user_id".into(), json!(CALLER));
    q.insert("is_read".into(), json!(false));
    let inbox = Manager::<user_notification::Entity>::new(db.clone());
    assert_eq!(inbox.count(&q).await?, 3);

    let mut q = Query::new();
    q.insert("message".into(), json!("Invoice INV-2 has been created."));
    let n = Manager::<notifications::notification::Entity>::new(db.clone())
        .get(&q)
        .await?
        .expect("notification for INV-2");
    assert_eq!(n.notification_type, "INVOICE");
    Ok(())
}

#[tokio::test]
async fn invoice_is_created_even_when_notification_fails() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;
    let s = seed(&app).await?;
    db.execute_unprepared("DROP TABLE user_notification_mapping").await?;

    let body = invoice("INV-4", &s.bob, &s.van, "75", "PENDING");
    let (status, resp) = call(&app, Method::POST, "/invoice", Some(body.clone())).await?;
    assert_eq!(status, StatusCode::CREATED, "{resp}");
    assert_eq!(resp["data"]["invoice_number"], "INV-4");

    // a retry sees the committed row
    let (status, resp) = call(&app, Method::POST, "/invoice", Some(body)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["errors"][0]["field"], "invoice_number");
    assert_eq!(resp["errors"][0]["code"], "DUPLICATE_ENTRY");
    Ok(())
}

#[tokio::test]
async fn invoice_list_embeds_and_filters_by_related_rows() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;
    let s = seed(&app).await?;

    let (status, body) = call(&app, Method::GET, "/invoice", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["count"], 3);
    for item in body["data"]["list"].as_array().into_iter().flatten() {
        assert_eq!(item["customer"]["customer_id"], item["customer_id"]);
        assert_eq!(item["vehicle"]["vehicle_id"], item["vehicle_id"]);
    }

    let (_, body) = call(&app, Method::GET, "/invoice?first_name=ALI", None).await?;
    assert_eq!(numbers(&body), BTreeSet::from(["INV-1".to_string(), "INV-2".to_string()]));

    let (_, body) = call(&app, Method::GET, "/invoice?vehicle_number=mh12&status=UNPAID", None).await?;
    assert_eq!(numbers(&body), BTreeSet::from(["INV-3".to_string()]));
    assert_eq!(body["data"]["list"][0]["customer"]["customer_id"], json!(s.bob));
    assert_eq!(body["data"]["list"][0]["vehicle"]["vehicle_id"], json!(s.truck));

    let (_, body) = call(&app, Method::GET, "/invoice?customer_type=BUSINESS&vehicle_type=mini", None).await?;
    assert_eq!(numbers(&body), BTreeSet::from(["INV-2".to_string()]));
    assert_eq!(body["data"]["list"][0]["customer_id"], json!(s.acme));
    assert_eq!(body["data"]["list"][0]["vehicle_id"], json!(s.van));

    let (status, _) = call(&app, Method::GET, "/invoice?company_name=nobody", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn payment_summary_per_customer() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;
    let s = seed(&app).await?;
    create(
        &app,
        "/customer",
        customer("INDIVIDUAL", "Idle Co", "ida", "", "ida@idle.io"),
        "customer_id",
    )
    .await?;

    let (status, body) = call(&app, Method::GET, "/payment", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].get("pagination").is_none());
    let list = body["data"]["list"].as_array().cloned().unwrap_or_default();
    assert_eq!(list.len(), 3);

    let row = |id: &str| list.iter().find(|r| r["customer_id"] == json!(id)).cloned().unwrap_or_default();
    let acme = row(&s.acme);
    assert_eq!(acme["full_name"], "Alice Smith");
    assert_eq!(acme["total_amount"].as_f64(), Some(1250.5));
    assert_eq!(acme["paid_amount"].as_f64(), Some(1000.5));
    assert_eq!(acme["pending_amount"].as_f64(), Some(250.0));

    let bob = row(&s.bob);
    assert_eq!(bob["paid_amount"].as_f64(), Some(0.0));
    assert_eq!(bob["pending_amount"].as_f64(), Some(400.0));

    let idle = list.iter().find(|r| r["full_name"] == "Ida").cloned().unwrap_or_default();
    assert_eq!(idle["total_amount"].as_f64(), Some(0.0));
    Ok(())
}
