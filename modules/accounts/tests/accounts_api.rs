use accounts::{load_users, require_bearer, user, Accounts, AccountsConfig, Migrator};
use anyhow::Result;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    middleware::from_fn_with_state,
    Router,
};
use crudkit::Module;
use crudkit_db::{connect_memory, Manager};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn setup() -> Result<DatabaseConnection> {
    let db = connect_memory().await?;
    Migrator::up(&db, None).await?;

    let hash = accounts::infra::crypto::hash_password("dispatch-pw")?;
    let row = json!({
        "email": "dispatch@example.com",
        "first_name": "jane",
        "last_name": "DOE",
        "phone_number": "5550100",
        "password": hash,
    });
    Manager::<user::Entity>::new(db.clone())
        .create(row.as_object().expect("object"))
        .await?;
    Ok(db)
}

fn app(db: &DatabaseConnection) -> Result<Router> {
    let module = Accounts::new(db.clone(), AccountsConfig::default());
    let protected = module
        .register_rest(Router::new())?
        .layer(from_fn_with_state(module.authenticator(), require_bearer));
    module.register_public(protected)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header("authorization", format!("Bearer {t}"));
    }
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

async fn login(app: &Router, username: &str, password: &str) -> Result<(StatusCode, Value)> {
    call(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await
}

async fn token_for(app: &Router) -> Result<String> {
    let (_, body) = login(app, "dispatch@example.com", "dispatch-pw").await?;
    Ok(body["data"]["token"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn login_issues_token_and_revokes_the_previous_one() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;

    let (status, body) = login(&app, "dispatch@example.com", "dispatch-pw").await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["messages"]["message"], "Logged in successful.");
    let first = body["data"]["token"].as_str().unwrap_or_default().to_string();
    assert_eq!(first.len(), 32);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    assert!(body["data"]["created_dtm"].is_string());

    let second = token_for(&app).await?;
    assert_ne!(first, second);

    let (status, _) = call(&app, Method::GET, "/user/profile", Some(&first), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&app, Method::GET, "/user/profile", Some(&second), None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn wrong_credentials_are_rejected() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;

    for (user, pw) in [
        ("dispatch@example.com", "nope"),
        ("ghost@example.com", "dispatch-pw"),
    ] {
        let (status, body) = login(&app, user, pw).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"]["code"], "WRONG_CREDENTIALS");
        assert_eq!(body["errors"]["message"], "Wrong Credentials.");
    }

    let (status, body) = login(&app, "not-an-email", "x").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "username");
    Ok(())
}

#[tokio::test]
async fn bearer_header_must_be_well_formed() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;
    let token = token_for(&app).await?;

    for header in [
        None,
        Some(format!("Token {token}")),
        Some("Bearer".to_string()),
        Some(format!("Bearer {token} extra")),
        Some("Bearer 0000".to_string()),
    ] {
        let mut req = Request::builder().uri("/user/profile");
        if let Some(h) = header {
            req = req.header("authorization", h);
        }
        let response = app.clone().oneshot(req.body(Body::empty())?).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        assert_eq!(body["errors"]["code"], "UNAUTHORIZED");
    }
    Ok(())
}

#[tokio::test]
async fn profile_is_title_cased_and_hides_the_password() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;
    let token = token_for(&app).await?;

    let (status, body) = call(&app, Method::GET, "/user/profile", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], "Jane");
    assert_eq!(body["data"]["last_name"], "Doe");
    assert_eq!(body["data"]["full_name"], "Jane Doe");
    assert!(body["data"].get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn user_crud_checks_email_and_hashes_passwords() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;
    let token = token_for(&app).await?;

    let mut payload = json!({
        "email": "dispatch@example.com",
        "first_name": "Sam",
        "last_name": "Lee",
        "phone_number": "5550101",
        "password": "driver-pw",
    });
    let (status, body) = call(&app, Method::POST, "/user", Some(&token), Some(payload.clone())).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "email");
    assert_eq!(body["errors"][0]["code"], "DUPLICATE_ENTRY");
    assert_eq!(body["errors"][0]["message"], "Already Exist.");

    payload["email"] = json!("driver@example.com");
    let (status, body) = call(&app, Method::POST, "/user", Some(&token), Some(payload)).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"].get("password").is_none());
    let user_id = body["data"]["user_id"].as_str().unwrap_or_default().to_string();

    let stored = Manager::<user::Entity>::new(db.clone())
        .get(json!({"user_id": user_id}).as_object().expect("object"))
        .await?
        .expect("stored user");
    assert!(stored.password.as_deref().is_some_and(|p| p.starts_with("$argon2")));

    let (status, _) = login(&app, "driver@example.com", "driver-pw").await?;
    assert_eq!(status, StatusCode::CREATED);

    // Keeping one's own email is not a duplicate.
    let item = format!("/user/{user_id}");
    let (status, body) = call(
        &app,
        Method::PATCH,
        &item,
        Some(&token),
        Some(json!({"email": "driver@example.com", "first_name": "samuel"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["full_name"], "Samuel Lee");

    let (status, _) = call(&app, Method::DELETE, &item, Some(&token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::GET, &item, Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn users_cannot_delete_themselves() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;
    let token = token_for(&app).await?;

    let (_, me) = call(&app, Method::GET, "/user/profile", Some(&token), None).await?;
    let item = format!("/user/{}", me["data"]["user_id"].as_str().unwrap_or_default());
    let (status, body) = call(&app, Method::DELETE, &item, Some(&token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errors"]["code"], "PERMISSION_DENIED");
    Ok(())
}

#[tokio::test]
async fn logout_revokes_the_token() -> Result<()> {
    let db = setup().await?;
    let app = app(&db)?;
    let token = token_for(&app).await?;

    let (status, body) = call(&app, Method::DELETE, "/auth/logout", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body["messages"]["message"], "Logged out successfully.");

    let (status, _) = call(&app, Method::DELETE, "/auth/logout", Some(&token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn seed_file_replaces_all_users() -> Result<()> {
    let db = setup().await?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("users.json");
    std::fs::write(
        &path,
        serde_json::to_vec(&json!({"data": [
            {"email": "a@example.com", "password": "alpha-pw", "first_name": "Ann"},
            {"email": "b@example.com", "password": "bravo-pw"},
        ]}))?,
    )?;

    assert_eq!(load_users(&db, &path).await?, 2);

    let app = app(&db)?;
    let (status, _) = login(&app, "dispatch@example.com", "dispatch-pw").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login(&app, "a@example.com", "alpha-pw").await?;
    assert_eq!(status, StatusCode::CREATED);

    std::fs::write(&path, br#"{"data": [{"password": "x"}]}"#)?;
    assert!(load_users(&db, &path).await.is_err());
    Ok(())
}
