#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Once,
};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);

pub const TEST_PASSWORD: &str = "test_password_123";

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        // Secure cookies never come back over plain-http test servers.
        std::env::set_var("SESSION_COOKIE_SECURE", "false");
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    /// Cookie-jar client: carries the session cookie between requests.
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }

    /// A client without the shared cookie jar, for unauthenticated calls.
    pub fn anonymous_client(&self) -> Client {
        Client::new()
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(database_url.as_str())
        .await
        .expect("Failed to connect to test database");

    // Run migrations only once per binary (atomic bool for thread safety).
    // Another test binary may be migrating the same database concurrently,
    // so one failed attempt gets a retry after the dust settles.
    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        if lms_api::migration::Migrator::up(&db, None).await.is_err() {
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            lms_api::migration::Migrator::up(&db, None)
                .await
                .expect("Failed to run migrations");
        }
    }

    let jwt_config = lms_api::config::jwt::JwtConfig::from_env().unwrap();
    let media_config = lms_api::config::media::MediaConfig {
        root_dir: "./test_uploads".to_string(),
    };
    std::fs::create_dir_all(&media_config.root_dir).unwrap();
    let email_service = lms_api::services::email::EmailService::from_env();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(lms_api::routes::create_routes())
        .layer(axum::middleware::from_fn(
            lms_api::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(jwt_config))
        .layer(axum::extract::Extension(media_config))
        .layer(axum::extract::Extension(email_service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let addr_str = format!("http://{}", addr);
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build test client");

    TestApp {
        addr: addr_str,
        db,
        client,
    }
}

/// A unique tag so tests sharing one database never collide, within a run
/// or across runs.
pub fn unique_tag() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Register a fresh user through the real endpoint. The app client keeps
/// the session cookie; returns the generated unique email.
pub async fn create_test_user(app: &TestApp, name: &str) -> String {
    let email = format!("{}_{}@example.com", name, unique_tag());

    let form = reqwest::multipart::Form::new()
        .text("fullName", format!("Test {} Account", name))
        .text("email", email.clone())
        .text("password", TEST_PASSWORD);

    let resp = app
        .client
        .post(app.url("/users/register"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "registration failed for {}", email);

    email
}

pub async fn login(app: &TestApp, email: &str, password: &str) {
    let resp = app
        .client
        .post(app.url("/users/login"))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201, "login failed for {}", email);
}

/// Register a user, flip its role to ADMIN in the database, and log in
/// again so the session token carries the new role.
pub async fn create_admin_user(app: &TestApp, name: &str) -> String {
    let email = create_test_user(app, name).await;

    app.db
        .execute(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            format!("UPDATE users SET role = 'ADMIN' WHERE email = '{}'", email),
        ))
        .await
        .expect("Failed to promote user to admin");

    login(app, &email, TEST_PASSWORD).await;
    email
}

/// Plant reset-token state directly on a user row, bypassing email
/// delivery, so tests can redeem a known plaintext.
pub async fn set_reset_token(
    db: &DatabaseConnection,
    email: &str,
    digest: &str,
    expires: chrono::NaiveDateTime,
) {
    db.execute(Statement::from_string(
        sea_orm::DatabaseBackend::Postgres,
        format!(
            "UPDATE users SET reset_token_hash = '{}', reset_token_expires = '{}' WHERE email = '{}'",
            digest,
            expires.format("%Y-%m-%d %H:%M:%S"),
            email
        ),
    ))
    .await
    .expect("Failed to plant reset token");
}

/// Minimal valid PNG payload (magic bytes only are checked).
pub fn png_bytes() -> Vec<u8> {
    vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]
}

/// Minimal valid MP4 payload: size box + 'ftyp' + brand.
pub fn mp4_bytes() -> Vec<u8> {
    let mut data = vec![0x00, 0x00, 0x00, 0x18];
    data.extend_from_slice(b"ftypisom");
    data.extend_from_slice(&[0u8; 16]);
    data
}
