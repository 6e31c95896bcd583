use axum::{
    extract::{DefaultBodyLimit, Extension},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use lms_api::config::jwt::JwtConfig;
use lms_api::config::media::MediaConfig;
use lms_api::error::AppError;
use lms_api::services::email::EmailService;
use lms_api::services::media::MAX_FILE_SIZE;
use lms_api::{config, migration, routes};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // User routes
        lms_api::handlers::user::register,
        lms_api::handlers::user::login,
        lms_api::handlers::user::logout,
        lms_api::handlers::user::get_profile,
        lms_api::handlers::user::forgot_password,
        lms_api::handlers::user::reset_password,
        lms_api::handlers::user::change_password,
        lms_api::handlers::user::update_user,
        // Course routes
        lms_api::handlers::course::list_courses,
        lms_api::handlers::course::get_lectures,
        lms_api::handlers::course::create_course,
        lms_api::handlers::course::update_course,
        lms_api::handlers::course::delete_course,
        lms_api::handlers::course::add_lecture,
        lms_api::handlers::course::remove_lecture,
    ),
    components(
        schemas(
            lms_api::response::ApiResponse<serde_json::Value>,
            lms_api::error::AppError,
            // Users
            lms_api::handlers::user::RegisterInput,
            lms_api::handlers::user::LoginRequest,
            lms_api::handlers::user::ForgotPasswordRequest,
            lms_api::handlers::user::ResetPasswordRequest,
            lms_api::handlers::user::ChangePasswordRequest,
            lms_api::handlers::user::UserResponse,
            lms_api::handlers::user::MediaRefResponse,
            // Courses
            lms_api::handlers::course::CourseResponse,
            lms_api::handlers::course::LectureResponse,
            lms_api::handlers::course::UpdateCourseRequest,
            lms_api::handlers::course::RemoveLectureQuery,
        )
    ),
    tags(
        (name = "users", description = "Registration, sessions and password lifecycle"),
        (name = "courses", description = "Course catalog and lecture management"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lms_api=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let (jwt_config, media_config) = validate_config()?;

    tracing::info!("Starting LMS API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let email_service = EmailService::from_env();
    if email_service.is_configured() {
        tracing::info!("SMTP email service configured");
    } else {
        tracing::warn!("SMTP not configured, reset emails will be skipped");
    }

    let app = create_app(&media_config)
        .layer(Extension(db))
        .layer(Extension(jwt_config))
        .layer(Extension(media_config))
        .layer(Extension(email_service));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<(JwtConfig, MediaConfig)> {
    // Session-token config — secret presence and length checked here
    let jwt_config = JwtConfig::from_env()?;

    // DATABASE_URL — checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    // Media root — create if needed
    let media_config = MediaConfig::from_env();
    std::fs::create_dir_all(&media_config.root_dir).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create upload directory '{}': {}",
            media_config.root_dir,
            e
        )
    })?;

    Ok((jwt_config, media_config))
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins).allow_credentials(true)
    }
}

fn create_app(media_config: &MediaConfig) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/ping", get(ping))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/uploads", ServeDir::new(&media_config.root_dir))
        .fallback(handler_404)
        .layer(axum::middleware::from_fn(
            lms_api::middleware::security::security_headers_middleware,
        ))
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "LMS API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn ping() -> &'static str {
    "Pong"
}

async fn handler_404() -> AppError {
    AppError::NotFound
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
