use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected)
}

/// Credential endpoints: reachable without a session, rate limited hardest.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/users/register", routing::post(handlers::user::register))
        .route("/users/login", routing::post(handlers::user::login))
        .route("/users/logout", routing::post(handlers::user::logout))
        .route("/users/reset", routing::post(handlers::user::forgot_password))
        .route(
            "/users/reset/{resetToken}",
            routing::post(handlers::user::reset_password),
        );

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public catalog reads.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new().route("/courses", routing::get(handlers::course::list_courses));

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Everything behind the session middleware. Admin-only handlers run their
/// own role check on top of it.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Users
        .route("/users/me", routing::get(handlers::user::get_profile))
        .route(
            "/users/change-password",
            routing::post(handlers::user::change_password),
        )
        .route("/users/update", routing::put(handlers::user::update_user))
        // Courses
        .route("/courses", routing::post(handlers::course::create_course))
        .route(
            "/courses/lectures",
            routing::delete(handlers::course::remove_lecture),
        )
        .route(
            "/courses/{id}",
            routing::get(handlers::course::get_lectures)
                .put(handlers::course::update_course)
                .delete(handlers::course::delete_course)
                .post(handlers::course::add_lecture),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
