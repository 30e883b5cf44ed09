//! HTTP API - Routing, shared state and the response envelope.
//!
//! Routes are grouped by the role they require. Public routes carry no gate,
//! user routes sit behind [`require_auth`], and admin routes additionally sit
//! behind [`require_admin`].

pub mod handlers;
pub mod response;


pub use response::ApiResponse;

use crate::{
    auth::{JwtService, require_admin, require_auth},
    config::AppConfig,
};
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use handlers::{admin, auth, event, generics, order, product, user};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// State shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Token issuer and validator
    pub jwt: Arc<JwtService>,
    /// Loaded application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Builds the state, deriving the token service from `[security]`.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        let jwt = JwtService::from_config(&config.security);
        Self {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(generics::health))
        .route("/version", get(generics::version))
        .route("/last_changed", get(generics::last_changed))
        .route("/auth/login", post(auth::login));

    let user_routes = Router::new()
        .route("/auth/test", get(auth::test))
        .route("/event/current", get(event::current))
        .route("/event/all", get(event::all))
        .route("/event/last_changed", get(event::last_changed))
        .route("/event/{uuid}", get(event::by_uuid))
        .route("/product/all", get(product::all))
        .route("/product/last_changed", get(product::last_changed))
        .route("/product/{uuid}", get(product::by_uuid))
        .route("/order/current", get(order::current))
        .route("/order/all", get(order::all))
        .route("/order/last_changed", get(order::last_changed))
        .route("/order/event/{uuid}", get(order::by_event))
        .route("/order/add", post(order::add))
        .route("/order/edit", put(order::edit))
        .route("/order/delete", delete(order::delete))
        .route("/order/{uuid}", get(order::by_uuid))
        .route("/user/all", get(user::all))
        .route("/user/{uuid}", get(user::by_uuid))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Layers run bottom-up: authenticate, then check the admin flag
    let admin_routes = Router::new()
        .route("/auth/admin/test", get(auth::admin_test))
        .route("/admin/product/populate", get(admin::populate_products))
        .route("/admin/product/delete/{uuid}", delete(admin::delete_product))
        .route("/admin/user/add", post(admin::add_user))
        .route("/admin/user/delete/{uuid}", delete(admin::delete_user))
        .route("/admin/event/add", post(admin::add_event))
        .route("/admin/event/activate/{uuid}", put(admin::activate_event))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public)
        .merge(user_routes)
        .merge(admin_routes)
        .fallback(generics::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
