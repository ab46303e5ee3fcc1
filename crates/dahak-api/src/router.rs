use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use tower_http::services::{ServeDir, ServeFile};

use crate::auth::{self, AppState};
use crate::error::ApiError;
use crate::middleware::require_auth;
use crate::{categories, files, messages, products, reservations, settings};

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Full HTTP surface: `/api/*`, `/uploads/*` and, when configured, the
/// storefront client for everything else.
pub fn app(state: AppState) -> Router {
    let upload_dir = state.upload_dir.clone();
    let static_dir = state.static_dir.clone();

    let router = Router::new()
        .nest("/api", api_routes(state))
        .nest_service("/uploads", ServeDir::new(upload_dir));

    match static_dir {
        Some(dir) => {
            let index = dir.join("index.html");
            router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        None => router,
    }
}

fn api_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/products", get(products::list_products))
        .route("/products/{id}", get(products::get_product))
        .route("/brands", get(products::list_brands))
        .route("/categories", get(categories::list_categories))
        .route("/reservations", post(reservations::create_reservation))
        .route("/messages", post(messages::send_message))
        .route("/settings", get(settings::get_settings));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route(
            "/upload",
            post(files::upload_image)
                .layer(DefaultBodyLimit::max(state.max_upload_bytes + MULTIPART_OVERHEAD)),
        )
        .route("/products", post(products::create_product))
        .route(
            "/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/categories", post(categories::create_category))
        .route("/categories/{id}", delete(categories::delete_category))
        .route("/reservations", get(reservations::list_reservations))
        .route("/reservations/{id}/status", put(reservations::update_status))
        .route("/reservations/{id}", delete(reservations::delete_reservation))
        .route("/messages", get(messages::get_messages))
        .route("/messages/{id}/read", put(messages::mark_read))
        .route("/messages/{id}", delete(messages::delete_message))
        .route("/settings", post(settings::update_settings))
        .route("/stats", get(settings::get_stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(api_not_found)
        .method_not_allowed_fallback(api_method_not_allowed)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("Not found")
}

async fn api_method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
