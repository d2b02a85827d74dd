// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{pages, quiz, teacher},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Quiz pages at `/` and `/test/{tier}/{difficulty}`, assets under `/static`.
/// * JSON API under `/api`.
/// * Global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let page_routes = Router::new()
        .route("/", get(pages::index))
        .route("/test/{tier}/{difficulty}", get(pages::quiz_page))
        .nest_service("/static", ServeDir::new(&state.config.static_dir));

    let api_routes = Router::new()
        .route("/verify-key", post(teacher::verify_key))
        .route("/check-test", post(quiz::check_test))
        .route("/submit-test", post(quiz::submit_test))
        .route("/tests", get(quiz::list_tests))
        .route("/tests/{id}", get(quiz::get_test))
        .route("/statistics", get(quiz::get_statistics))
        .route("/locations", get(quiz::get_locations))
        .route("/clear-database", post(quiz::clear_database));

    Router::new()
        .merge(page_routes)
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
