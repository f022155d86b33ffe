// src/routes.rs
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;

pub fn create_routes(pool: SqlitePool) -> Router {
    // Only the JSON export is meant for other origins.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let voters = Router::new()
        .route("/polls/voters/", get(handlers::voters))
        .layer(cors);

    Router::new()
        .route("/polls/", get(handlers::index))
        .route("/polls/{id}/", get(handlers::detail))
        .route("/polls/{id}/results/", get(handlers::results))
        .route("/polls/{id}/vote/", post(handlers::vote))
        .route("/health", get(handlers::health))
        .merge(voters)
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}
