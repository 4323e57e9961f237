use crate::api::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        // Analysis
        .route("/v1/analyze", post(handlers::analyze))
        .route("/v1/analyze/batch", post(handlers::analyze_batch))
        // Model lifecycle
        .route("/v1/model/train", post(handlers::train))
        .route("/v1/model/update", post(handlers::update))
        .route("/v1/model/info", get(handlers::model_info))
        .route("/v1/model/evaluate", post(handlers::evaluate))
        .route("/v1/model/ready", get(handlers::ready))
        // Taxonomy
        .route("/v1/categories", get(handlers::categories))
        .route(
            "/v1/categories/:category/subcategories",
            get(handlers::sub_categories),
        )
        // Probability distributions
        .route(
            "/v1/probabilities/categories",
            post(handlers::category_probabilities),
        )
        .route(
            "/v1/probabilities/subcategories",
            post(handlers::sub_category_probabilities),
        )
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
}
