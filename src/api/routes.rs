//! Router construction

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::api::handlers;
use crate::middleware::{IdentityLayer, RateLimitLayer};
use crate::AppState;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let settings = &state.settings;

    // Each call on these routes costs an inference request.
    let mut generation = Router::new()
        .route("/generate-image", post(handlers::generate_image))
        .route("/generations", post(handlers::create_generation));
    if settings.rate_limit.enabled {
        generation = generation.route_layer(RateLimitLayer::new(
            settings.rate_limit.requests_per_second,
            settings.rate_limit.burst_size,
        ));
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/save-user", post(handlers::save_user))
        .route("/images", get(handlers::list_images))
        .route("/events/signed-in", post(handlers::signed_in))
        .merge(generation);

    if let Some(dir) = &state.files_dir {
        router = router.nest_service("/files", ServeDir::new(dir));
    }

    let api_keys = if settings.auth.enabled {
        settings.auth.api_keys.clone()
    } else {
        vec![]
    };

    router
        .layer(IdentityLayer::new(api_keys))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
