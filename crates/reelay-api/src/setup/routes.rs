//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use reelay_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let api = Router::new()
        .route(
            &format!("{}/images", API_PREFIX),
            post(handlers::image_upload::upload_images),
        )
        .route(
            &format!("{}/images/{{filename}}", API_PREFIX),
            get(handlers::image_get::get_image),
        )
        .route(
            &format!("{}/videos", API_PREFIX),
            post(handlers::video_upload::upload_video),
        )
        .route(
            &format!("{}/videos/hls", API_PREFIX),
            post(handlers::hls_upload::upload_video_hls),
        )
        .route(
            &format!("{}/videos/{{job_id}}/status", API_PREFIX),
            get(handlers::job_status::get_job_status),
        )
        .route(
            &format!("{}/videos/{{filename}}/stream", API_PREFIX),
            get(handlers::video_stream::stream_video),
        )
        .route(
            &format!("{}/videos/{{job_id}}/stream/master.m3u8", API_PREFIX),
            get(handlers::hls_stream::stream_master_playlist),
        )
        .route(
            &format!("{}/videos/{{job_id}}/stream/{{variant}}/index.m3u8", API_PREFIX),
            get(handlers::hls_stream::stream_variant_playlist),
        )
        .route(
            &format!("{}/videos/{{job_id}}/stream/{{variant}}/{{segment}}", API_PREFIX),
            get(handlers::hls_stream::stream_segment),
        )
        .route("/health", get(handlers::health::health))
        .with_state(state);

    let max_body = config.max_request_body_size();

    let app = api
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(Router::from(
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"),
        ))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();

        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
