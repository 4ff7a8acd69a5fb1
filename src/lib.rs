pub mod api;
pub mod bridge;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod session;

use crate::config::{PUBLIC_UPLOAD_PREFIX, ServerConfig};
use crate::services::media_service::MediaService;
use crate::services::store::AssetStore;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::media::upload_media,
        api::handlers::health::root,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::media::UploadMediaBody,
            api::handlers::health::HealthResponse,
            models::UploadMediaResponse,
        )
    ),
    tags(
        (name = "media", description = "Captured media uploads"),
        (name = "system", description = "Liveness and health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AssetStore>,
    pub media: Arc<MediaService>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn AssetStore>, config: ServerConfig) -> Self {
        Self {
            media: Arc::new(MediaService::new(store.clone())),
            store,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::health::root))
        .route("/health", get(api::handlers::health::health_check))
        .route("/upload-media", post(api::handlers::media::upload_media))
        .nest_service(PUBLIC_UPLOAD_PREFIX, ServeDir::new(&state.config.upload_dir))
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
