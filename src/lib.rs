pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;

use crate::config::GalleryConfig;
use crate::services::gallery_service::GalleryService;
use crate::services::storage::StorageService;
use crate::services::upload_service::UploadService;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::uploads::submit_batch,
        api::handlers::uploads::get_batch_progress,
        api::handlers::uploads::cancel_batch,
        api::handlers::images::list_images,
        api::handlers::images::get_image,
        api::handlers::images::get_image_content,
        api::handlers::images::update_image,
        api::handlers::images::set_classification,
        api::handlers::images::delete_image,
        api::handlers::taxonomy::list_categories,
        api::handlers::taxonomy::create_category,
        api::handlers::taxonomy::rename_category,
        api::handlers::taxonomy::delete_category,
        api::handlers::taxonomy::list_tags,
        api::handlers::taxonomy::create_tag,
        api::handlers::taxonomy::rename_tag,
        api::handlers::taxonomy::delete_tag,
        api::handlers::stats::get_stats,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::types::UploadAcceptedResponse,
            api::handlers::types::FileProgressEntry,
            api::handlers::types::BatchProgressResponse,
            api::handlers::types::NamedRef,
            api::handlers::types::ImageResponse,
            api::handlers::types::UpdateImageRequest,
            api::handlers::types::ClassificationRequest,
            api::handlers::types::NameRequest,
            api::handlers::types::StatsResponse,
            services::upload::UploadStage,
            services::upload::LedgerSummary,
        )
    ),
    tags(
        (name = "uploads", description = "Batched image uploads"),
        (name = "images", description = "Image management endpoints"),
        (name = "categories", description = "Category management endpoints"),
        (name = "tags", description = "Tag management endpoints"),
        (name = "system", description = "Health and diagnostics")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub upload_service: Arc<UploadService>,
    pub gallery_service: Arc<GalleryService>,
    pub config: GalleryConfig,
}

pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/stats", get(api::handlers::stats::get_stats))
        .route(
            "/uploads",
            post(api::handlers::uploads::submit_batch)
                .layer(axum::extract::DefaultBodyLimit::max(
                    state.config.max_request_size,
                )),
        )
        .route(
            "/uploads/:batch_id",
            get(api::handlers::uploads::get_batch_progress),
        )
        .route(
            "/uploads/:batch_id/cancel",
            post(api::handlers::uploads::cancel_batch),
        )
        .route("/images", get(api::handlers::images::list_images))
        .route(
            "/images/:id",
            get(api::handlers::images::get_image)
                .put(api::handlers::images::update_image)
                .delete(api::handlers::images::delete_image),
        )
        .route(
            "/images/:id/content",
            get(api::handlers::images::get_image_content),
        )
        .route(
            "/images/:id/classification",
            put(api::handlers::images::set_classification),
        )
        .route(
            "/categories",
            get(api::handlers::taxonomy::list_categories)
                .post(api::handlers::taxonomy::create_category),
        )
        .route(
            "/categories/:id",
            put(api::handlers::taxonomy::rename_category)
                .delete(api::handlers::taxonomy::delete_category),
        )
        .route(
            "/tags",
            get(api::handlers::taxonomy::list_tags).post(api::handlers::taxonomy::create_tag),
        )
        .route(
            "/tags/:id",
            put(api::handlers::taxonomy::rename_tag).delete(api::handlers::taxonomy::delete_tag),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
