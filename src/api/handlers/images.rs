use crate::api::error::AppError;
use crate::services::gallery_service::ImageFilter;
use crate::services::upload::naming::content_type_for;
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::Response,
};
use validator::Validate;

use super::types::*;

#[utoipa::path(
    get,
    path = "/images",
    params(ListImagesQuery),
    responses(
        (status = 200, description = "Images matching the filters", body = [ImageResponse])
    ),
    tag = "images"
)]
pub async fn list_images(
    State(state): State<crate::AppState>,
    Query(query): Query<ListImagesQuery>,
) -> Result<Json<Vec<ImageResponse>>, AppError> {
    let images = state
        .gallery_service
        .list_images(ImageFilter {
            search: query.search,
            category_id: query.category,
            tag_id: query.tag,
        })
        .await?;

    Ok(Json(images.into_iter().map(ImageResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/images/{id}",
    params(("id" = String, Path, description = "Image id")),
    responses(
        (status = 200, description = "Image with its classification", body = ImageResponse),
        (status = 404, description = "Image not found")
    ),
    tag = "images"
)]
pub async fn get_image(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<ImageResponse>, AppError> {
    let image = state.gallery_service.get_image(&id).await?;
    Ok(Json(image.into()))
}

#[utoipa::path(
    get,
    path = "/images/{id}/content",
    params(("id" = String, Path, description = "Image id")),
    responses(
        (status = 200, description = "Stored image bytes"),
        (status = 404, description = "Image or its content not found")
    ),
    tag = "images"
)]
pub async fn get_image_content(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (image, bytes) = state.gallery_service.image_content(&id).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&image.path))
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(bytes))
        .map_err(|e| AppError::Anyhow(e.into()))
}

#[utoipa::path(
    put,
    path = "/images/{id}",
    params(("id" = String, Path, description = "Image id")),
    request_body = UpdateImageRequest,
    responses(
        (status = 200, description = "Image updated", body = ImageResponse),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Image not found")
    ),
    tag = "images"
)]
pub async fn update_image(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateImageRequest>,
) -> Result<Json<ImageResponse>, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .gallery_service
        .update_image(&id, req.title, req.description)
        .await?;
    let image = state.gallery_service.get_image(&id).await?;
    Ok(Json(image.into()))
}

#[utoipa::path(
    put,
    path = "/images/{id}/classification",
    params(("id" = String, Path, description = "Image id")),
    request_body = ClassificationRequest,
    responses(
        (status = 200, description = "Categories and tags replaced", body = ImageResponse),
        (status = 400, description = "Unknown category or tag"),
        (status = 404, description = "Image not found")
    ),
    tag = "images"
)]
pub async fn set_classification(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<ClassificationRequest>,
) -> Result<Json<ImageResponse>, AppError> {
    let image = state
        .gallery_service
        .set_classification(&id, req.categories, req.tags)
        .await?;
    Ok(Json(image.into()))
}

#[utoipa::path(
    delete,
    path = "/images/{id}",
    params(("id" = String, Path, description = "Image id")),
    responses(
        (status = 204, description = "Image and stored object deleted"),
        (status = 404, description = "Image not found")
    ),
    tag = "images"
)]
pub async fn delete_image(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.gallery_service.delete_image(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
