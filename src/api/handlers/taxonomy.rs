use crate::api::error::AppError;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use super::types::*;

#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "All categories", body = [NamedRef])),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<NamedRef>>, AppError> {
    let categories = state.gallery_service.list_categories().await?;
    Ok(Json(categories.into_iter().map(NamedRef::from).collect()))
}

#[utoipa::path(
    post,
    path = "/categories",
    request_body = NameRequest,
    responses(
        (status = 201, description = "Category created", body = NamedRef),
        (status = 409, description = "Name already taken")
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<crate::AppState>,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<NamedRef>), AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let category = state.gallery_service.create_category(&req.name).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

#[utoipa::path(
    put,
    path = "/categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Category renamed", body = NamedRef),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Name already taken")
    ),
    tag = "categories"
)]
pub async fn rename_category(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<NameRequest>,
) -> Result<Json<NamedRef>, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let category = state.gallery_service.rename_category(&id, &req.name).await?;
    Ok(Json(category.into()))
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.gallery_service.delete_category(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/tags",
    responses((status = 200, description = "All tags", body = [NamedRef])),
    tag = "tags"
)]
pub async fn list_tags(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<NamedRef>>, AppError> {
    let tags = state.gallery_service.list_tags().await?;
    Ok(Json(tags.into_iter().map(NamedRef::from).collect()))
}

#[utoipa::path(
    post,
    path = "/tags",
    request_body = NameRequest,
    responses(
        (status = 201, description = "Tag created", body = NamedRef),
        (status = 409, description = "Name already taken")
    ),
    tag = "tags"
)]
pub async fn create_tag(
    State(state): State<crate::AppState>,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<NamedRef>), AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let tag = state.gallery_service.create_tag(&req.name).await?;
    Ok((StatusCode::CREATED, Json(tag.into())))
}

#[utoipa::path(
    put,
    path = "/tags/{id}",
    params(("id" = String, Path, description = "Tag id")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Tag renamed", body = NamedRef),
        (status = 404, description = "Tag not found"),
        (status = 409, description = "Name already taken")
    ),
    tag = "tags"
)]
pub async fn rename_tag(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<NameRequest>,
) -> Result<Json<NamedRef>, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let tag = state.gallery_service.rename_tag(&id, &req.name).await?;
    Ok(Json(tag.into()))
}

#[utoipa::path(
    delete,
    path = "/tags/{id}",
    params(("id" = String, Path, description = "Tag id")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found")
    ),
    tag = "tags"
)]
pub async fn delete_tag(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.gallery_service.delete_tag(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
