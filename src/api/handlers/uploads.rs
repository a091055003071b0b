use crate::api::error::AppError;
use crate::services::upload::{ClassificationSelection, FileSubmission};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::types::*;

#[utoipa::path(
    post,
    path = "/uploads",
    request_body(content = Multipart, description = "Repeated `file` parts plus optional repeated `category_id` and `tag_id` fields"),
    responses(
        (status = 202, description = "Batch accepted", body = UploadAcceptedResponse),
        (status = 400, description = "Bad request"),
        (status = 413, description = "A file exceeds the size limit")
    ),
    tag = "uploads"
)]
pub async fn submit_batch(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadAcceptedResponse>), AppError> {
    let mut files = Vec::new();
    let mut selection = ClassificationSelection::default();

    let result: Result<(), AppError> = async {
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("length limit exceeded") {
                AppError::PayloadTooLarge(
                    "Request body exceeds the maximum allowed limit".to_string(),
                )
            } else {
                AppError::BadRequest(err_msg)
            }
        })? {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                "file" => {
                    let filename = field.file_name().unwrap_or("unnamed").trim().to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if bytes.len() > state.config.max_file_size {
                        return Err(AppError::PayloadTooLarge(format!(
                            "{} exceeds the maximum file size",
                            filename
                        )));
                    }
                    files.push(FileSubmission::new(filename, bytes));
                }
                "category_id" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if !text.trim().is_empty() {
                        selection.category_ids.push(text.trim().to_string());
                    }
                }
                "tag_id" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if !text.trim().is_empty() {
                        selection.tag_ids.push(text.trim().to_string());
                    }
                }
                other => tracing::debug!("Ignoring unknown upload field '{}'", other),
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = result {
        // Drain the rest so the client sees the error instead of a reset
        tracing::warn!("Upload rejected early: {}. Consuming remaining stream...", e);
        while let Ok(Some(mut field)) = multipart.next_field().await {
            while let Ok(Some(_)) = field.chunk().await {}
        }
        return Err(e);
    }

    if files.is_empty() {
        return Err(AppError::BadRequest("No files provided".to_string()));
    }

    let total_files = files.len();
    let batch = state.upload_service.submit(files, selection)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadAcceptedResponse {
            batch_id: batch.id.to_string(),
            total_files,
            groups: batch.group_count,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/uploads/{batch_id}",
    params(("batch_id" = String, Path, description = "Upload batch id")),
    responses(
        (status = 200, description = "Live batch progress", body = BatchProgressResponse),
        (status = 404, description = "Unknown batch")
    ),
    tag = "uploads"
)]
pub async fn get_batch_progress(
    State(state): State<crate::AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<BatchProgressResponse>, AppError> {
    let batch = state
        .upload_service
        .get(&batch_id)
        .ok_or_else(|| AppError::NotFound(format!("Upload batch {} not found", batch_id)))?;

    Ok(Json(BatchProgressResponse::from(batch.as_ref())))
}

#[utoipa::path(
    post,
    path = "/uploads/{batch_id}/cancel",
    params(("batch_id" = String, Path, description = "Upload batch id")),
    responses(
        (status = 202, description = "Cancellation requested"),
        (status = 404, description = "Unknown batch")
    ),
    tag = "uploads"
)]
pub async fn cancel_batch(
    State(state): State<crate::AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.upload_service.cancel(&batch_id) {
        return Err(AppError::NotFound(format!(
            "Upload batch {} not found",
            batch_id
        )));
    }
    Ok(StatusCode::ACCEPTED)
}
