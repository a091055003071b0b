use crate::api::error::AppError;
use axum::{Json, extract::State};

use super::types::StatsResponse;

#[utoipa::path(
    get,
    path = "/stats",
    responses((status = 200, description = "Image, category and tag totals", body = StatsResponse)),
    tag = "system"
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = state.gallery_service.stats().await?;
    Ok(Json(stats.into()))
}
