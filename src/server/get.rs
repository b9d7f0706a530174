use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::encoding::Record;
use crate::server::{ApiError, AppState};

/// GET /promotions/:id
///
/// The id must be a UUID in any form `uuid` accepts; lookups use its
/// lowercase hyphenated form.
pub async fn get_promotion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::InvalidId)?;

    state
        .store
        .get(&id.hyphenated().to_string())
        .map(Json)
        .ok_or(ApiError::NotFound)
}
