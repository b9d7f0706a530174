use axum::Json;
use axum::extract::{Multipart, State};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::server::{ApiError, AppState};

/// Multipart part carrying the source contents
const FILE_FIELD: &str = "file";
/// Optional multipart part naming the upload
const FILE_NAME_FIELD: &str = "file_name";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub records: usize,
}

/// POST /promotions
///
/// Replaces the promotion source with the uploaded file and reloads it.
pub async fn upload_promotions(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut contents: Option<Bytes> = None;
    let mut file_name: Option<String> = None;
    let mut part_file_name: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                part_file_name = field.file_name().map(str::to_owned);
                contents = Some(field.bytes().await?);
            }
            Some(FILE_NAME_FIELD) => file_name = Some(field.text().await?),
            other => debug!(field = ?other, "ignoring multipart field"),
        }
    }

    let contents = contents
        .ok_or_else(|| ApiError::BadRequest(format!("Missing multipart field '{}'", FILE_FIELD)))?;
    let file_name = file_name.or(part_file_name).unwrap_or_default();

    info!(file_name = %file_name, bytes = contents.len(), "received promotion upload");
    let records = state.loader.install(contents).await?;

    Ok(Json(UploadResponse {
        message: format!("File {} Uploaded successfully", file_name),
        records,
    }))
}
