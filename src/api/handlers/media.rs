use crate::AppState;
use crate::api::error::AppError;
use crate::models::{MediaKind, UploadMediaResponse};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use validator::Validate;

const INVALID_REQUEST: &str = "Invalid upload request.";

/// Body of `POST /upload-media`. Fields are optional here so that a missing one
/// is reported as a 400 rather than a deserialization failure.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UploadMediaBody {
    /// "image" or "file"
    #[serde(rename = "type")]
    #[validate(required(message = "type is required"))]
    pub kind: Option<String>,
    /// "camera" or "storage"
    #[validate(required(message = "source is required"))]
    pub source: Option<String>,
    /// Bare base64 or a data URI
    #[validate(
        required(message = "data is required"),
        length(min = 1, message = "data must not be empty")
    )]
    pub data: Option<String>,
}

#[utoipa::path(
    post,
    path = "/upload-media",
    request_body = UploadMediaBody,
    responses(
        (status = 200, description = "Media stored", body = UploadMediaResponse),
        (status = 400, description = "Missing field or unknown type/source combination"),
        (status = 413, description = "Request body exceeds the size limit"),
        (status = 500, description = "Payload could not be decoded or stored")
    ),
    tag = "media"
)]
pub async fn upload_media(
    State(state): State<AppState>,
    body: Result<Json<UploadMediaBody>, JsonRejection>,
) -> Result<Json<UploadMediaResponse>, AppError> {
    let Json(body) = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
        } else {
            warn!("Rejected upload body: {}", rejection.body_text());
            AppError::BadRequest(INVALID_REQUEST.to_string())
        }
    })?;

    body.validate().map_err(|e| {
        warn!("Invalid upload request: {}", e);
        AppError::BadRequest(INVALID_REQUEST.to_string())
    })?;

    let (Some(kind), Some(source), Some(data)) = (body.kind, body.source, body.data) else {
        return Err(AppError::BadRequest(INVALID_REQUEST.to_string()));
    };

    let Some((kind, source)) = MediaKind::classify(&kind, &source) else {
        warn!(kind = %kind, source = %source, "Unknown upload type/source combination");
        return Err(AppError::BadRequest(INVALID_REQUEST.to_string()));
    };

    let asset = state.media.save(source, &data).await?;

    info!(
        source = %source,
        file_path = %asset.relative_path,
        size_bytes = asset.size_bytes,
        "📥 Received and saved {} from {}",
        kind.as_str(),
        source
    );

    let noun = match kind {
        MediaKind::Image => "Image",
        MediaKind::File => "File",
    };

    Ok(Json(UploadMediaResponse {
        message: format!("{} from {} uploaded successfully!", noun, source),
        file_path: asset.relative_path,
        file_name: asset.file_name,
        size_bytes: asset.size_bytes,
    }))
}
