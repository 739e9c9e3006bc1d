//! Image uploads

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use crate::middleware::AnyAuth;
use crate::services::{ServiceFactory, StoredObject};
use crate::utils::errors::{Result, WaddleError};

const FILE_FIELD: &str = "file";

fn multipart_error(error: MultipartError) -> WaddleError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        WaddleError::PayloadTooLarge(error.body_text())
    } else {
        WaddleError::BadRequest(error.body_text())
    }
}

/// Multipart upload with the image in the `file` field
pub async fn upload_image(
    State(services): State<ServiceFactory>,
    auth: AnyAuth,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredObject>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(multipart_error)?;
        if bytes.len() > services.upload_service.max_bytes() {
            return Err(WaddleError::PayloadTooLarge(format!(
                "images are limited to {} bytes",
                services.upload_service.max_bytes()
            )));
        }

        let stored = services.upload_service.store_image(bytes.to_vec()).await?;
        debug!(account_id = %auth.actor.id, key = %stored.key, "Image uploaded");
        return Ok((StatusCode::CREATED, Json(stored)));
    }

    Err(WaddleError::Validation(format!("multipart field '{FILE_FIELD}' is required")))
}
