use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use tracing::warn;

use crate::config::Config;
use crate::error::AppError;
use crate::services::storage_service::{self, Bucket};
use crate::web::middleware::auth::AuthenticatedUser;

/// Takes the first `file` part of a multipart body and stores it in `bucket`.
pub async fn upload_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(bucket): Path<String>,
    State(config): State<Arc<Config>>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let bucket = Bucket::parse(&bucket)
        .ok_or_else(|| AppError::Validation(format!("Unknown bucket: {}", bucket)))?;

    loop {
        let field = multipart.next_field().await.map_err(|e| {
            warn!("Multipart read failed: {}", e);
            AppError::Validation("Could not read the upload".into())
        })?;
        let Some(field) = field else {
            return Err(AppError::Validation("No file in the upload".into()));
        };
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(|s| s.to_string());
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| {
            warn!("Upload body read failed: {}", e);
            AppError::Validation("Images must be 5MB or smaller".into())
        })?;

        let url = storage_service::upload_image(
            &config,
            &auth_user.access_token,
            bucket,
            filename.as_deref(),
            &content_type,
            bytes,
        )
        .await?;
        return Ok(Json(json!({ "url": url })).into_response());
    }
}
