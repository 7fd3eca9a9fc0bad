use axum::body::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    EventImages,
    Gallery,
    Avatars,
    QrCodes,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::EventImages => "event-images",
            Bucket::Gallery => "gallery",
            Bucket::Avatars => "avatars",
            Bucket::QrCodes => "qr-codes",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "event-images" => Some(Bucket::EventImages),
            "gallery" => Some(Bucket::Gallery),
            "avatars" => Some(Bucket::Avatars),
            "qr-codes" => Some(Bucket::QrCodes),
            _ => None,
        }
    }
}

pub fn validate_upload(content_type: &str, len: usize) -> Result<(), AppError> {
    if !content_type.starts_with("image/") {
        return Err(AppError::Validation("Only image uploads are allowed".into()));
    }
    if len == 0 {
        return Err(AppError::Validation("The file is empty".into()));
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation("Images must be 5MB or smaller".into()));
    }
    Ok(())
}

/// Random object name; keeps a sane extension from the upload when there is one.
pub fn object_name(original_filename: Option<&str>, content_type: &str) -> String {
    let from_name = original_filename
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    let ext = from_name.unwrap_or_else(|| {
        match content_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/svg+xml" => "svg",
            _ => "img",
        }
        .to_string()
    });

    format!("{}.{}", Uuid::new_v4(), ext)
}

pub fn public_url(storage_base: &str, bucket: Bucket, name: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        storage_base.trim_end_matches('/'),
        bucket.as_str(),
        name
    )
}

/// Uploads an image to the hosted storage bucket and returns its public URL.
pub async fn upload_image(
    config: &Config,
    access_token: &str,
    bucket: Bucket,
    original_filename: Option<&str>,
    content_type: &str,
    bytes: Bytes,
) -> Result<String, AppError> {
    validate_upload(content_type, bytes.len())?;

    let name = object_name(original_filename, content_type);
    let url = format!(
        "{}/storage/v1/object/{}/{}",
        config.storage_api_url.trim_end_matches('/'),
        bucket.as_str(),
        name
    );

    let client = reqwest::Client::new();
    let mut req = client
        .post(&url)
        .header(AUTHORIZATION, format!("Bearer {}", access_token))
        .header(CONTENT_TYPE, content_type)
        .body(bytes);
    if let Some(key) = config.anon_key.as_deref() {
        req = req.header("apikey", key);
    }

    let resp = req.send().await.map_err(|e| {
        warn!("Storage upload to {} failed: {}", url, e);
        AppError::Upstream("storage unreachable".into())
    })?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        warn!("Storage upload rejected: status={} body={}", status, body);
        return Err(AppError::Upstream(format!("storage returned {}", status)));
    }

    info!("Uploaded {} to bucket {}", name, bucket.as_str());
    Ok(public_url(&config.storage_api_url, bucket, &name))
}
