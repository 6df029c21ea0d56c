//! services/api/src/web/upload.rs
//!
//! Image upload pass-through: validate, derive a collision-free key, hand
//! the bytes to object storage.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::Json;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;
use gramseva_core::validation::check_image;

const ALLOWED_BUCKETS: [&str; 2] = ["profile-photos", "work-photos"];

struct UploadFields {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
    bucket: String,
    user_id: String,
    folder: Option<String>,
}

async fn read_fields(mut multipart: Multipart) -> Result<UploadFields, ApiError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut bucket: Option<String> = None;
    let mut user_id: Option<String> = None;
    let mut folder: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("failed to read file: {e}")))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("bucket") => {
                bucket = field.text().await.ok();
            }
            Some("userId") => {
                user_id = field.text().await.ok();
            }
            Some("folder") => {
                folder = field.text().await.ok().filter(|f| !f.is_empty());
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::validation("file is required"))?;
    Ok(UploadFields {
        file_name,
        content_type,
        bytes,
        bucket: bucket.ok_or_else(|| ApiError::validation("bucket is required"))?,
        user_id: user_id.ok_or_else(|| ApiError::validation("userId is required"))?,
        folder,
    })
}

fn extension(file_name: &str, content_type: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_else(|| match content_type {
            "image/png" => "png".to_string(),
            "image/webp" => "webp".to_string(),
            _ => "jpg".to_string(),
        })
}

/// Accepts a multipart image and stores it under
/// `{userId}[/{folder}]/{uuid}.{ext}`.
#[utoipa::path(
    post,
    path = "/upload",
    responses(
        (status = 200, description = "Stored object url and path"),
        (status = 400, description = "Missing field, bad bucket, type or size")
    )
)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let fields = read_fields(multipart).await?;

    if !ALLOWED_BUCKETS.contains(&fields.bucket.as_str()) {
        return Err(ApiError::validation(format!(
            "unknown bucket '{}'",
            fields.bucket
        )));
    }
    check_image(
        &fields.file_name,
        &fields.content_type,
        fields.bytes.len(),
        state.config.max_upload_bytes,
    )
    .map_err(|e| ApiError::validation(e.to_string()))?;

    let ext = extension(&fields.file_name, &fields.content_type);
    let key = match &fields.folder {
        Some(folder) => format!("{}/{}/{}.{}", fields.user_id, folder, Uuid::new_v4(), ext),
        None => format!("{}/{}.{}", fields.user_id, Uuid::new_v4(), ext),
    };

    let stored = state
        .storage
        .put_object(&fields.bucket, &key, fields.bytes, &fields.content_type)
        .await?;
    info!(bucket = %fields.bucket, path = %stored.path, "image stored");
    Ok(Json(json!({ "url": stored.url, "path": stored.path })))
}
