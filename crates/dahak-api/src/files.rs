use axum::{
    Extension, Json,
    extract::{Multipart, State},
};
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

use dahak_types::api::{Claims, UploadResponse};

use crate::auth::AppState;
use crate::error::ApiError;

/// Multipart field carrying the file.
const FIELD_NAME: &str = "image";
const MAX_NAME_LEN: usize = 80;

/// POST /api/upload: stores one image under the upload directory and
/// returns its public `/uploads/...` URL.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FIELD_NAME) {
            continue;
        }
        let original_name = field.file_name().unwrap_or("image").to_string();
        let bytes = field.bytes().await?;
        upload = Some((original_name, bytes));
        break;
    }

    let (original_name, bytes) = upload.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    if bytes.is_empty() {
        return Err(ApiError::bad_request("No file uploaded"));
    }
    if bytes.len() > state.max_upload_bytes {
        return Err(ApiError::bad_request(format!(
            "File too large: {} bytes (max {})",
            bytes.len(),
            state.max_upload_bytes
        )));
    }

    let ext = detect_image_type(&bytes)
        .ok_or_else(|| ApiError::bad_request("Unsupported image format"))?;
    let filename = stored_name(&original_name, ext);

    tokio::fs::create_dir_all(&state.upload_dir).await.map_err(|e| {
        error!("Failed to create uploads directory: {}", e);
        ApiError::Internal
    })?;

    let path = state.upload_dir.join(&filename);
    let mut file = tokio::fs::File::create(&path).await.map_err(|e| {
        error!("Failed to create file {}: {}", path.display(), e);
        ApiError::Internal
    })?;
    file.write_all(&bytes).await.map_err(|e| {
        error!("Failed to write file {}: {}", path.display(), e);
        ApiError::Internal
    })?;

    info!("{} uploaded {} ({} bytes)", claims.username, filename, bytes.len());

    Ok(Json(UploadResponse {
        url: format!("/uploads/{}", filename),
    }))
}

/// File extension for a supported image, judged by magic bytes.
pub fn detect_image_type(data: &[u8]) -> Option<&'static str> {
    if data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF] {
        Some("jpg")
    } else if data.len() >= 8 && data[..8] == [137, 80, 78, 71, 13, 10, 26, 10] {
        Some("png")
    } else if data.len() >= 6 && (&data[..6] == b"GIF87a" || &data[..6] == b"GIF89a") {
        Some("gif")
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// `<unix millis>-<random>-<sanitized stem>.<ext>`. The extension always
/// comes from the sniffed type, never from the client.
fn stored_name(original: &str, ext: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let stem = base.rsplit_once('.').map(|(s, _)| s).unwrap_or(base);

    let mut clean: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(MAX_NAME_LEN)
        .collect();
    if clean.trim_matches('_').is_empty() {
        clean = "image".to_string();
    }

    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::random::<u32>() % 1_000_000_000;
    format!("{}-{}-{}.{}", millis, suffix, clean, ext)
}
