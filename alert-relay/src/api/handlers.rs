//! HTTP request handlers

use crate::alarm::AlarmState;
use crate::api::server::AppContext;
use crate::error::{Error, Result};
use crate::images::UploadedImage;
use alert_common::events::ServerEvent;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

/// Multipart field carrying the image
pub const UPLOAD_FIELD: &str = "file";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    git_hash: String,
    alarm: AlarmState,
    audio_initialized: bool,
    connections: usize,
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        alarm: ctx.alarm.state(),
        audio_initialized: ctx.alarm.is_initialized(),
        connections: ctx.state.connection_count().await,
    })
}

// ============================================================================
// Upload Endpoint
// ============================================================================

/// POST /upload-image/ - Store an intruder image
///
/// Expects a multipart body with a `file` field. Non-image content types and
/// malformed bodies are rejected with 400; nothing is written in that case.
pub async fn upload_image(
    State(ctx): State<AppContext>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart =
        multipart.map_err(|e| Error::InvalidInput(format!("Invalid upload: {}", e.body_text())))?;

    let image = read_image_field(&mut multipart).await?;
    let path = ctx.images.save(image).await?;
    let path = path.display().to_string();

    ctx.state.broadcast_event(ServerEvent::ImageStored {
        path: path.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(UploadResponse {
        message: "Image saved.".to_string(),
        path,
    }))
}

/// Pull the `file` field out of the form, skipping any other fields
async fn read_image_field(multipart: &mut Multipart) -> Result<UploadedImage> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Malformed multipart body: {}", e.body_text())))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            warn!("Ignoring unexpected form field {:?}", field.name());
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidInput("Uploaded file has no filename.".to_string()))?;
        let content_type = field.content_type().map(str::to_string);

        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidInput(format!("Failed to read upload: {}", e.body_text())))?;

        info!(
            "Received upload {} ({:?}, {} bytes)",
            filename,
            content_type,
            bytes.len()
        );

        return Ok(UploadedImage {
            filename,
            content_type,
            bytes,
        });
    }

    Err(Error::InvalidInput(format!(
        "Missing form field '{}'.",
        UPLOAD_FIELD
    )))
}

// ============================================================================
// Alarm Endpoint
// ============================================================================

/// POST /stop-alarm/ - Halt the alarm
///
/// Fails only when the audio subsystem never initialized; stopping an idle
/// alarm succeeds.
pub async fn stop_alarm(State(ctx): State<AppContext>) -> Result<Json<MessageResponse>> {
    let alarm = ctx.alarm.clone();
    tokio::task::spawn_blocking(move || alarm.stop())
        .await
        .map_err(|e| Error::Internal(format!("Stop task failed: {}", e)))??;

    info!("Alarm deactivated via API");
    Ok(Json(MessageResponse {
        message: "Alarm deactivated.".to_string(),
    }))
}
