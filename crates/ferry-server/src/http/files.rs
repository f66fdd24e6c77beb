//! File endpoints: list, search, upload, download, delete, cleanup.

use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::Response;
use ferry_core::format::format_size;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::server::AppState;
use crate::storage::{FileEntry, Folder};

use super::error::ApiError;

/// `GET /api/files` — merged listing of both folders.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<FileEntry>>, ApiError> {
    Ok(Json(state.store.list_all().await?))
}

/// Query parameters for `GET /api/files/search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Case-insensitive name substring.
    #[serde(default)]
    pub q: Option<String>,
    /// Extension suffix filter (e.g. `pdf`).
    #[serde(rename = "type", default)]
    pub file_type: Option<String>,
    /// `YYYY-MM-DD` substring matched against the modified date.
    #[serde(default)]
    pub date: Option<String>,
}

/// `GET /api/files/search` — filtered listing.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<FileEntry>>, ApiError> {
    let files = state.store.list_all().await?;
    Ok(Json(apply_filters(files, &params)))
}

fn apply_filters(files: Vec<FileEntry>, params: &SearchParams) -> Vec<FileEntry> {
    files
        .into_iter()
        .filter(|f| {
            if let Some(q) = &params.q {
                if !f.name.to_lowercase().contains(&q.to_lowercase()) {
                    return false;
                }
            }
            if let Some(t) = &params.file_type {
                if !f.name.to_lowercase().ends_with(&t.to_lowercase()) {
                    return false;
                }
            }
            if let Some(date) = &params.date {
                if !f.modified.contains(date.as_str()) {
                    return false;
                }
            }
            true
        })
        .collect()
}

/// `POST /api/upload` — multipart upload from a phone into `inbound/`.
pub async fn upload_phone(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    save_multipart(&state, multipart, Folder::Inbound).await
}

/// `POST /api/upload-pc` — multipart upload from the PC into `outbound/`.
pub async fn upload_pc(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    save_multipart(&state, multipart, Folder::Outbound).await
}

/// Pull the first `file` field out of the multipart body, store it, and
/// announce the upload.
async fn save_multipart(
    state: &AppState,
    mut multipart: Multipart,
    folder: Folder,
) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let Some(file_name) = field.file_name().map(ToOwned::to_owned) else {
            return Err(ApiError::BadRequest("no file name provided".into()));
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;

        let max = state.settings.files.max_upload_bytes;
        if max > 0 && bytes.len() as u64 > max {
            return Err(ApiError::BadRequest(format!(
                "file exceeds the {max}-byte limit"
            )));
        }

        let saved = state.store.save(folder, &file_name, &bytes).await?;
        let size = format_size(saved.size_bytes);

        let _ = state
            .lifecycle
            .record_file_event(
                "upload",
                json!({
                    "filename": saved.name,
                    "size": size,
                    "source": folder.source(),
                }),
            )
            .await;

        return Ok(Json(json!({
            "success": true,
            "filename": saved.name,
            "size": size,
            "sizeBytes": saved.size_bytes,
        })));
    }
    Err(ApiError::BadRequest("no file provided".into()))
}

/// `GET /api/download/{filename}` — stream a stored file as an attachment.
/// The outbound folder wins when both hold the name.
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let (_, path) = state
        .store
        .resolve(&filename)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("file not found: {filename}")))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::Internal(Box::new(e)))?;
    let safe_name = path
        .file_name()
        .map_or_else(|| filename.clone(), |n| n.to_string_lossy().into_owned());

    Response::builder()
        .header(CONTENT_TYPE, "application/octet-stream")
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{safe_name}\""),
        )
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Internal(Box::new(e)))
}

/// `DELETE /api/files/{filename}` — remove a stored file and announce the
/// deletion.
pub async fn delete(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let folder = state.store.delete(&filename).await?;
    let _ = state
        .lifecycle
        .record_file_event(
            "delete",
            json!({
                "filename": filename,
                "source": folder.source(),
            }),
        )
        .await;
    Ok(Json(json!({ "success": true })))
}

/// Body of `POST /api/files/cleanup`.
#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
    /// Age cutoff in hours; defaults from settings when omitted.
    #[serde(default)]
    pub hours: Option<u64>,
}

/// `POST /api/files/cleanup` — delete files older than the cutoff.
pub async fn cleanup(
    State(state): State<AppState>,
    Json(req): Json<CleanupRequest>,
) -> Result<Json<Value>, ApiError> {
    let hours = req
        .hours
        .unwrap_or(state.settings.files.cleanup_default_hours);
    let deleted = state.store.cleanup_older_than(hours).await?;
    Ok(Json(json!({
        "success": true,
        "deletedCount": deleted,
    })))
}
