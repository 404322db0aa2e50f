//! JSON endpoints: listing, search, and the mutation operations.

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;

use api::{
    Ack, CreateFolderRequest, DeleteRequest, Listing, MoveRequest, PathQuery, RenameRequest,
    SearchQuery, UploadReport,
};

use crate::fs::{RemovedKind, UploadItem};

use super::{run_blocking, ApiError, SharedState};

/// GET `/api/list`: directory listing, root when no path is given.
pub async fn list(
    State(state): State<SharedState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Listing>, ApiError> {
    let path = query.path.unwrap_or_else(|| "/".to_string());
    let catalog = state.catalog.clone();
    let listing = run_blocking(move || catalog.list(&path)).await?;
    Ok(Json(listing))
}

/// GET `/api/search`: recursive name search under the root.
pub async fn search(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Listing>, ApiError> {
    let needle = query.query.unwrap_or_default();
    let finder = state.finder.clone();
    let listing = run_blocking(move || finder.search(&needle)).await?;
    Ok(Json(listing))
}

/// POST `/api/create_folder`.
pub async fn create_folder(
    State(state): State<SharedState>,
    Json(request): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<Ack>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("folder name is required".to_string()));
    }
    let mutator = state.mutator.clone();
    let name =
        run_blocking(move || mutator.create_folder(&request.parent_path, &request.name)).await?;
    Ok((
        StatusCode::CREATED,
        Json(Ack::new(format!("Folder '{name}' created"))),
    ))
}

/// POST `/api/upload`: multipart body with any number of file parts and an
/// optional `path` text part naming the destination folder.
pub async fn upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Ack>), ApiError> {
    let mut destination = "/".to_string();
    let mut items = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(format!("malformed upload request: {err}")))?
    {
        if let Some(file_name) = field.file_name().map(ToString::to_string) {
            let data = field
                .bytes()
                .await
                .map_err(|err| ApiError::BadRequest(format!("failed reading upload: {err}")))?;
            items.push(upload_item(&file_name, data));
        } else if field.name() == Some("path") {
            destination = field
                .text()
                .await
                .map_err(|err| ApiError::BadRequest(format!("failed reading upload: {err}")))?;
        }
    }

    if items.is_empty() {
        return Err(ApiError::BadRequest("no files in request".to_string()));
    }

    let mutator = state.mutator.clone();
    let report = run_blocking(move || mutator.upload(&destination, items)).await?;
    respond_upload(report)
}

/// Map one multipart file part onto an upload item. Folder uploads arrive
/// with `/`-separated filenames; those keep their tree position.
fn upload_item(file_name: &str, data: Bytes) -> UploadItem {
    if file_name.contains('/') {
        UploadItem::nested(file_name, data)
    } else {
        UploadItem::flat(file_name, data)
    }
}

/// Turn the engine's upload report into a response: all-skipped is a client
/// error, all-failed a server error, anything else a (possibly partial)
/// success.
fn respond_upload(report: UploadReport) -> Result<(StatusCode, Json<Ack>), ApiError> {
    if report.written == 0 {
        if report.errors.is_empty() {
            return Err(ApiError::BadRequest("no files selected".to_string()));
        }
        return Err(ApiError::Internal(format!(
            "no files uploaded: {}",
            report.errors.join("; ")
        )));
    }
    let mut message = format!("{} file(s) uploaded", report.written);
    if !report.errors.is_empty() {
        message.push_str(&format!(" ({} failed)", report.errors.len()));
    }
    Ok((StatusCode::CREATED, Json(Ack::new(message))))
}

/// DELETE `/api/delete`.
pub async fn remove(
    State(state): State<SharedState>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<Ack>, ApiError> {
    let mutator = state.mutator.clone();
    let path = request.path.clone();
    let kind = run_blocking(move || mutator.remove(&request.path)).await?;
    let noun = match kind {
        RemovedKind::Folder => "Folder",
        RemovedKind::File => "File",
    };
    Ok(Json(Ack::new(format!("{noun} '{path}' deleted"))))
}

/// POST `/api/rename`.
pub async fn rename(
    State(state): State<SharedState>,
    Json(request): Json<RenameRequest>,
) -> Result<Json<Ack>, ApiError> {
    if request.new_name.trim().is_empty() {
        return Err(ApiError::BadRequest("new name is required".to_string()));
    }
    let mutator = state.mutator.clone();
    let name = run_blocking(move || mutator.rename(&request.path, &request.new_name)).await?;
    Ok(Json(Ack::new(format!("Renamed to '{name}'"))))
}

/// POST `/api/move`.
pub async fn relocate(
    State(state): State<SharedState>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<Ack>, ApiError> {
    let mutator = state.mutator.clone();
    let new_path =
        run_blocking(move || mutator.relocate(&request.source, &request.destination)).await?;
    Ok(Json(Ack::new(format!("Moved to '{new_path}'"))))
}
