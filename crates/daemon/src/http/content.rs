//! Byte-serving endpoints: download, inline view, folder archive.

use std::io;
use std::path::Path;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;

use api::PathQuery;

use crate::fs::FsError;

use super::{run_blocking, ApiError, SharedState};

/// Extensions the browser would download instead of render; `view` serves
/// these as plain text.
const TEXT_FORCED_EXTENSIONS: &[&str] = &[
    "py", "js", "html", "css", "log", "xml", "md", "yml", "yaml", "sh", "bat",
];

/// GET `/api/download`: stream one file as an attachment.
pub async fn download(
    State(state): State<SharedState>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let path = require_file_path(query)?;
    let absolute = state.sandbox.resolve(&path)?;
    let metadata = file_metadata(&absolute, &path).await?;

    let file_name = attachment_name(&absolute);
    let content_type = mime_guess::from_path(&absolute)
        .first_or_octet_stream()
        .to_string();
    let file = tokio::fs::File::open(&absolute)
        .await
        .map_err(FsError::from)?;

    tracing::debug!(file = %path, size = metadata.len(), "download started");
    Ok(stream_response(
        file,
        metadata.len(),
        &content_type,
        &format!("attachment; filename=\"{file_name}\""),
    ))
}

/// GET `/api/view`: stream one file for in-browser display. Source-like
/// files are re-labelled `text/plain` so the browser renders them.
pub async fn view(
    State(state): State<SharedState>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let path = require_file_path(query)?;
    let absolute = state.sandbox.resolve(&path)?;
    let metadata = file_metadata(&absolute, &path).await?;

    let file_name = attachment_name(&absolute);
    let content_type = view_content_type(&absolute);
    let file = tokio::fs::File::open(&absolute)
        .await
        .map_err(FsError::from)?;

    Ok(stream_response(
        file,
        metadata.len(),
        &content_type,
        &format!("inline; filename=\"{file_name}\""),
    ))
}

/// GET `/api/download_folder`: package a folder as a zip and stream it.
pub async fn download_folder(
    State(state): State<SharedState>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let path = require_path(query)?;
    let archiver = state.archiver.clone();
    let archive = run_blocking(move || archiver.build(&path)).await?;

    let file = tokio::fs::File::from_std(archive.file);
    Ok(stream_response(
        file,
        archive.size,
        "application/zip",
        &format!("attachment; filename=\"{}\"", archive.file_name),
    ))
}

fn require_path(query: PathQuery) -> Result<String, ApiError> {
    match query.path {
        Some(path) if !path.trim().is_empty() => Ok(path),
        _ => Err(ApiError::BadRequest("path is required".to_string())),
    }
}

/// Like [`require_path`], but also rejects paths that syntactically cannot
/// name a file.
fn require_file_path(query: PathQuery) -> Result<String, ApiError> {
    let path = require_path(query)?;
    if path.ends_with('/') {
        return Err(ApiError::BadRequest("invalid file path".to_string()));
    }
    Ok(path)
}

async fn file_metadata(absolute: &Path, client_path: &str) -> Result<std::fs::Metadata, ApiError> {
    let metadata = match tokio::fs::metadata(absolute).await {
        Ok(m) => m,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(FsError::NotFound(client_path.to_string()).into())
        }
        Err(err) => return Err(FsError::from(err).into()),
    };
    if metadata.is_dir() {
        return Err(FsError::IsADirectory(client_path.to_string()).into());
    }
    Ok(metadata)
}

fn attachment_name(absolute: &Path) -> String {
    absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string())
}

/// Content type for inline viewing: text-ish files become
/// `text/plain; charset=utf-8`, anything else keeps its guessed type.
fn view_content_type(absolute: &Path) -> String {
    let guessed = mime_guess::from_path(absolute).first_or_octet_stream();
    let essence = guessed.essence_str();
    let extension = absolute
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if essence.starts_with("text/")
        || essence == "application/json"
        || TEXT_FORCED_EXTENSIONS.contains(&extension.as_str())
    {
        "text/plain; charset=utf-8".to_string()
    } else {
        guessed.to_string()
    }
}

fn stream_response(
    file: tokio::fs::File,
    length: u64,
    content_type: &str,
    disposition: &str,
) -> Response {
    let stream = ReaderStream::with_capacity(file, 1 << 18);
    let body = Body::from_stream(stream);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&length.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );

    (StatusCode::OK, headers, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::Sandbox;
    use crate::http::AppState;
    use std::fs;
    use std::io::Cursor;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn make_state() -> (TempDir, SharedState) {
        let temp_dir = TempDir::new().unwrap();
        let state = Arc::new(AppState::new(Sandbox::open(temp_dir.path()).unwrap()));
        (temp_dir, state)
    }

    fn query(path: &str) -> Query<PathQuery> {
        Query(PathQuery {
            path: Some(path.to_string()),
        })
    }

    fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_download_streams_file() {
        let (temp_dir, state) = make_state();
        fs::write(temp_dir.path().join("hello.txt"), "hello").unwrap();

        let response = download(State(state), query("hello.txt")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(&response, header::CONTENT_LENGTH), "5");
        assert_eq!(
            header_str(&response, header::CONTENT_DISPOSITION),
            "attachment; filename=\"hello.txt\""
        );
        assert_eq!(body_bytes(response).await, b"hello");
    }

    #[tokio::test]
    async fn test_download_requires_path() {
        let (_temp_dir, state) = make_state();
        let result = download(State(state.clone()), Query(PathQuery::default())).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));

        let result = download(State(state), query("docs/")).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_download_missing_file_is_not_found() {
        let (_temp_dir, state) = make_state();
        let result = download(State(state), query("ghost.txt")).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_download_of_folder_is_not_found() {
        let (temp_dir, state) = make_state();
        fs::create_dir(temp_dir.path().join("docs")).unwrap();
        let result = download(State(state), query("docs")).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_download_rejects_traversal() {
        let (_temp_dir, state) = make_state();
        let result = download(State(state), query("../../etc/passwd")).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_view_relabels_source_files_as_text() {
        let (temp_dir, state) = make_state();
        fs::write(temp_dir.path().join("script.py"), "print('hi')").unwrap();

        let response = view(State(state), query("script.py")).await.unwrap();
        assert_eq!(
            header_str(&response, header::CONTENT_TYPE),
            "text/plain; charset=utf-8"
        );
        assert!(header_str(&response, header::CONTENT_DISPOSITION).starts_with("inline"));
    }

    #[tokio::test]
    async fn test_view_keeps_binary_types() {
        let (temp_dir, state) = make_state();
        fs::write(temp_dir.path().join("pixel.png"), [0u8; 8]).unwrap();

        let response = view(State(state), query("pixel.png")).await.unwrap();
        assert_eq!(header_str(&response, header::CONTENT_TYPE), "image/png");
    }

    #[test]
    fn test_view_content_type_rules() {
        assert_eq!(
            view_content_type(Path::new("notes.md")),
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            view_content_type(Path::new("data.json")),
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            view_content_type(Path::new("run.sh")),
            "text/plain; charset=utf-8"
        );
        assert_eq!(view_content_type(Path::new("pixel.png")), "image/png");
        assert_eq!(
            view_content_type(Path::new("blob.bin")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_download_folder_streams_zip() {
        let (temp_dir, state) = make_state();
        fs::create_dir_all(temp_dir.path().join("docs/sub")).unwrap();
        fs::write(temp_dir.path().join("docs/a.txt"), "alpha").unwrap();
        fs::write(temp_dir.path().join("docs/sub/b.txt"), "beta").unwrap();

        let response = download_folder(State(state), query("docs")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header_str(&response, header::CONTENT_TYPE),
            "application/zip"
        );
        assert_eq!(
            header_str(&response, header::CONTENT_DISPOSITION),
            "attachment; filename=\"docs.zip\""
        );

        let declared: u64 = header_str(&response, header::CONTENT_LENGTH)
            .parse()
            .unwrap();
        let bytes = body_bytes(response).await;
        assert_eq!(bytes.len() as u64, declared);

        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 2);
        assert!(zip.by_name("docs/a.txt").is_ok());
        assert!(zip.by_name("docs/sub/b.txt").is_ok());
    }

    #[tokio::test]
    async fn test_download_folder_accepts_trailing_slash() {
        let (temp_dir, state) = make_state();
        fs::create_dir(temp_dir.path().join("docs")).unwrap();
        let response = download_folder(State(state), query("docs/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_download_folder_requires_path() {
        let (_temp_dir, state) = make_state();
        let result = download_folder(State(state), Query(PathQuery::default())).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_download_folder_missing_is_not_found() {
        let (_temp_dir, state) = make_state();
        let result = download_folder(State(state), query("ghost")).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
