//! Route table and shared application state.

use std::path::Path;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::fs::{Archiver, Catalog, Finder, Mutator, Sandbox};

use super::{content, files};

/// Engine components shared by every handler. All of them are cheap clones
/// over the same sandbox root.
pub struct AppState {
    pub catalog: Catalog,
    pub finder: Finder,
    pub mutator: Mutator,
    pub archiver: Archiver,
    pub sandbox: Sandbox,
}

impl AppState {
    pub fn new(sandbox: Sandbox) -> Self {
        Self {
            catalog: Catalog::new(sandbox.clone()),
            finder: Finder::new(sandbox.clone()),
            mutator: Mutator::new(sandbox.clone()),
            archiver: Archiver::new(sandbox.clone()),
            sandbox,
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Assemble the full application router.
///
/// The JSON and byte-serving endpoints live under `/api`; when `ui_dir` is
/// set, everything else falls through to the static UI bundle. The body
/// limit applies to uploads only, other endpoints keep axum's default.
pub fn build_router(
    state: SharedState,
    ui_dir: Option<&Path>,
    max_upload_bytes: usize,
) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    let api = Router::new()
        .route("/list", get(files::list))
        .route("/search", get(files::search))
        .route("/create_folder", post(files::create_folder))
        .route(
            "/upload",
            post(files::upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/delete", delete(files::remove))
        .route("/rename", post(files::rename))
        .route("/move", post(files::relocate))
        .route("/download", get(content::download))
        .route("/view", get(content::view))
        .route("/download_folder", get(content::download_folder))
        .layer(cors)
        .with_state(state);

    let mut app = Router::new().nest("/api", api);
    if let Some(dir) = ui_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }
    app.layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_state_components_share_one_root() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.txt"), "x").unwrap();

        let state = AppState::new(Sandbox::open(temp_dir.path()).unwrap());
        let listing = state.catalog.list("/").unwrap();
        assert_eq!(listing.entries.len(), 1);

        let found = state.finder.search("a.txt").unwrap();
        assert_eq!(found.entries.len(), 1);
    }

    #[test]
    fn test_router_builds_with_and_without_ui() {
        let temp_dir = TempDir::new().unwrap();
        let state = Arc::new(AppState::new(Sandbox::open(temp_dir.path()).unwrap()));

        let _ = build_router(state.clone(), None, 1024);
        let _ = build_router(state, Some(temp_dir.path()), 1024);
    }
}
