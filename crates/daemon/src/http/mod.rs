//! HTTP surface of the daemon.
//!
//! The engine in [`crate::fs`] is synchronous; every handler hops onto the
//! blocking pool through [`run_blocking`] so directory walks and archive
//! builds never stall the async runtime. Handlers stay thin: decode the
//! request, call the engine, map the outcome onto a JSON body or a byte
//! stream.

pub mod content;
pub mod error;
pub mod files;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{build_router, AppState, SharedState};

/// Run a synchronous engine call on the blocking pool and lift its error
/// into an API error.
pub(crate) async fn run_blocking<T, F>(job: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> crate::fs::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(join_err) => Err(ApiError::Internal(format!(
            "blocking task failed: {join_err}"
        ))),
    }
}
