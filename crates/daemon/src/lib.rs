//! # FileDock Daemon Library
//!
//! This crate provides the daemon (server) functionality for FileDock,
//! exposing one managed directory tree over an HTTP API.
//!
//! ## Overview
//!
//! The daemon runs on the machine that owns the files. It provides:
//!
//! - **Sandboxed Paths**: Every client path is confined to one root directory
//! - **Browsing & Search**: Directory listings and recursive name search
//! - **Mutations**: Create folder, upload, rename, move, delete
//! - **Byte Serving**: Streamed download, inline view, zip folder download
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        HTTP Router                          │
//! │   /api/list  /api/search  /api/upload  /api/download  ...   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌───────────┐  ┌──────────┐  ┌───────────┐  ┌──────────┐  │
//! │  │  Catalog  │  │  Finder  │  │  Mutator  │  │ Archiver │  │
//! │  └─────┬─────┘  └────┬─────┘  └─────┬─────┘  └────┬─────┘  │
//! │        │             │              │             │        │
//! │  ┌─────┴─────────────┴──────────────┴─────────────┴─────┐  │
//! │  │                       Sandbox                        │  │
//! │  │        (lexical containment under one root)          │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use daemon::config::Config;
//! use daemon::fs::Sandbox;
//! use daemon::http::{build_router, server, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let sandbox = Sandbox::open(&config.storage.root)?;
//!     let state = Arc::new(AppState::new(sandbox));
//!     let router = build_router(
//!         state,
//!         config.server.ui_dir.as_deref(),
//!         config.server.max_upload_bytes as usize,
//!     );
//!     server::serve(router, config.listen_addr()).await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`fs`]: The sandboxed filesystem engine
//! - [`http`]: Route table, handlers, and server bootstrap

pub mod config;
pub mod fs;
pub mod http;

// Re-export config types for convenience
pub use config::Config;

// Re-export engine types for convenience
pub use fs::{Archiver, Catalog, Finder, FsError, Mutator, Sandbox};

// Re-export HTTP types for convenience
pub use http::{build_router, ApiError, AppState, SharedState};
