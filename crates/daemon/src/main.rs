//! FileDock Daemon
//!
//! Headless service exposing one directory tree over HTTP.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use daemon::config::Config;
use daemon::fs::Sandbox;
use daemon::http::{build_router, server, AppState};
use tracing_appender::non_blocking::WorkerGuard;

/// FileDock Daemon - sandboxed remote file management over HTTP.
#[derive(Parser, Debug)]
#[command(name = "filedock")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the daemon.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start serving the managed directory
    Serve {
        /// Storage root to serve (overrides the config file)
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Listen address (overrides the config file)
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,

        /// Static UI directory (overrides the config file)
        #[arg(long, value_name = "DIR")]
        ui_dir: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };

    // Apply environment variable overrides, then CLI flags on top
    config.apply_env_overrides();
    if let Commands::Serve {
        root,
        listen,
        ui_dir,
    } = &cli.command
    {
        if let Some(root) = root {
            config.storage.root = root.clone();
        }
        if let Some(listen) = listen {
            config.server.listen = listen.clone();
        }
        if let Some(ui_dir) = ui_dir {
            config.server.ui_dir = Some(ui_dir.clone());
        }
    }

    // Validate configuration
    config.validate()?;

    let _log_guard = init_tracing(
        cli.verbose,
        &config.daemon.log_level,
        config.daemon.log_file.as_deref(),
    )?;

    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("FileDock daemon starting...");
            if let Some(config_path) = &cli.config {
                tracing::info!("Using config file: {:?}", config_path);
            }

            let sandbox = Sandbox::open(&config.storage.root).with_context(|| {
                format!(
                    "cannot open storage root {}",
                    config.storage.root.display()
                )
            })?;
            tracing::info!(root = %config.storage.root.display(), "storage root opened");

            let state = Arc::new(AppState::new(sandbox));
            let router = build_router(
                state,
                config.server.ui_dir.as_deref(),
                config.server.max_upload_bytes as usize,
            );
            server::serve(router, config.listen_addr()).await?;
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// Initialize the tracing subscriber.
///
/// The verbose flag forces `debug` regardless of the configured level. With
/// a log file, output goes there through a non-blocking writer; the returned
/// guard must stay alive until exit or buffered lines are lost.
fn init_tracing(
    verbose: bool,
    log_level: &str,
    log_file: Option<&Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = if verbose {
        "debug".to_string()
    } else {
        log_level.to_string()
    };

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::try_parse_from(["filedock", "serve"]).unwrap();
        match cli.command {
            Commands::Serve {
                root,
                listen,
                ui_dir,
            } => {
                assert!(root.is_none());
                assert!(listen.is_none());
                assert!(ui_dir.is_none());
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_serve_with_root() {
        let cli = Cli::try_parse_from(["filedock", "serve", "--root", "/srv/files"]).unwrap();
        match cli.command {
            Commands::Serve { root, .. } => {
                assert_eq!(root, Some(PathBuf::from("/srv/files")));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_serve_with_listen() {
        let cli =
            Cli::try_parse_from(["filedock", "serve", "--listen", "127.0.0.1:8080"]).unwrap();
        match cli.command {
            Commands::Serve { listen, .. } => {
                assert_eq!(listen.as_deref(), Some("127.0.0.1:8080"));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_serve_with_ui_dir() {
        let cli = Cli::try_parse_from(["filedock", "serve", "--ui-dir", "/opt/ui"]).unwrap();
        match cli.command {
            Commands::Serve { ui_dir, .. } => {
                assert_eq!(ui_dir, Some(PathBuf::from("/opt/ui")));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_serve_with_all_overrides() {
        let cli = Cli::try_parse_from([
            "filedock",
            "serve",
            "--root",
            "/srv/files",
            "--listen",
            "0.0.0.0:9000",
            "--ui-dir",
            "/opt/ui",
        ])
        .unwrap();
        match cli.command {
            Commands::Serve {
                root,
                listen,
                ui_dir,
            } => {
                assert_eq!(root, Some(PathBuf::from("/srv/files")));
                assert_eq!(listen.as_deref(), Some("0.0.0.0:9000"));
                assert_eq!(ui_dir, Some(PathBuf::from("/opt/ui")));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_config_command() {
        let cli = Cli::try_parse_from(["filedock", "config"]).unwrap();
        assert!(matches!(cli.command, Commands::Config));
    }

    #[test]
    fn test_global_config_flag() {
        let cli =
            Cli::try_parse_from(["filedock", "serve", "--config", "/etc/filedock.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/filedock.toml")));
    }

    #[test]
    fn test_global_config_flag_before_subcommand() {
        let cli =
            Cli::try_parse_from(["filedock", "-c", "/etc/filedock.toml", "config"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/filedock.toml")));
    }

    #[test]
    fn test_verbose_flag() {
        let cli = Cli::try_parse_from(["filedock", "serve", "--verbose"]).unwrap();
        assert!(cli.verbose);

        let cli = Cli::try_parse_from(["filedock", "-v", "serve"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_missing_subcommand_fails() {
        assert!(Cli::try_parse_from(["filedock"]).is_err());
    }
}
