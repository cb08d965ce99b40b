//! `linkguard serve` – run the check service on a Unix socket.

use anyhow::{Context, Result};
use linkguard_core::config::LinkguardConfig;
use linkguard_core::engine::ResolutionEngine;
use linkguard_core::whitelist::Whitelist;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::UnixListener;
use tokio::sync::Mutex;

use crate::cli::check_socket::{default_check_socket_path, run_check_service};

pub async fn run_serve(
    cfg: &LinkguardConfig,
    whitelist: Whitelist,
    socket: Option<PathBuf>,
) -> Result<()> {
    let path = match socket {
        Some(path) => path,
        None => default_check_socket_path().context("resolve check socket path")?,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path)
        .with_context(|| format!("bind check socket: {}", path.display()))?;
    println!("linkguard check service listening on {}", path.display());

    let engine = Arc::new(Mutex::new(ResolutionEngine::from_config(cfg, whitelist)));
    run_check_service(listener, engine).await
}
