//! Check service socket: server (during `linkguard serve`) and client
//! (for `linkguard check --socket`).
//!
//! Protocol: one JSON request per line (`{"action":"checkUrl","url":...}`),
//! answered with exactly one JSON response per line: the verdict, or an
//! `{"error":...}` line when the request is malformed or its URL cannot be
//! resolved. A client therefore never blocks on a request the service had
//! to refuse. Request lines are capped at [`MAX_REQUEST_LINE`] bytes; a
//! client that exceeds the cap is disconnected.

use anyhow::{bail, Context, Result};
use linkguard_core::engine::ResolutionEngine;
use linkguard_core::proto::{Request, Response};
use linkguard_core::remote::Classifier;
use linkguard_core::verdict::Verdict;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;

/// Upper bound on a single request line. Well above any real request, low
/// enough that a misbehaving client cannot grow the line buffer unbounded.
const MAX_REQUEST_LINE: usize = 8 * 1024;

/// Default path for the check socket (XDG state dir).
pub fn default_check_socket_path() -> std::io::Result<PathBuf> {
    let dir = xdg_state_dir()?;
    Ok(dir.join("check.sock"))
}

fn xdg_state_dir() -> std::io::Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("linkguard")?;
    Ok(dirs.get_state_home())
}

/// Serves check requests until the process exits. One task per client;
/// verdicts come from the shared engine, so all clients share its cache.
pub async fn run_check_service<C>(
    listener: UnixListener,
    engine: Arc<Mutex<ResolutionEngine<C>>>,
) -> Result<()>
where
    C: Classifier + 'static,
{
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    handle_client(stream, engine).await;
                });
            }
            Err(e) => tracing::debug!("check socket accept: {}", e),
        }
    }
}

async fn handle_client<C>(stream: UnixStream, engine: Arc<Mutex<ResolutionEngine<C>>>)
where
    C: Classifier + 'static,
{
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);
    loop {
        let line = match next_request_line(&mut reader).await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                tracing::debug!("dropping check client: {}", e);
                return;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(line) {
            Ok(Request::CheckUrl { url }) => {
                match ResolutionEngine::resolve_shared(&engine, &url).await {
                    Ok(verdict) => Response::Verdict(verdict),
                    Err(e) => {
                        tracing::debug!(url = %url, "unresolvable check request: {}", e);
                        Response::Error {
                            error: e.to_string(),
                        }
                    }
                }
            }
            Err(e) => {
                tracing::debug!("malformed check request: {}", e);
                Response::Error {
                    error: format!("malformed request: {e}"),
                }
            }
        };
        let payload = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("encode response: {}", e);
                continue;
            }
        };
        if write.write_all(format!("{payload}\n").as_bytes()).await.is_err() {
            return;
        }
    }
}

/// Reads one newline-terminated line, enforcing [`MAX_REQUEST_LINE`].
/// `Ok(None)` is a clean end of stream; an overlong line is an error.
async fn next_request_line<R>(reader: &mut R) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if line.is_empty() {
                return Ok(None);
            }
            return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                line.extend_from_slice(&available[..pos]);
                reader.consume(pos + 1);
                if line.len() > MAX_REQUEST_LINE {
                    break;
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }
            None => {
                let n = available.len();
                line.extend_from_slice(available);
                reader.consume(n);
                if line.len() > MAX_REQUEST_LINE {
                    break;
                }
            }
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        "request line too long",
    ))
}

/// Sends one check request to a running service and waits for the response.
/// A refusal from the service surfaces as an error.
pub async fn send_check(socket_path: &Path, url: &str) -> Result<Verdict> {
    let stream = UnixStream::connect(socket_path)
        .await
        .with_context(|| format!("connect check socket: {}", socket_path.display()))?;
    let (read, mut write) = stream.into_split();

    let request = serde_json::to_string(&Request::CheckUrl {
        url: url.to_string(),
    })?;
    write.write_all(format!("{request}\n").as_bytes()).await?;

    let mut lines = BufReader::new(read).lines();
    let line = lines
        .next_line()
        .await?
        .context("check service closed without a response")?;
    match serde_json::from_str::<Response>(&line).context("decode response")? {
        Response::Verdict(verdict) => Ok(verdict),
        Response::Error { error } => bail!("check service refused the request: {error}"),
    }
}
