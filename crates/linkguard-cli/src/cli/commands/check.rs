//! `linkguard check <url>` – resolve one URL to a verdict.

use anyhow::Result;
use linkguard_core::config::LinkguardConfig;
use linkguard_core::engine::{canonical_hostname, ResolutionEngine};
use linkguard_core::verdict::Verdict;
use linkguard_core::whitelist::Whitelist;
use std::path::Path;

use crate::cli::check_socket;

pub async fn run_check(
    cfg: &LinkguardConfig,
    whitelist: Whitelist,
    url: &str,
    json: bool,
) -> Result<()> {
    let mut engine = ResolutionEngine::from_config(cfg, whitelist);
    let verdict = engine.resolve(url).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
        return Ok(());
    }
    let hostname = canonical_hostname(url)?;
    print!("{}", render_verdict(&hostname, &verdict, engine.whitelist()));
    Ok(())
}

/// Like [`run_check`] but through a running check service. The locally
/// loaded whitelist still drives the official-URL suggestion.
pub async fn run_check_via_socket(
    socket: &Path,
    whitelist: &Whitelist,
    url: &str,
    json: bool,
) -> Result<()> {
    let verdict = check_socket::send_check(socket, url).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
        return Ok(());
    }
    let hostname = canonical_hostname(url)?;
    print!("{}", render_verdict(&hostname, &verdict, whitelist));
    Ok(())
}

/// Text rendering of the three tooltip surfaces.
fn render_verdict(hostname: &str, verdict: &Verdict, whitelist: &Whitelist) -> String {
    let mut lines = Vec::new();
    if verdict.is_phishing {
        lines.push("WARNING: possible phishing attempt".to_string());
        lines.push(format!("The domain {hostname} is not verified."));
        if let Some(similar) = &verdict.similar_trusted {
            lines.push(format!("It looks similar to: {similar}"));
            if let Some(official) = whitelist.official_url(similar) {
                lines.push(format!("Go to the official site instead: {official}"));
            }
        }
        if let Some(confidence) = verdict.confidence {
            lines.push(format!("Model confidence: {confidence:.2}"));
        }
    } else {
        lines.push(verdict.message.clone());
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
