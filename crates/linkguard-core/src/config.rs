use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global configuration loaded from `~/.config/linkguard/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkguardConfig {
    /// Base URL of the remote classifier service (the `/predict` route is
    /// appended by the client).
    pub classifier_endpoint: String,
    /// Verdict cache time-to-live in seconds.
    pub cache_ttl_secs: u64,
    /// Hover debounce delay in milliseconds before a resolution is issued.
    pub hover_debounce_ms: u64,
    /// Connect timeout for the classifier request, in seconds.
    pub connect_timeout_secs: u64,
    /// Total timeout for the classifier request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LinkguardConfig {
    fn default() -> Self {
        Self {
            classifier_endpoint: "http://127.0.0.1:5000".to_string(),
            cache_ttl_secs: 300,
            hover_debounce_ms: 500,
            connect_timeout_secs: 5,
            request_timeout_secs: 10,
        }
    }
}

impl LinkguardConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn hover_debounce(&self) -> Duration {
        Duration::from_millis(self.hover_debounce_ms)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("linkguard")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LinkguardConfig> {
    load_or_init_at(&config_path()?)
}

/// Like [`load_or_init`] but at an explicit path (used by tests).
pub fn load_or_init_at(path: &Path) -> Result<LinkguardConfig> {
    if !path.exists() {
        let default_cfg = LinkguardConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: LinkguardConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = LinkguardConfig::default();
        assert_eq!(cfg.classifier_endpoint, "http://127.0.0.1:5000");
        assert_eq!(cfg.cache_ttl_secs, 300);
        assert_eq!(cfg.hover_debounce_ms, 500);
        assert_eq!(cfg.connect_timeout_secs, 5);
        assert_eq!(cfg.request_timeout_secs, 10);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = LinkguardConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: LinkguardConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.classifier_endpoint, cfg.classifier_endpoint);
        assert_eq!(parsed.cache_ttl_secs, cfg.cache_ttl_secs);
        assert_eq!(parsed.hover_debounce_ms, cfg.hover_debounce_ms);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            classifier_endpoint = "http://10.0.0.2:5050"
            cache_ttl_secs = 60
            hover_debounce_ms = 250
            connect_timeout_secs = 2
            request_timeout_secs = 4
        "#;
        let cfg: LinkguardConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.classifier_endpoint, "http://10.0.0.2:5050");
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(60));
        assert_eq!(cfg.hover_debounce(), Duration::from_millis(250));
    }

    #[test]
    fn load_or_init_writes_default_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let first = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(first.cache_ttl_secs, 300);

        // Edit the file; a second load must read it rather than re-seed.
        let edited = "classifier_endpoint = \"http://127.0.0.1:9999\"\n\
                      cache_ttl_secs = 30\n\
                      hover_debounce_ms = 100\n\
                      connect_timeout_secs = 1\n\
                      request_timeout_secs = 2\n";
        fs::write(&path, edited).unwrap();
        let second = load_or_init_at(&path).unwrap();
        assert_eq!(second.classifier_endpoint, "http://127.0.0.1:9999");
        assert_eq!(second.cache_ttl_secs, 30);
    }
}
