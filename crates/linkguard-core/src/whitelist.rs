//! Whitelist store: trusted hostname -> canonical official URL.
//!
//! Seeded with a built-in default set on first run, thereafter read from the
//! persisted TOML file under the XDG config dir. Reads have no side effects;
//! the only write happens during first-run initialization.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Mapping from trusted registrable domain to its canonical official URL.
///
/// Keys never carry a scheme or a `www.` prefix; both are stripped on
/// insert. A `BTreeMap` keeps iteration order deterministic, which gives
/// the similarity matcher a stable lexicographic tie-break.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    entries: BTreeMap<String, String>,
}

/// Strips a scheme and a leading `www.` from a whitelist key or an observed
/// hostname, lowercased.
fn canonical_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(&host);
    let host = host.strip_prefix("www.").unwrap_or(host);
    host.trim_end_matches('/').to_string()
}

impl Whitelist {
    /// Built-in default set used to seed the store on first run.
    pub fn defaults() -> Self {
        let mut wl = Self::default();
        wl.insert("paypal.com", "https://www.paypal.com/signin");
        wl.insert("bankxyz.com", "https://online.bankxyz.com/login");
        wl.insert("google.com", "https://accounts.google.com/signin");
        wl
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut wl = Self::default();
        for (host, url) in entries {
            wl.insert(host.as_ref(), url);
        }
        wl
    }

    /// Inserts an entry, normalizing the key (scheme and `www.` stripped).
    pub fn insert(&mut self, trusted_host: &str, official_url: impl Into<String>) {
        let key = canonical_host(trusted_host);
        if key.is_empty() {
            tracing::warn!("ignoring empty whitelist host {:?}", trusted_host);
            return;
        }
        self.entries.insert(key, official_url.into());
    }

    /// Returns the matching trusted host if `hostname` equals it or is a
    /// subdomain of it, after stripping a leading `www.` from `hostname`.
    pub fn is_trusted(&self, hostname: &str) -> Option<&str> {
        let host = canonical_host(hostname);
        for trusted in self.entries.keys() {
            if host == *trusted || host.ends_with(&format!(".{trusted}")) {
                return Some(trusted);
            }
        }
        None
    }

    /// Canonical official URL for a trusted host, if present.
    pub fn official_url(&self, trusted_host: &str) -> Option<&str> {
        self.entries.get(&canonical_host(trusted_host)).map(String::as_str)
    }

    /// Trusted hosts in lexicographic order.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// (host, official URL) pairs in lexicographic host order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn whitelist_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("linkguard")?;
    Ok(xdg_dirs.place_config_file("whitelist.toml")?)
}

/// Load the whitelist from disk, seeding the default set if no file exists.
pub fn load_or_init() -> Result<Whitelist> {
    load_or_init_at(&whitelist_path()?)
}

/// Like [`load_or_init`] but at an explicit path (used by tests).
pub fn load_or_init_at(path: &Path) -> Result<Whitelist> {
    if !path.exists() {
        let wl = Whitelist::defaults();
        let map: BTreeMap<&str, &str> = wl.iter().collect();
        let toml = toml::to_string_pretty(&map)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("seeded default whitelist at {}", path.display());
        return Ok(wl);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("read whitelist: {}", path.display()))?;
    let map: BTreeMap<String, String> =
        toml::from_str(&data).with_context(|| format!("parse whitelist: {}", path.display()))?;
    Ok(Whitelist::from_entries(map))
}
