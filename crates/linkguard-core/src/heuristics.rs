//! Pattern-based fallback classifier, used only when the remote classifier
//! is unreachable.
//!
//! Rules are independent predicates evaluated in a fixed, documented order;
//! the first match short-circuits. The no-match verdict carries no
//! confidence value, since this path is a degraded mode.

use crate::similarity::find_lookalike;
use crate::verdict::Verdict;
use crate::whitelist::Whitelist;

/// Top-level domains with a high observed abuse rate.
const HIGH_ABUSE_TLDS: &[&str] = &["tk", "ml", "ga", "cf", "gq", "top", "xyz", "pw"];

/// Suspicious URL shapes, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspiciousPattern {
    /// An embedded IPv4 literal anywhere in the URL.
    Ipv4Literal,
    /// An `@` occurring after the first path slash.
    AtInPath,
    /// Another `http` substring inside the authority component.
    NestedScheme,
    /// Hostname under a high-abuse top-level domain.
    HighAbuseTld,
    /// A `.php`/`.html` path with two or more query parameters, a shape
    /// common in credential-harvesting redirectors.
    MultiParamQuery,
}

impl SuspiciousPattern {
    /// Evaluation order. Fixed so fallback behavior stays auditable.
    pub const ORDERED: [SuspiciousPattern; 5] = [
        SuspiciousPattern::Ipv4Literal,
        SuspiciousPattern::AtInPath,
        SuspiciousPattern::NestedScheme,
        SuspiciousPattern::HighAbuseTld,
        SuspiciousPattern::MultiParamQuery,
    ];

    /// Does this rule match the raw URL?
    pub fn matches(&self, url: &str) -> bool {
        match self {
            SuspiciousPattern::Ipv4Literal => contains_ipv4_literal(url),
            SuspiciousPattern::AtInPath => at_sign_in_path(url),
            SuspiciousPattern::NestedScheme => nested_scheme_in_authority(url),
            SuspiciousPattern::HighAbuseTld => high_abuse_tld(url),
            SuspiciousPattern::MultiParamQuery => multi_param_query(url),
        }
    }
}

/// Classify `url` with the ordered rule list. First match yields a phishing
/// verdict with a similarity lookup attached; no match yields the
/// low-confidence "use caution" verdict.
pub fn classify(url: &str, hostname: &str, whitelist: &Whitelist) -> Verdict {
    for rule in SuspiciousPattern::ORDERED {
        if rule.matches(url) {
            tracing::debug!(url, ?rule, "fallback rule matched");
            return Verdict::suspicious(
                find_lookalike(hostname, whitelist).map(str::to_string),
            );
        }
    }
    Verdict::unverified()
}

/// True if any four consecutive dot-separated runs of 1..=3 ASCII digits
/// appear in `url`.
fn contains_ipv4_literal(url: &str) -> bool {
    for run in url.split(|c: char| !c.is_ascii_digit() && c != '.') {
        let parts: Vec<&str> = run.split('.').collect();
        if parts.len() < 4 {
            continue;
        }
        for window in parts.windows(4) {
            if window
                .iter()
                .all(|p| !p.is_empty() && p.len() <= 3 && p.bytes().all(|b| b.is_ascii_digit()))
            {
                return true;
            }
        }
    }
    false
}

/// True if an `@` appears after the first slash that follows the authority.
/// Userinfo (`https://user@host/`) sits before the path and does not match.
fn at_sign_in_path(url: &str) -> bool {
    let rest = match url.split_once("://") {
        Some((_, rest)) => rest,
        None => return false,
    };
    match rest.split_once('/') {
        Some((_, path)) => path.contains('@'),
        None => false,
    }
}

/// True if the authority component contains another `http` substring after
/// the real scheme, e.g. `https://login-https-verify.example`.
fn nested_scheme_in_authority(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    let rest = match lower.split_once("://") {
        Some((_, rest)) => rest,
        None => return false,
    };
    let authority = rest.split('/').next().unwrap_or("");
    authority.contains("http")
}

/// True if the URL's hostname falls under one of the high-abuse TLDs.
fn high_abuse_tld(url: &str) -> bool {
    let host = match url::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(h) => h.to_ascii_lowercase(),
            None => return false,
        },
        Err(_) => return false,
    };
    let tld = match host.rsplit('.').next() {
        Some(t) if !t.is_empty() => t,
        _ => return false,
    };
    HIGH_ABUSE_TLDS.contains(&tld)
}

/// True for `.php`/`.html` paths carrying two or more `key=value` query
/// parameters.
fn multi_param_query(url: &str) -> bool {
    let (path, query) = match url.split_once('?') {
        Some(parts) => parts,
        None => return false,
    };
    if !(path.ends_with(".php") || path.ends_with(".html")) {
        return false;
    }
    query
        .split('&')
        .filter(|param| param.split_once('=').is_some_and(|(k, _)| !k.is_empty()))
        .count()
        >= 2
}
