//! Verdict type: the resolution engine's output for a single URL.
//!
//! The serialized shape (camelCase, optionals omitted when absent) is the
//! wire contract consumed by the presentation layer and the socket service.

use serde::{Deserialize, Serialize};

/// Message shown for whitelist hits.
pub const MSG_LEGITIMATE: &str = "Legitimate URL\nSafe to browse";
/// Message shown when a URL is classified as phishing.
pub const MSG_SUSPICIOUS: &str = "Phishy URL\nBe cautious";
/// Message shown when the fallback classifier finds nothing suspicious.
/// Degraded mode: worded to avoid claiming the URL was verified.
pub const MSG_UNVERIFIED: &str = "Likely legitimate\nUse caution";

/// Classification result for one URL. Immutable once constructed.
///
/// `similar_trusted`, when present, names a trusted host from the whitelist
/// that the observed hostname looks like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_phishing: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_trusted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Verdict {
    /// Fixed verdict for whitelist matches.
    pub fn legitimate() -> Self {
        Self {
            is_phishing: false,
            message: MSG_LEGITIMATE.to_string(),
            similar_trusted: None,
            confidence: None,
        }
    }

    /// Phishing verdict with an optional lookalike suggestion.
    pub fn suspicious(similar_trusted: Option<String>) -> Self {
        Self {
            is_phishing: true,
            message: MSG_SUSPICIOUS.to_string(),
            similar_trusted,
            confidence: None,
        }
    }

    /// Fallback verdict when no suspicious pattern matched. Carries no
    /// confidence value: the heuristic path must never claim one.
    pub fn unverified() -> Self {
        Self {
            is_phishing: false,
            message: MSG_UNVERIFIED.to_string(),
            similar_trusted: None,
            confidence: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_and_omits_absent_fields() {
        let v = Verdict::legitimate();
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("\"isPhishing\":false"));
        assert!(!json.contains("similarTrusted"));
        assert!(!json.contains("confidence"));
    }

    #[test]
    fn serializes_similar_trusted_when_present() {
        let v = Verdict::suspicious(Some("paypal.com".to_string()));
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("\"similarTrusted\":\"paypal.com\""));
    }

    #[test]
    fn deserializes_wire_shape() {
        let json = r#"{"isPhishing":true,"message":"Phishy URL\nBe cautious","confidence":0.93}"#;
        let v: Verdict = serde_json::from_str(json).unwrap();
        assert!(v.is_phishing);
        assert_eq!(v.message, MSG_SUSPICIOUS);
        assert!(v.similar_trusted.is_none());
        assert_eq!(v.confidence, Some(0.93));
    }

    #[test]
    fn fallback_verdict_has_no_confidence() {
        assert!(Verdict::unverified().confidence.is_none());
    }
}
