//! Remote classifier client.
//!
//! Uses the curl crate (libcurl) to POST the URL to the classifier's
//! `/predict` route and normalize the response shape. The client owns no
//! retry logic: a single failed attempt is reported upward immediately so
//! the resolution engine can fall back rather than stall the hover.
//!
//! Runs in the current thread; call from `spawn_blocking` if used from
//! async code.

mod parse;

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::LinkguardConfig;

/// Label the classifier service uses for phishing URLs. Matched exactly;
/// any other label maps to non-phishing.
pub const PHISHING_LABEL: &str = "Phishy URL";

/// Classification failure. `Network` and `Http` cover unreachable hosts,
/// timeouts, and non-success statuses; `Protocol` covers bodies that do not
/// parse into the expected shape.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classifier request failed: {0}")]
    Network(#[from] curl::Error),
    #[error("classifier returned HTTP {0}")]
    Http(u32),
    #[error("classifier response malformed: {0}")]
    Protocol(String),
}

/// Normalized classifier response: the categorical label plus the model's
/// reported confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteVerdict {
    pub label: String,
    pub confidence: Option<f64>,
}

impl RemoteVerdict {
    /// Exact string match against the known phishing label.
    pub fn is_phishing(&self) -> bool {
        self.label == PHISHING_LABEL
    }
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    url: &'a str,
}

/// Seam for the resolution engine, so tests can substitute a stub service.
pub trait Classifier: Send + Sync {
    fn classify(&self, url: &str) -> Result<RemoteVerdict, ClassifyError>;
}

impl<T: Classifier + ?Sized> Classifier for std::sync::Arc<T> {
    fn classify(&self, url: &str) -> Result<RemoteVerdict, ClassifyError> {
        (**self).classify(url)
    }
}

/// HTTP client for the remote classifier service.
#[derive(Debug, Clone)]
pub struct ClassifierClient {
    predict_url: String,
    connect_timeout: Duration,
    timeout: Duration,
}

impl ClassifierClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            predict_url: format!("{}/predict", endpoint.trim_end_matches('/')),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_config(cfg: &LinkguardConfig) -> Self {
        Self {
            predict_url: format!(
                "{}/predict",
                cfg.classifier_endpoint.trim_end_matches('/')
            ),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.request_timeout_secs),
        }
    }

    fn post_predict(&self, url: &str) -> Result<Vec<u8>, ClassifyError> {
        let body = serde_json::to_vec(&PredictRequest { url })
            .map_err(|e| ClassifyError::Protocol(format!("encode request: {e}")))?;

        let mut response = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(&self.predict_url)?;
        easy.post(true)?;
        easy.post_fields_copy(&body)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        let mut headers = curl::easy::List::new();
        headers.append("Content-Type: application/json")?;
        easy.http_headers(headers)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(ClassifyError::Http(code));
        }
        Ok(response)
    }
}

impl Classifier for ClassifierClient {
    /// Issues one classification request and normalizes the response.
    fn classify(&self, url: &str) -> Result<RemoteVerdict, ClassifyError> {
        let body = self.post_predict(url)?;
        parse::parse_predict_response(&body)
    }
}
