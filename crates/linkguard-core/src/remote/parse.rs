//! Parse the predict response body into a normalized RemoteVerdict.

use serde::Deserialize;

use super::{ClassifyError, RemoteVerdict};

/// Wire shape of a `/predict` response.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    success: bool,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Parses the response body. A body that does not decode, or a response with
/// `success: false` or no label, is a protocol error.
pub(crate) fn parse_predict_response(body: &[u8]) -> Result<RemoteVerdict, ClassifyError> {
    let parsed: PredictResponse = serde_json::from_slice(body)
        .map_err(|e| ClassifyError::Protocol(format!("decode response: {e}")))?;

    if !parsed.success {
        return Err(ClassifyError::Protocol(
            "classifier reported success=false".to_string(),
        ));
    }
    let label = parsed
        .data
        .ok_or_else(|| ClassifyError::Protocol("response missing label".to_string()))?;

    Ok(RemoteVerdict {
        label,
        confidence: parsed.confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::PHISHING_LABEL;

    #[test]
    fn parses_phishing_response() {
        let body = br#"{"success":true,"data":"Phishy URL","confidence":0.93}"#;
        let v = parse_predict_response(body).unwrap();
        assert_eq!(v.label, PHISHING_LABEL);
        assert!(v.is_phishing());
        assert_eq!(v.confidence, Some(0.93));
    }

    #[test]
    fn parses_legitimate_response_without_confidence() {
        let body = br#"{"success":true,"data":"Legitimate URL"}"#;
        let v = parse_predict_response(body).unwrap();
        assert!(!v.is_phishing());
        assert!(v.confidence.is_none());
    }

    #[test]
    fn garbage_body_is_a_protocol_error() {
        let err = parse_predict_response(b"<html>busy</html>").unwrap_err();
        assert!(matches!(err, ClassifyError::Protocol(_)));
    }

    #[test]
    fn success_false_is_a_protocol_error() {
        let body = br#"{"success":false,"error":"No URL provided"}"#;
        let err = parse_predict_response(body).unwrap_err();
        assert!(matches!(err, ClassifyError::Protocol(_)));
    }

    #[test]
    fn missing_label_is_a_protocol_error() {
        let body = br#"{"success":true,"confidence":0.5}"#;
        let err = parse_predict_response(body).unwrap_err();
        assert!(matches!(err, ClassifyError::Protocol(_)));
    }
}
