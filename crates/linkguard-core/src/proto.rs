//! Cross-context request/response contract.
//!
//! One request per message, one response per request, delivered
//! asynchronously over whatever channel hosts the engine (the socket
//! service in the CLI, a bridge in an embedding). The sender must tolerate
//! arbitrary delay; the response channel is a one-shot, not a stream.

use serde::{Deserialize, Serialize};

use crate::verdict::Verdict;

/// Request envelope, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// `{ "action": "checkUrl", "url": "..." }`
    CheckUrl { url: String },
}

/// Response envelope. Every request gets exactly one response line: the
/// verdict, or `{ "error": "..." }` when the request cannot be served, so a
/// sender never has to wait on a request that was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Verdict(Verdict),
    Error { error: String },
}
