//! Resolution engine: one verdict per URL.
//!
//! Owns the whitelist and the verdict cache; no other component touches
//! them directly. Decision order: cache, whitelist, remote classifier,
//! heuristic fallback. Classifier failures are recovered here and never
//! surfaced to callers: a hover tooltip must never show a raw error, so
//! `resolve` always produces a verdict once the URL itself parses.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::cache::VerdictCache;
use crate::config::LinkguardConfig;
use crate::heuristics;
use crate::remote::{Classifier, ClassifierClient, ClassifyError, RemoteVerdict};
use crate::similarity::find_lookalike;
use crate::verdict::Verdict;
use crate::whitelist::Whitelist;

/// The only failure `resolve` reports: the URL itself is unusable.
/// The hover controller recovers this by not showing a tooltip at all.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("URL has no host: {url:?}")]
    MissingHost { url: String },
}

/// Extracts the hostname with any leading `www.` stripped.
pub fn canonical_hostname(url: &str) -> Result<String, ResolveError> {
    let parsed = url::Url::parse(url).map_err(|source| ResolveError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let host = parsed.host_str().ok_or_else(|| ResolveError::MissingHost {
        url: url.to_string(),
    })?;
    Ok(host.strip_prefix("www.").unwrap_or(host).to_ascii_lowercase())
}

/// Turns a raw URL into a reputation verdict.
pub struct ResolutionEngine<C: Classifier = ClassifierClient> {
    whitelist: Whitelist,
    cache: VerdictCache,
    classifier: Arc<C>,
}

impl ResolutionEngine<ClassifierClient> {
    /// Engine wired to the configured remote classifier.
    pub fn from_config(cfg: &LinkguardConfig, whitelist: Whitelist) -> Self {
        Self {
            whitelist,
            cache: VerdictCache::new(cfg.cache_ttl()),
            classifier: Arc::new(ClassifierClient::from_config(cfg)),
        }
    }
}

impl<C: Classifier + 'static> ResolutionEngine<C> {
    pub fn new(whitelist: Whitelist, classifier: C) -> Self {
        Self {
            whitelist,
            cache: VerdictCache::default(),
            classifier: Arc::new(classifier),
        }
    }

    pub fn with_cache(whitelist: Whitelist, classifier: C, cache: VerdictCache) -> Self {
        Self {
            whitelist,
            cache,
            classifier: Arc::new(classifier),
        }
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// Resolves `url` to a verdict. Suspends on the classifier's network
    /// call; degrades to the heuristic fallback on any classifier failure.
    pub async fn resolve(&mut self, url: &str) -> Result<Verdict, ResolveError> {
        match self.check_local(url)? {
            LocalStep::Done(verdict) => Ok(verdict),
            LocalStep::NeedsRemote {
                hostname,
                classifier,
            } => {
                let remote = classify_remote(classifier, url).await;
                Ok(self.complete(url, &hostname, remote))
            }
        }
    }

    /// Resolves `url` through a shared engine, locking it only for the
    /// cache/whitelist phase and the final cache write. The classifier call
    /// runs unlocked, so resolutions for different URLs proceed in parallel;
    /// two concurrent misses on the same URL may both consult the classifier,
    /// and the later result replaces the cache entry whole.
    pub async fn resolve_shared(engine: &Mutex<Self>, url: &str) -> Result<Verdict, ResolveError> {
        let step = engine.lock().await.check_local(url)?;
        match step {
            LocalStep::Done(verdict) => Ok(verdict),
            LocalStep::NeedsRemote {
                hostname,
                classifier,
            } => {
                let remote = classify_remote(classifier, url).await;
                Ok(engine.lock().await.complete(url, &hostname, remote))
            }
        }
    }

    /// Lock-held fast phase: cache, then whitelist. A miss hands back the
    /// classifier handle so the caller can run the network phase unlocked.
    fn check_local(&mut self, url: &str) -> Result<LocalStep<C>, ResolveError> {
        if let Some(hit) = self.cache.get(url) {
            tracing::debug!(url, "cache hit");
            return Ok(LocalStep::Done(hit.clone()));
        }

        let hostname = canonical_hostname(url)?;

        if let Some(trusted) = self.whitelist.is_trusted(&hostname) {
            tracing::debug!(url, trusted, "whitelist match");
            let verdict = Verdict::legitimate();
            self.cache.put(url, verdict.clone());
            return Ok(LocalStep::Done(verdict));
        }

        Ok(LocalStep::NeedsRemote {
            hostname,
            classifier: Arc::clone(&self.classifier),
        })
    }

    /// Lock-held final phase: turn the classifier outcome into a verdict
    /// (falling back to the heuristics on failure) and cache it.
    fn complete(
        &mut self,
        url: &str,
        hostname: &str,
        remote: Result<RemoteVerdict, ClassifyError>,
    ) -> Verdict {
        let verdict = match remote {
            Ok(remote) => {
                // The lookalike is computed regardless of the label, but only
                // attached to phishing verdicts.
                let lookalike = find_lookalike(hostname, &self.whitelist).map(str::to_string);
                let is_phishing = remote.is_phishing();
                Verdict {
                    is_phishing,
                    message: remote.label,
                    similar_trusted: if is_phishing { lookalike } else { None },
                    confidence: remote.confidence,
                }
            }
            Err(err) => {
                tracing::warn!(url, "remote classifier unavailable, using fallback: {err}");
                heuristics::classify(url, hostname, &self.whitelist)
            }
        };

        self.cache.put(url, verdict.clone());
        verdict
    }
}

/// Outcome of the lock-held fast phase of a resolution.
enum LocalStep<C> {
    Done(Verdict),
    NeedsRemote {
        hostname: String,
        classifier: Arc<C>,
    },
}

/// Runs the blocking classifier call off the event loop. A panicked or
/// cancelled task counts as a classifier failure, feeding the fallback.
async fn classify_remote<C: Classifier + 'static>(
    classifier: Arc<C>,
    url: &str,
) -> Result<RemoteVerdict, ClassifyError> {
    let url = url.to_string();
    match tokio::task::spawn_blocking(move || classifier.classify(&url)).await {
        Ok(result) => result,
        Err(join_err) => Err(ClassifyError::Protocol(format!(
            "classifier task join: {join_err}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::PHISHING_LABEL;
    use crate::verdict::{MSG_LEGITIMATE, MSG_UNVERIFIED};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted classifier: pops one canned result per call and counts calls.
    struct StubClassifier {
        script: Mutex<VecDeque<Result<RemoteVerdict, ClassifyError>>>,
        calls: AtomicUsize,
    }

    impl StubClassifier {
        fn new(script: Vec<Result<RemoteVerdict, ClassifyError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn labeled(label: &str, confidence: f64) -> Self {
            Self::new(vec![Ok(RemoteVerdict {
                label: label.to_string(),
                confidence: Some(confidence),
            })])
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Classifier for StubClassifier {
        fn classify(&self, _url: &str) -> Result<RemoteVerdict, ClassifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ClassifyError::Http(503)))
        }
    }

    fn engine_with(stub: StubClassifier) -> ResolutionEngine<Arc<StubClassifier>> {
        ResolutionEngine::new(Whitelist::defaults(), Arc::new(stub))
    }

    #[tokio::test]
    async fn whitelisted_url_never_consults_classifier() {
        let stub = Arc::new(StubClassifier::new(vec![]));
        let mut engine = ResolutionEngine::new(Whitelist::defaults(), Arc::clone(&stub));

        for url in [
            "https://paypal.com/signin",
            "https://www.paypal.com/signin",
            "https://accounts.google.com/ServiceLogin",
        ] {
            let v = engine.resolve(url).await.unwrap();
            assert!(!v.is_phishing);
            assert_eq!(v.message, MSG_LEGITIMATE);
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn phishing_label_attaches_lookalike() {
        let stub = StubClassifier::labeled(PHISHING_LABEL, 0.93);
        let mut engine = engine_with(stub);

        let v = engine.resolve("http://secure-paypal.com/x").await.unwrap();
        assert!(v.is_phishing);
        assert_eq!(v.message, PHISHING_LABEL);
        assert_eq!(v.similar_trusted.as_deref(), Some("paypal.com"));
        assert_eq!(v.confidence, Some(0.93));
    }

    #[tokio::test]
    async fn legitimate_label_omits_lookalike() {
        let stub = StubClassifier::labeled("Legitimate URL", 0.71);
        let mut engine = engine_with(stub);

        // The hostname still embeds a trusted host, but the label is clean.
        let v = engine.resolve("http://secure-paypal.com/x").await.unwrap();
        assert!(!v.is_phishing);
        assert!(v.similar_trusted.is_none());
        assert_eq!(v.confidence, Some(0.71));
    }

    #[tokio::test]
    async fn cache_hit_masks_classifier_outage() {
        let stub = Arc::new(StubClassifier::new(vec![Ok(RemoteVerdict {
            label: "Legitimate URL".to_string(),
            confidence: Some(0.8),
        })]));
        let mut engine = ResolutionEngine::new(Whitelist::defaults(), Arc::clone(&stub));

        let first = engine.resolve("https://example.com/a").await.unwrap();
        // Script exhausted: a second classifier call would fail with HTTP 503.
        let second = engine.resolve("https://example.com/a").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(stub.calls(), 1, "second resolve must be served from cache");
    }

    #[tokio::test]
    async fn classifier_failure_falls_back_to_heuristics() {
        let stub = StubClassifier::new(vec![Err(ClassifyError::Http(500))]);
        let mut engine = engine_with(stub);

        let v = engine.resolve("http://192.168.0.1/login").await.unwrap();
        assert!(v.is_phishing, "IP-literal rule should fire in fallback");

        let stub = StubClassifier::new(vec![Err(ClassifyError::Protocol(
            "decode response".to_string(),
        ))]);
        let mut engine = engine_with(stub);
        let v = engine.resolve("https://example.com/about").await.unwrap();
        assert!(!v.is_phishing);
        assert_eq!(v.message, MSG_UNVERIFIED);
    }

    #[tokio::test]
    async fn fallback_verdict_is_cached_like_a_remote_one() {
        let stub = Arc::new(StubClassifier::new(vec![Err(ClassifyError::Http(502))]));
        let mut engine = ResolutionEngine::new(Whitelist::defaults(), Arc::clone(&stub));

        let first = engine.resolve("https://example.com/about").await.unwrap();
        let second = engine.resolve("https://example.com/about").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn expired_cache_entry_triggers_a_fresh_resolution() {
        let stub = Arc::new(StubClassifier::new(vec![
            Ok(RemoteVerdict {
                label: "Legitimate URL".to_string(),
                confidence: Some(0.8),
            }),
            Ok(RemoteVerdict {
                label: "Legitimate URL".to_string(),
                confidence: Some(0.8),
            }),
        ]));
        let mut engine = ResolutionEngine::with_cache(
            Whitelist::defaults(),
            Arc::clone(&stub),
            VerdictCache::new(Duration::ZERO),
        );

        engine.resolve("https://example.com/a").await.unwrap();
        engine.resolve("https://example.com/a").await.unwrap();
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn invalid_url_is_the_only_error() {
        let stub = StubClassifier::new(vec![]);
        let mut engine = engine_with(stub);

        assert!(matches!(
            engine.resolve("not a url").await,
            Err(ResolveError::InvalidUrl { .. })
        ));
        assert!(matches!(
            engine.resolve("mailto:someone@example.com").await,
            Err(ResolveError::MissingHost { .. })
        ));
    }

    /// Blocks inside `classify` until released, flagging when the call has
    /// actually started.
    struct GatedClassifier {
        started: Arc<AtomicBool>,
        gate: Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl Classifier for GatedClassifier {
        fn classify(&self, _url: &str) -> Result<RemoteVerdict, ClassifyError> {
            self.started.store(true, Ordering::SeqCst);
            let _ = self.gate.lock().unwrap().recv();
            Ok(RemoteVerdict {
                label: "Legitimate URL".to_string(),
                confidence: None,
            })
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stalled_resolution_does_not_block_the_shared_engine() {
        let (release, gate) = std::sync::mpsc::channel();
        let started = Arc::new(AtomicBool::new(false));
        let engine = Arc::new(tokio::sync::Mutex::new(ResolutionEngine::new(
            Whitelist::defaults(),
            GatedClassifier {
                started: Arc::clone(&started),
                gate: Mutex::new(gate),
            },
        )));

        let slow_engine = Arc::clone(&engine);
        let slow = tokio::spawn(async move {
            ResolutionEngine::resolve_shared(&slow_engine, "https://slow.example/a").await
        });

        // Wait until the classifier call is actually in flight.
        for _ in 0..400 {
            if started.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(started.load(Ordering::SeqCst));

        // A whitelist hit on another URL must resolve promptly while the
        // first resolution sits in its network phase.
        let fast = tokio::time::timeout(
            Duration::from_secs(2),
            ResolutionEngine::resolve_shared(&engine, "https://paypal.com/signin"),
        )
        .await
        .expect("shared engine must not serialize behind a stalled resolution")
        .unwrap();
        assert_eq!(fast.message, MSG_LEGITIMATE);

        release.send(()).unwrap();
        let stalled = slow.await.unwrap().unwrap();
        assert!(!stalled.is_phishing);
    }

    #[tokio::test]
    async fn resolution_is_idempotent_for_stable_inputs() {
        let make_engine = || {
            engine_with(StubClassifier::new(vec![Ok(RemoteVerdict {
                label: PHISHING_LABEL.to_string(),
                confidence: Some(0.88),
            })]))
        };

        let mut a = make_engine();
        let mut b = make_engine();
        let va = a.resolve("http://paypal.com.xyz/login").await.unwrap();
        let vb = b.resolve("http://paypal.com.xyz/login").await.unwrap();
        assert_eq!(va, vb);
    }
}
