// Request orchestrator - admission, caption history, cache and classifier
// Author: kelexine (https://github.com/kelexine)

use super::singleflight::KeyedLocks;
use crate::cache::{fingerprint, ResultCache};
use crate::captions::{CaptionSessionStore, CaptionWrite};
use crate::config::AppConfig;
use crate::error::{DetectorError, Result};
use crate::gemini::Classifier;
use crate::limiter::RateLimiter;
use crate::metrics;
use crate::models::{AnalyzeRequest, AnalyzeResponse, Verdict};
use crate::prompt;
use crate::utils::clock::SharedClock;
use crate::vision::{prepare_image, ImagePayload};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Entries removed by one maintenance pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub cache_entries: usize,
    pub sessions: usize,
    pub identities: usize,
}

/// Runs one analyze request through admission, caption history, the verdict
/// cache and, on a miss, the external classifier.
///
/// The stores are owned here and shared with the HTTP layer for reporting.
/// A failed classifier call rolls its caption fragment back, so only the
/// admission record outlives a failed request.
pub struct RequestOrchestrator {
    limiter: Arc<RateLimiter>,
    sessions: Arc<CaptionSessionStore>,
    cache: Arc<ResultCache>,
    classifier: Arc<dyn Classifier>,
    in_flight: KeyedLocks,
}

impl RequestOrchestrator {
    pub fn new(
        limiter: Arc<RateLimiter>,
        sessions: Arc<CaptionSessionStore>,
        cache: Arc<ResultCache>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            limiter,
            sessions,
            cache,
            classifier,
            in_flight: KeyedLocks::new(),
        }
    }

    /// Build all stores from configuration around `classifier`
    pub fn from_config(config: &AppConfig, classifier: Arc<dyn Classifier>, clock: SharedClock) -> Self {
        Self::new(
            Arc::new(RateLimiter::new(config.limits, clock.clone())),
            Arc::new(CaptionSessionStore::new(config.sessions, clock.clone())),
            Arc::new(ResultCache::new(config.cache, clock)),
            classifier,
        )
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn sessions(&self) -> &CaptionSessionStore {
        &self.sessions
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn classifier_configured(&self) -> bool {
        self.classifier.is_configured()
    }

    /// Analyze one frame on behalf of `identity` (the client address).
    pub async fn analyze(&self, identity: &str, request: &AnalyzeRequest) -> Result<AnalyzeResponse> {
        if !self.limiter.admit(identity) {
            warn!("Rate limit exceeded for {}", identity);
            metrics::record_rate_limited("/api/analyze");
            return Err(DetectorError::RateLimited);
        }

        let image = prepare_image(&request.image)?;
        let write = self.record_captions(identity, request);
        let captions = write
            .as_ref()
            .map_or(request.captions.as_str(), |write| write.history.as_str());

        // Identity reflects exactly what the caller sent, so the raw prompt is hashed
        let cache_key = fingerprint(&request.image, &request.prompt, captions);
        debug!("Cache check for {} (key {})", identity, &cache_key[..16]);

        if let Some(verdict) = self.cache.get(&cache_key) {
            info!("Cache hit for {}", identity);
            return Ok(cached(verdict));
        }

        let verdict = {
            let _flight = self.in_flight.lock(&cache_key).await;

            // Another request for the same fingerprint may have finished meanwhile
            if let Some(verdict) = self.cache.get(&cache_key) {
                info!("Cache hit for {} after waiting on identical request", identity);
                return Ok(cached(verdict));
            }

            let outcome = self.classify(identity, request, &image, captions).await;
            match outcome {
                Ok(verdict) => {
                    self.cache.put(&cache_key, verdict.clone());
                    verdict
                }
                Err(e) => {
                    if let Some(write) = write {
                        if !self.sessions.rollback(write) {
                            debug!("Caption history for {} moved on, keeping it", identity);
                        }
                    }
                    return Err(e);
                }
            }
        };

        info!(
            "Result for {}: DETECTED={}, confidence={}%",
            identity, verdict.detected, verdict.confidence
        );

        Ok(AnalyzeResponse {
            verdict,
            cached: false,
        })
    }

    /// Drop expired state from every store
    pub fn sweep(&self) -> SweepReport {
        let report = SweepReport {
            cache_entries: self.cache.sweep(),
            sessions: self.sessions.sweep(),
            identities: self.limiter.sweep(),
        };
        self.in_flight.prune();

        metrics::update_cache_entries(self.cache.len());
        metrics::update_store_entries("sessions", self.sessions.len());
        metrics::update_store_entries("rate_limits", self.limiter.tracked_identities());
        report
    }

    /// Merge the request's captions into its session, if it names a video
    fn record_captions(&self, identity: &str, request: &AnalyzeRequest) -> Option<CaptionWrite> {
        if request.video_url.is_empty() {
            return None;
        }

        // A per-tab session id keeps viewers sharing one address apart
        let session_identity = if request.session_id.is_empty() {
            identity
        } else {
            request.session_id.as_str()
        };

        let write = self
            .sessions
            .record(session_identity, &request.video_url, &request.captions);
        debug!("Caption history length: {} chars", write.history.chars().count());
        Some(write)
    }

    async fn classify(
        &self,
        identity: &str,
        request: &AnalyzeRequest,
        image: &ImagePayload,
        captions: &str,
    ) -> Result<Verdict> {
        let subject = prompt::subject(&request.prompt);

        info!(
            "Classifier call for {}: video={}, prompt={}, history={} chars",
            identity,
            preview(&request.video_title, "N/A"),
            preview(&subject, "DEFAULT"),
            captions.chars().count()
        );

        self.classifier
            .classify(image, &subject, captions)
            .await
            .map_err(|e| {
                warn!("Classifier call failed for {}: {}", identity, e);
                e
            })
    }
}

fn cached(verdict: Verdict) -> AnalyzeResponse {
    AnalyzeResponse {
        verdict,
        cached: true,
    }
}

/// First 50 characters of `s`, or `fallback` when empty
fn preview(s: &str, fallback: &str) -> String {
    if s.is_empty() {
        fallback.to_string()
    } else {
        s.chars().take(50).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, RateLimitConfig, SessionConfig};
    use crate::utils::clock::ManualClock;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Records every call and answers with a fixed verdict or error
    #[derive(Default)]
    struct RecordingClassifier {
        calls: AtomicUsize,
        captions_seen: Mutex<Vec<String>>,
        prompts_seen: Mutex<Vec<String>>,
        fail_with_status: Option<u16>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl Classifier for RecordingClassifier {
        async fn classify(&self, _image: &ImagePayload, prompt: &str, captions: &str) -> Result<Verdict> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts_seen.lock().push(prompt.to_string());
            self.captions_seen.lock().push(captions.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.fail_with_status {
                Some(status) => Err(DetectorError::ExternalFailure {
                    status: Some(status),
                    message: "upstream down".to_string(),
                }),
                None => Ok(Verdict::new(true, 88, "adult on screen", "interview")),
            }
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    fn orchestrator(classifier: Arc<RecordingClassifier>) -> (RequestOrchestrator, ManualClock) {
        let clock = ManualClock::new();
        let shared: SharedClock = Arc::new(clock.clone());
        let orchestrator = RequestOrchestrator::new(
            Arc::new(RateLimiter::new(
                RateLimitConfig {
                    per_minute: 10,
                    per_hour: 100,
                },
                shared.clone(),
            )),
            Arc::new(CaptionSessionStore::new(
                SessionConfig {
                    ttl_seconds: 3600,
                    max_sessions: 100,
                },
                shared.clone(),
            )),
            Arc::new(ResultCache::new(
                CacheConfig {
                    ttl_seconds: 300,
                    max_entries: 100,
                },
                shared,
            )),
            classifier,
        );
        (orchestrator, clock)
    }

    fn request(captions: &str) -> AnalyzeRequest {
        AnalyzeRequest {
            // "hello frame"
            image: "aGVsbG8gZnJhbWU=".to_string(),
            video_url: "https://youtube.com/watch?v=abc".to_string(),
            video_title: "Interview".to_string(),
            prompt: "Please detect if there is a snake game".to_string(),
            captions: captions.to_string(),
            session_id: String::new(),
        }
    }

    #[tokio::test]
    async fn test_second_identical_request_is_cached() {
        let classifier = Arc::new(RecordingClassifier::default());
        let (orchestrator, _clock) = orchestrator(classifier.clone());

        let first = orchestrator.analyze("1.2.3.4", &request("")).await.unwrap();
        let second = orchestrator.analyze("1.2.3.4", &request("")).await.unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.verdict, second.verdict);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_classifier_sees_cleaned_prompt() {
        let classifier = Arc::new(RecordingClassifier::default());
        let (orchestrator, _clock) = orchestrator(classifier.clone());

        orchestrator.analyze("1.2.3.4", &request("")).await.unwrap();
        assert_eq!(classifier.prompts_seen.lock()[0], "snake game");
    }

    #[tokio::test]
    async fn test_prompt_of_only_stop_words_is_kept() {
        let classifier = Arc::new(RecordingClassifier::default());
        let (orchestrator, _clock) = orchestrator(classifier.clone());

        let mut req = request("");
        req.prompt = " please detect if there is any video ".to_string();
        orchestrator.analyze("1.2.3.4", &req).await.unwrap();

        assert_eq!(
            classifier.prompts_seen.lock()[0],
            "please detect if there is any video"
        );
    }

    #[tokio::test]
    async fn test_caption_history_feeds_classifier() {
        let classifier = Arc::new(RecordingClassifier::default());
        let (orchestrator, _clock) = orchestrator(classifier.clone());

        orchestrator.analyze("1.2.3.4", &request("the cat sat")).await.unwrap();
        orchestrator.analyze("1.2.3.4", &request("sat on the mat")).await.unwrap();

        let seen = classifier.captions_seen.lock().clone();
        assert_eq!(seen, vec!["the cat sat", "the cat sat on the mat"]);
        assert_eq!(
            orchestrator.sessions().update("1.2.3.4", "https://youtube.com/watch?v=abc", ""),
            "the cat sat on the mat"
        );
    }

    #[tokio::test]
    async fn test_session_id_separates_viewers() {
        let classifier = Arc::new(RecordingClassifier::default());
        let (orchestrator, _clock) = orchestrator(classifier.clone());

        let mut tab_a = request("first tab words");
        tab_a.session_id = "tab-a".to_string();
        let mut tab_b = request("second tab words");
        tab_b.session_id = "tab-b".to_string();

        orchestrator.analyze("10.0.0.1", &tab_a).await.unwrap();
        orchestrator.analyze("10.0.0.1", &tab_b).await.unwrap();

        assert_eq!(orchestrator.sessions().len(), 2);
        assert_eq!(classifier.captions_seen.lock()[1], "second tab words");
    }

    #[tokio::test]
    async fn test_without_video_url_captions_pass_through() {
        let classifier = Arc::new(RecordingClassifier::default());
        let (orchestrator, _clock) = orchestrator(classifier.clone());

        let mut req = request("  raw captions ");
        req.video_url.clear();
        orchestrator.analyze("1.2.3.4", &req).await.unwrap();

        assert!(orchestrator.sessions().is_empty());
        assert_eq!(classifier.captions_seen.lock()[0], "  raw captions ");
    }

    #[tokio::test]
    async fn test_rate_limited_request_touches_nothing() {
        let classifier = Arc::new(RecordingClassifier::default());
        let (orchestrator, _clock) = orchestrator(classifier.clone());

        for i in 0..10 {
            let mut req = request("");
            req.prompt = format!("thing {}", i);
            orchestrator.analyze("1.2.3.4", &req).await.unwrap();
        }

        let result = orchestrator.analyze("1.2.3.4", &request("never merged")).await;
        assert!(matches!(result, Err(DetectorError::RateLimited)));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 10);
        assert!(!orchestrator
            .sessions()
            .update("1.2.3.4", "https://youtube.com/watch?v=abc", "")
            .contains("never merged"));

        // Other clients are unaffected
        assert!(orchestrator.analyze("5.6.7.8", &request("")).await.is_ok());
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_and_session_untouched() {
        let classifier = Arc::new(RecordingClassifier {
            fail_with_status: Some(503),
            ..Default::default()
        });
        let (orchestrator, _clock) = orchestrator(classifier.clone());

        let result = orchestrator.analyze("1.2.3.4", &request("lost words")).await;
        match result {
            Err(e) => assert_eq!(e.status_code().as_u16(), 503),
            Ok(_) => panic!("expected upstream failure"),
        }
        assert!(orchestrator.cache().is_empty());
        assert!(orchestrator.sessions().is_empty());
        assert_eq!(orchestrator.limiter().usage("1.2.3.4").requests_last_hour, 1);
    }

    #[tokio::test]
    async fn test_failure_restores_earlier_history() {
        let classifier = Arc::new(RecordingClassifier {
            fail_with_status: Some(500),
            ..Default::default()
        });
        let (orchestrator, _clock) = orchestrator(classifier);
        orchestrator
            .sessions()
            .update("1.2.3.4", "https://youtube.com/watch?v=abc", "earlier words");

        let result = orchestrator.analyze("1.2.3.4", &request("lost words")).await;
        assert!(result.is_err());
        assert_eq!(
            orchestrator.sessions().update("1.2.3.4", "https://youtube.com/watch?v=abc", ""),
            "earlier words"
        );
    }

    #[tokio::test]
    async fn test_overlapping_requests_see_each_others_captions() {
        let classifier = Arc::new(RecordingClassifier {
            delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let (orchestrator, _clock) = orchestrator(classifier.clone());
        let orchestrator = Arc::new(orchestrator);

        let first = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                orchestrator
                    .analyze("1.2.3.4", &request("first fragment here"))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                orchestrator
                    .analyze("1.2.3.4", &request("second fragment there"))
                    .await
            })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let seen = classifier.captions_seen.lock().clone();
        assert_eq!(
            seen,
            vec![
                "first fragment here",
                "first fragment here second fragment there"
            ]
        );
        assert_eq!(
            orchestrator.sessions().update("1.2.3.4", "https://youtube.com/watch?v=abc", ""),
            "first fragment here second fragment there"
        );
    }

    #[tokio::test]
    async fn test_invalid_image_is_rejected_before_classifier() {
        let classifier = Arc::new(RecordingClassifier::default());
        let (orchestrator, _clock) = orchestrator(classifier.clone());

        let mut req = request("");
        req.image = "not base64!!".to_string();
        let result = orchestrator.analyze("1.2.3.4", &req).await;

        assert!(matches!(result, Err(DetectorError::InvalidRequest(_))));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_verdict_is_recomputed() {
        let classifier = Arc::new(RecordingClassifier::default());
        let (orchestrator, clock) = orchestrator(classifier.clone());

        orchestrator.analyze("1.2.3.4", &request("")).await.unwrap();
        clock.advance(Duration::from_secs(301));
        let again = orchestrator.analyze("1.2.3.4", &request("")).await.unwrap();

        assert!(!again.cached);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_identical_requests_share_one_call() {
        let classifier = Arc::new(RecordingClassifier {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let (orchestrator, _clock) = orchestrator(classifier.clone());
        let orchestrator = Arc::new(orchestrator);

        let tasks: Vec<_> = ["1.1.1.1", "2.2.2.2", "3.3.3.3"]
            .into_iter()
            .map(|ip| {
                let orchestrator = Arc::clone(&orchestrator);
                tokio::spawn(async move {
                    let mut req = request("");
                    req.video_url.clear();
                    orchestrator.analyze(ip, &req).await
                })
            })
            .collect();

        let mut cached = 0;
        for task in tasks {
            if task.await.unwrap().unwrap().cached {
                cached += 1;
            }
        }
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached, 2);
    }

    #[tokio::test]
    async fn test_sweep_reports_removed_state() {
        let classifier = Arc::new(RecordingClassifier::default());
        let (orchestrator, clock) = orchestrator(classifier);

        orchestrator.analyze("1.2.3.4", &request("words")).await.unwrap();
        clock.advance(Duration::from_secs(3601));

        let report = orchestrator.sweep();
        assert_eq!(
            report,
            SweepReport {
                cache_entries: 1,
                sessions: 1,
                identities: 1,
            }
        );
    }
}
