//! Concurrency-bounded, retrying client for the upstream game API.
//!
//! ## Retry policy (per attempt, up to `max_attempts`)
//!
//! - `200` → return the body
//! - `429` → wait `Retry-After` seconds (capped at `4 * max_backoff`) if present,
//!   else jittered backoff
//! - `5xx`, timeouts, connection failures → jittered backoff
//! - anything else → [`UpstreamError::Status`] immediately
//!
//! The backoff base doubles after every failed attempt, capped at
//! `max_backoff`; the jittered wait is `base * U(0.5, 1.0)`.
//!
//! A semaphore permit is held for the whole logical request (including
//! backoff sleeps), so at most `max_concurrency` requests are in flight across
//! every caller sharing one client. Waiters are served FIFO.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use rand::Rng;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::error::UpstreamError;
use super::transport::{HttpTransport, TransportError};

/// Retry/backoff configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Backoff base before the second attempt.
    pub initial_backoff: Duration,
    /// Cap on the backoff base.
    pub max_backoff: Duration,
    /// Deadline for a single attempt; expiry counts as a network failure.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 7,
            initial_backoff: Duration::from_millis(1_000),
            max_backoff: Duration::from_millis(16_000),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Unjittered backoff base after failed attempt `attempt` (1-indexed):
    /// `initial * 2^(attempt-1)`, capped.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exp = attempt.saturating_sub(1).min(20);
        let base_ms = self.initial_backoff.as_millis().saturating_mul(1u128 << exp);
        Duration::from_millis(base_ms.min(self.max_backoff.as_millis()) as u64)
    }

    /// Longest server-requested `Retry-After` wait that is honoured as-is.
    pub fn retry_after_cap(&self) -> Duration {
        self.max_backoff.saturating_mul(4)
    }

    /// Scale a backoff base by a jitter factor, clamped to `[0.5, 1.0]`.
    pub fn jittered(base: Duration, factor: f64) -> Duration {
        base.mul_f64(factor.clamp(0.5, 1.0))
    }
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub max_concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Counters snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ClientStats {
    pub requests: u64,
    pub attempts: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub in_flight: usize,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    attempts: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    in_flight: AtomicUsize,
}

/// Decrements the in-flight gauge on every exit path.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(gauge: &'a AtomicUsize) -> Self {
        gauge.fetch_add(1, Ordering::SeqCst);
        Self(gauge)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Share one instance (behind `Arc`) between every caller that should count
/// against the same concurrency budget.
pub struct RateLimitedClient<T: HttpTransport> {
    transport: T,
    permits: Semaphore,
    retry: RetryPolicy,
    counters: Counters,
}

impl<T: HttpTransport> std::fmt::Debug for RateLimitedClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedClient")
            .field("available_permits", &self.permits.available_permits())
            .field("retry", &self.retry)
            .finish()
    }
}

impl<T: HttpTransport> RateLimitedClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            permits: Semaphore::new(config.max_concurrency.max(1)),
            retry: config.retry,
            counters: Counters::default(),
        }
    }

    pub fn stats(&self) -> ClientStats {
        ClientStats {
            requests: self.counters.requests.load(Ordering::SeqCst),
            attempts: self.counters.attempts.load(Ordering::SeqCst),
            succeeded: self.counters.succeeded.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
            in_flight: self.counters.in_flight.load(Ordering::SeqCst),
        }
    }

    /// GET `url` and decode the JSON body.
    pub async fn get_json<R: DeserializeOwned>(&self, url: &Url) -> Result<R, UpstreamError> {
        let body = self.get(url).await?;
        serde_json::from_str(&body).map_err(|source| UpstreamError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// GET `url`, returning the raw body of the first `200` response.
    pub async fn get(&self, url: &Url) -> Result<String, UpstreamError> {
        self.counters.requests.fetch_add(1, Ordering::SeqCst);

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| UpstreamError::Client("client shut down".to_string()))?;
        let _in_flight = InFlight::enter(&self.counters.in_flight);

        let result = self.attempt_loop(url).await;
        match &result {
            Ok(_) => self.counters.succeeded.fetch_add(1, Ordering::SeqCst),
            Err(_) => self.counters.failed.fetch_add(1, Ordering::SeqCst),
        };
        result
    }

    async fn attempt_loop(&self, url: &Url) -> Result<String, UpstreamError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            self.counters.attempts.fetch_add(1, Ordering::SeqCst);

            let outcome =
                tokio::time::timeout(self.retry.attempt_timeout, self.transport.get(url)).await;

            let retry_after = match outcome {
                Ok(Ok(response)) if response.status == 200 => {
                    debug!(url = %url, attempt, "upstream request succeeded");
                    return Ok(response.body);
                }
                Ok(Ok(response)) if response.status == 429 => {
                    last_error = "rate limited (429)".to_string();
                    response
                        .retry_after
                        .as_deref()
                        .and_then(parse_retry_after)
                        .map(|wait| wait.min(self.retry.retry_after_cap()))
                }
                Ok(Ok(response)) if (500..600).contains(&response.status) => {
                    last_error = format!("server error ({})", response.status);
                    None
                }
                Ok(Ok(response)) => {
                    return Err(UpstreamError::Status {
                        status: response.status,
                        body: response.body,
                    });
                }
                Ok(Err(err)) => {
                    last_error = err.to_string();
                    None
                }
                Err(_elapsed) => {
                    last_error = TransportError::Timeout.to_string();
                    None
                }
            };

            if attempt == max_attempts {
                break;
            }

            let wait = retry_after.unwrap_or_else(|| {
                let factor = rand::thread_rng().gen_range(0.5..=1.0);
                RetryPolicy::jittered(self.retry.backoff_for_attempt(attempt), factor)
            });

            warn!(
                url = %url,
                attempt,
                wait_ms = wait.as_millis() as u64,
                error = %last_error,
                "upstream attempt failed; retrying"
            );
            tokio::time::sleep(wait).await;
        }

        Err(UpstreamError::RetriesExhausted {
            attempts: max_attempts,
            last_error,
        })
    }
}

/// `Retry-After` as delta-seconds. HTTP-date values are ignored (fall back to backoff).
fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs.min(u32::MAX as f64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::time::Instant;

    use crate::upstream::transport::UpstreamResponse;

    enum Step {
        Respond(UpstreamResponse),
        Fail(TransportError),
        Hang,
    }

    /// Plays back a fixed script; once exhausted every call answers `200 "ok"`.
    #[derive(Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                script: Mutex::new(steps.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn get(&self, _url: &Url) -> Result<UpstreamResponse, TransportError> {
            self.calls.lock().unwrap().push(Instant::now());
            let step = self.script.lock().unwrap().pop_front();
            match step {
                Some(Step::Respond(r)) => Ok(r),
                Some(Step::Fail(e)) => Err(e),
                Some(Step::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(TransportError::Timeout)
                }
                None => Ok(UpstreamResponse::new(200, "ok")),
            }
        }
    }

    /// Tracks how many calls are outstanding at once.
    #[derive(Default)]
    struct GaugeTransport {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl HttpTransport for GaugeTransport {
        async fn get(&self, _url: &Url) -> Result<UpstreamResponse, TransportError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(UpstreamResponse::new(200, "{}"))
        }
    }

    /// Records the order in which request paths reach the upstream.
    #[derive(Default)]
    struct OrderTransport {
        order: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpTransport for OrderTransport {
        async fn get(&self, url: &Url) -> Result<UpstreamResponse, TransportError> {
            self.order.lock().unwrap().push(url.path().to_string());
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(UpstreamResponse::new(200, url.path()))
        }
    }

    fn url() -> Url {
        Url::parse("https://europe.api.test/lol/match/v5/matches/EUW1_1").unwrap()
    }

    fn client(transport: &Arc<ScriptedTransport>) -> RateLimitedClient<Arc<ScriptedTransport>> {
        RateLimitedClient::new(Arc::clone(transport), ClientConfig::default())
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for_attempt(1), Duration::from_millis(1_000));
        assert_eq!(policy.backoff_for_attempt(2), Duration::from_millis(2_000));
        assert_eq!(policy.backoff_for_attempt(4), Duration::from_millis(8_000));
        assert_eq!(policy.backoff_for_attempt(5), Duration::from_millis(16_000));
        assert_eq!(policy.backoff_for_attempt(6), Duration::from_millis(16_000));
        assert_eq!(policy.backoff_for_attempt(60), Duration::from_millis(16_000));
    }

    #[test]
    fn jitter_stays_between_half_and_full_base() {
        let base = Duration::from_millis(4_000);
        assert_eq!(RetryPolicy::jittered(base, 0.5), Duration::from_millis(2_000));
        assert_eq!(RetryPolicy::jittered(base, 1.0), base);
        assert_eq!(RetryPolicy::jittered(base, 0.1), Duration::from_millis(2_000));
        assert_eq!(RetryPolicy::jittered(base, 3.0), base);
    }

    #[test]
    fn retry_after_parses_delta_seconds() {
        assert_eq!(parse_retry_after("2"), Some(Duration::from_millis(2_000)));
        assert_eq!(parse_retry_after(" 0.5 "), Some(Duration::from_millis(500)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after("-1"), None);
        assert!(parse_retry_after("1e12").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_then_ok_returns_body_after_two_attempts() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::Respond(UpstreamResponse::new(429, "slow down")),
            Step::Respond(UpstreamResponse::new(200, "{\"ok\":true}")),
        ]));
        let client = client(&transport);

        let body = client.get(&url()).await.unwrap();
        assert_eq!(body, "{\"ok\":true}");
        assert_eq!(transport.call_times().len(), 2);
        assert_eq!(client.stats().attempts, 2);
        assert_eq!(client.stats().succeeded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_header_is_honoured() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::Respond(
            UpstreamResponse::new(429, "").with_retry_after("2"),
        )]));
        let client = client(&transport);

        client.get(&url()).await.unwrap();
        let calls = transport.call_times();
        assert_eq!(calls.len(), 2);
        assert!(calls[1] - calls[0] >= Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_back_off_with_jitter() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::Respond(UpstreamResponse::new(503, "")),
            Step::Respond(UpstreamResponse::new(500, "")),
            Step::Respond(UpstreamResponse::new(502, "")),
            Step::Respond(UpstreamResponse::new(429, "")),
        ]));
        let client = client(&transport);
        let policy = RetryPolicy::default();

        client.get(&url()).await.unwrap();
        let calls = transport.call_times();
        assert_eq!(calls.len(), 5);

        for (i, pair) in calls.windows(2).enumerate() {
            let waited = pair[1] - pair[0];
            let base = policy.backoff_for_attempt(i as u32 + 1);
            assert!(waited >= base / 2, "wait {i} too short: {waited:?} < {base:?}/2");
            assert!(waited <= base + Duration::from_millis(5), "wait {i} too long: {waited:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_client_errors_are_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::Respond(
            UpstreamResponse::new(404, "{\"status\":{\"message\":\"Data not found\"}}"),
        )]));
        let client = client(&transport);

        let err = client.get(&url()).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, UpstreamError::Status { status: 404, ref body } if body.contains("Data not found")));
        assert_eq!(transport.call_times().len(), 1);
        assert_eq!(client.stats().failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_seven_attempts() {
        let steps = (0..10)
            .map(|_| Step::Respond(UpstreamResponse::new(500, "")))
            .collect();
        let transport = Arc::new(ScriptedTransport::new(steps));
        let client = client(&transport);

        let err = client.get(&url()).await.unwrap_err();
        assert!(matches!(err, UpstreamError::RetriesExhausted { attempts: 7, .. }));
        assert_eq!(transport.call_times().len(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn network_failures_and_timeouts_are_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::Fail(TransportError::Connect("connection reset".to_string())),
            Step::Hang,
        ]));
        let client = client(&transport);

        assert_eq!(client.get(&url()).await.unwrap(), "ok");
        assert_eq!(transport.call_times().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permit_is_released_on_failure() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::Respond(UpstreamResponse::new(403, "forbidden")),
            Step::Respond(UpstreamResponse::new(200, "second")),
        ]));
        let client = RateLimitedClient::new(
            Arc::clone(&transport),
            ClientConfig::default().with_max_concurrency(1),
        );

        assert!(client.get(&url()).await.is_err());
        assert_eq!(client.get(&url()).await.unwrap(), "second");
        assert_eq!(client.stats().in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_max_concurrency() {
        let transport = Arc::new(GaugeTransport::default());
        let client = Arc::new(RateLimitedClient::new(
            Arc::clone(&transport),
            ClientConfig::default().with_max_concurrency(5),
        ));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move { client.get(&url()).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(transport.peak.load(Ordering::SeqCst), 5);
        assert_eq!(client.stats().requests, 20);
        assert_eq!(client.stats().in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn decodes_json_bodies() {
        #[derive(Debug, serde::Deserialize)]
        struct Body {
            ok: bool,
        }
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::Respond(UpstreamResponse::new(200, "{\"ok\":true}")),
            Step::Respond(UpstreamResponse::new(200, "not json")),
        ]));
        let client = client(&transport);

        let body: Body = client.get_json(&url()).await.unwrap();
        assert!(body.ok);
        let err = client.get_json::<Body>(&url()).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Decode { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn permit_is_released_after_retries_are_exhausted() {
        let steps = (0..14)
            .map(|_| Step::Respond(UpstreamResponse::new(503, "")))
            .collect();
        let transport = Arc::new(ScriptedTransport::new(steps));
        let client = RateLimitedClient::new(
            Arc::clone(&transport),
            ClientConfig::default().with_max_concurrency(1),
        );

        for _ in 0..2 {
            let err = client.get(&url()).await.unwrap_err();
            assert!(matches!(err, UpstreamError::RetriesExhausted { attempts: 7, .. }));
        }
        let stats = client.stats();
        assert_eq!(stats.attempts, 14);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.in_flight, 0);
        assert_eq!(client.get(&url()).await.unwrap(), "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_network_failure_exhausts_retries() {
        let steps = (0..7)
            .map(|_| Step::Fail(TransportError::Connect("connection refused".to_string())))
            .collect();
        let transport = Arc::new(ScriptedTransport::new(steps));
        let client = RateLimitedClient::new(
            Arc::clone(&transport),
            ClientConfig::default().with_max_concurrency(1),
        );

        let err = client.get(&url()).await.unwrap_err();
        match err {
            UpstreamError::RetriesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 7);
                assert!(last_error.contains("connection refused"), "{last_error}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(transport.call_times().len(), 7);
        assert_eq!(client.stats().in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_are_served_in_arrival_order() {
        let transport = Arc::new(OrderTransport::default());
        let client = Arc::new(RateLimitedClient::new(
            Arc::clone(&transport),
            ClientConfig::default().with_max_concurrency(1),
        ));

        let mut handles = Vec::new();
        for name in ["first", "second", "third"] {
            let client = Arc::clone(&client);
            let url = Url::parse(&format!("https://europe.api.test/{name}")).unwrap();
            handles.push(tokio::spawn(async move { client.get(&url).await }));
            // Let the task reach the semaphore before the next one is spawned.
            tokio::task::yield_now().await;
        }

        let mut finished = Vec::new();
        for handle in handles {
            finished.push(handle.await.unwrap().unwrap());
        }

        let expected = vec!["/first".to_string(), "/second".to_string(), "/third".to_string()];
        assert_eq!(*transport.order.lock().unwrap(), expected);
        assert_eq!(finished, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_retry_after_is_capped() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::Respond(
            UpstreamResponse::new(429, "").with_retry_after("1e12"),
        )]));
        let client = client(&transport);
        let cap = RetryPolicy::default().retry_after_cap();

        client.get(&url()).await.unwrap();
        let calls = transport.call_times();
        assert_eq!(calls.len(), 2);
        assert!(calls[1] - calls[0] >= cap);
        assert!(calls[1] - calls[0] <= cap + Duration::from_millis(5));
    }
}
