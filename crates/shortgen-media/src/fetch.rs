//! Retrying download primitive.
//!
//! Every attempt is bounded by a hard timeout; a timed-out attempt and a
//! failed attempt are retried identically and only told apart in the logs.
//! The caller owns concurrency: this module never parallelizes on its own.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use shortgen_storage::ObjectStore;

use crate::error::{MediaError, MediaResult};

/// Retry/timeout budget for one logical download.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum attempts including the first one.
    pub max_attempts: u32,
    /// Hard timeout per attempt; exceeding it aborts the in-flight request.
    pub attempt_timeout: Duration,
    /// Base delay between attempts; the actual delay scales linearly with
    /// the attempt number, so it is monotonically non-decreasing.
    pub base_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(120),
            base_delay: Duration::from_secs(2),
        }
    }
}

impl FetchConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay inserted after failed attempt `attempt` (1-based).
    fn delay_after_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Run `operation` under the config's retry budget.
///
/// A failed non-final attempt sleeps `base_delay × attempt` before the next
/// one; exhausting the budget surfaces the last error.
pub async fn with_retries<F, Fut, T>(
    config: &FetchConfig,
    operation_name: &str,
    operation: F,
) -> MediaResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = MediaResult<T>>,
{
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_attempts => {
                let delay = config.delay_after_attempt(attempt);
                warn!(
                    "{} attempt {}/{} failed, retrying in {:?}: {}",
                    operation_name, attempt, config.max_attempts, delay, e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(
                    "{} failed after {} attempts: {}",
                    operation_name, config.max_attempts, e
                );
                return Err(e);
            }
        }
    }
}

/// HTTP fetcher over a shared client.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn try_fetch(&self, url: &str) -> MediaResult<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Download `url`, retrying per the configured budget.
    pub async fn fetch_bytes(&self, url: &str) -> MediaResult<Vec<u8>> {
        let timeout_secs = self.config.attempt_timeout.as_secs();

        with_retries(&self.config, "download", || async move {
            match tokio::time::timeout(self.config.attempt_timeout, self.try_fetch(url)).await {
                Ok(result) => result,
                Err(_) => Err(MediaError::AttemptTimedOut {
                    url: url.to_string(),
                    timeout_secs,
                }),
            }
        })
        .await
    }

    /// Download `url` and store it at `key`.
    ///
    /// The body is buffered fully before the single store write, so a failed
    /// attempt never leaves a valid-looking destination artifact.
    pub async fn fetch_to_store(
        &self,
        store: &dyn ObjectStore,
        url: &str,
        key: &str,
        content_type: &str,
    ) -> MediaResult<()> {
        let bytes = self.fetch_bytes(url).await?;
        debug!(url, key, size = bytes.len(), "storing fetched object");
        store.put(key, bytes, content_type).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shortgen_storage::LocalStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config() -> FetchConfig {
        FetchConfig::default()
            .with_base_delay(Duration::from_millis(1))
            .with_attempt_timeout(Duration::from_secs(5))
    }

    #[test]
    fn delay_scales_linearly_and_never_decreases() {
        let config = FetchConfig::default().with_base_delay(Duration::from_secs(2));

        assert_eq!(config.delay_after_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_after_attempt(2), Duration::from_secs(4));
        assert_eq!(config.delay_after_attempt(3), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn fetch_succeeds_first_try() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"clip".to_vec()))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(fast_config());
        let bytes = fetcher
            .fetch_bytes(&format!("{}/clip.mp4", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, b"clip");
    }

    #[tokio::test]
    async fn fetch_retries_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"clip".to_vec()))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(fast_config());
        let bytes = fetcher
            .fetch_bytes(&format!("{}/clip.mp4", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, b"clip");
    }

    #[tokio::test]
    async fn exhausted_budget_surfaces_last_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(fast_config());
        let err = fetcher
            .fetch_bytes(&format!("{}/clip.mp4", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Http(_)));
    }

    #[tokio::test]
    async fn failed_fetch_writes_no_artifact() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let fetcher = Fetcher::new(fast_config());
        let result = fetcher
            .fetch_to_store(
                &store,
                &format!("{}/clip.mp4", server.uri()),
                "run_1/sentence_1_illustration.mp4",
                "video/mp4",
            )
            .await;

        assert!(result.is_err());
        assert!(!store
            .exists("run_1/sentence_1_illustration.mp4")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn with_retries_gives_up_after_budget() {
        let config = fast_config().with_max_attempts(2);
        let calls = std::sync::atomic::AtomicU32::new(0);

        let result: MediaResult<()> = with_retries(&config, "test_op", || {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { Err(MediaError::download_failed("boom")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
