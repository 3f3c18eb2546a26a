use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, instrument};

/// Sliding-window rate limiter for NCBI API compliance
///
/// NCBI E-utilities rate limits:
/// - 3 requests per second without API key
/// - 10 requests per second with API key
/// - Violations can result in IP blocking
///
/// The limiter guarantees that at any instant the number of admitted
/// requests timestamped within the trailing window (1 second) never
/// exceeds the configured ceiling. Waiting callers suspend on a timer
/// until the oldest admission ages out of the window.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<Window>>,
}

struct Window {
    ceiling: usize,
    span: Duration,
    admitted: VecDeque<Instant>,
}

impl RateLimiter {
    /// Create a new rate limiter admitting at most `ceiling` requests
    /// per trailing second
    ///
    /// # Example
    ///
    /// ```
    /// use entrez_client::rate_limit::RateLimiter;
    ///
    /// // NCBI rate limit without API key
    /// let limiter = RateLimiter::new(3);
    ///
    /// // NCBI rate limit with API key
    /// let limiter_with_key = RateLimiter::new(10);
    /// ```
    pub fn new(ceiling: usize) -> Self {
        Self::with_window(ceiling, Duration::from_secs(1))
    }

    /// Create a rate limiter with a custom trailing window span
    pub fn with_window(ceiling: usize, span: Duration) -> Self {
        let ceiling = ceiling.max(1);
        Self {
            inner: Arc::new(Mutex::new(Window {
                ceiling,
                span,
                admitted: VecDeque::with_capacity(ceiling),
            })),
        }
    }

    /// Rate limiter for NCBI API without API key (3 requests/second)
    pub fn ncbi_default() -> Self {
        Self::new(3)
    }

    /// Rate limiter for NCBI API with API key (10 requests/second)
    pub fn ncbi_with_key() -> Self {
        Self::new(10)
    }

    /// Admit one request, waiting if necessary to respect the ceiling
    ///
    /// Suspends until issuing one more request keeps the number of
    /// admissions within the trailing window at or below the ceiling.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use entrez_client::rate_limit::RateLimiter;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let limiter = RateLimiter::ncbi_default();
    ///
    ///     // This will respect the 3 requests/second limit
    ///     limiter.acquire().await;
    ///     // Make API call here
    /// }
    /// ```
    #[instrument(skip(self))]
    pub async fn acquire(&self) {
        loop {
            let wake_at = {
                let mut window = self.inner.lock().await;
                let now = Instant::now();
                window.prune(now);

                if window.admitted.len() < window.ceiling {
                    window.admitted.push_back(now);
                    debug!(in_window = window.admitted.len(), "request admitted");
                    return;
                }

                // Window is full; the next slot opens when the oldest
                // admission ages out.
                let oldest = *window
                    .admitted
                    .front()
                    .expect("full window has a front entry");
                oldest + window.span
            };

            debug!("rate ceiling reached, waiting for window to open");
            sleep_until(wake_at).await;
        }
    }

    /// Whether a request would be admitted immediately
    pub async fn check_available(&self) -> bool {
        let mut window = self.inner.lock().await;
        window.prune(Instant::now());
        window.admitted.len() < window.ceiling
    }

    /// Number of admissions still inside the trailing window
    pub async fn admitted_in_window(&self) -> usize {
        let mut window = self.inner.lock().await;
        window.prune(Instant::now());
        window.admitted.len()
    }

    /// The configured ceiling (requests per window)
    pub async fn ceiling(&self) -> usize {
        self.inner.lock().await.ceiling
    }
}

impl Window {
    /// Drop admissions older than the trailing window
    fn prune(&mut self, now: Instant) {
        while let Some(&front) = self.admitted.front() {
            if now.duration_since(front) >= self.span {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }
}
