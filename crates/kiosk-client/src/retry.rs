//! Backoff for idempotent backend reads.
//!
//! Only the status and health GETs are retried. Opening or closing a locker
//! moves hardware and is sent exactly once.

use std::time::Duration;

/// Delay schedule between read attempts. Each wait doubles the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Backoff {
    first: Duration,
    retries: u32,
}

impl Backoff {
    /// Schedule for status polls and health checks: 200, 400 and 800 ms.
    pub(crate) const READS: Backoff = Backoff {
        first: Duration::from_millis(200),
        retries: 3,
    };

    /// Waits before each retry, in order.
    pub(crate) fn delays(self) -> impl Iterator<Item = Duration> {
        (0..self.retries).map(move |n| self.first * 2u32.pow(n))
    }
}

/// Send a read, resending it after transport failures until `backoff` runs
/// out. Any HTTP response ends the loop whatever its status.
pub(crate) async fn send_read(
    request: reqwest::RequestBuilder,
    endpoint: &str,
    backoff: Backoff,
) -> Result<reqwest::Response, reqwest::Error> {
    let mut delays = backoff.delays();
    loop {
        // Bodyless GETs always clone; anything else gets a single attempt.
        let Some(attempt) = request.try_clone() else {
            return request.send().await;
        };
        let err = match attempt.send().await {
            Ok(resp) => return Ok(resp),
            Err(e) => e,
        };
        let Some(delay) = delays.next() else {
            return Err(err);
        };
        tracing::debug!(endpoint, error = %err, ?delay, "backend unreachable, retrying");
        tokio::time::sleep(delay).await;
    }
}
