//! Outbound call throttling against the Terraform API rate limit
//!
//! The API enforces a per-token ceiling of roughly 30 requests per second.
//! Every request the client issues passes through [`RateLimiter::acquire`],
//! which delays the caller until a slot is free and never rejects a call.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Rolling-window rate limiter.
///
/// Tracks the instants of recent calls; when the window is full, `acquire`
/// sleeps until the oldest call ages out. Strict arrival order under the
/// single-caller model this tool uses.
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            calls: Mutex::new(VecDeque::with_capacity(max_calls)),
        }
    }

    /// Wait until a call slot is available, then claim it.
    ///
    /// Returns immediately while the window has capacity. The wrapped
    /// operation's own errors are none of the limiter's business; this method
    /// cannot fail.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                while let Some(&oldest) = calls.front() {
                    if now.duration_since(oldest) >= self.window {
                        calls.pop_front();
                    } else {
                        break;
                    }
                }
                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    return;
                }
                match calls.front() {
                    Some(&oldest) => self.window.saturating_sub(now.duration_since(oldest)),
                    None => Duration::ZERO,
                }
            };
            tokio::time::sleep(wait).await;
        }
    }
}
