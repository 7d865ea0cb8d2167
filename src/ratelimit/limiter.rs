use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::ratelimit::config::Config;

/// Remaining quota for a caller at the time of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub remaining: u32,
    pub reset_after: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed(Quota),
    Limited { reset_after: Duration },
}

pub trait RateLimiter {
    /// Record one call for `key` and decide whether it may proceed.
    fn hit(&self, key: &str) -> Decision;
}

struct Window {
    count: u32,
    started_at: Instant,
}

/// Fixed-window counter per key. Windows are tracked in memory; a key's
/// counter resets once its window elapses, but idle keys are never purged,
/// so the map grows with the number of distinct callers seen.
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        FixedWindowLimiter {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn hit(&self, key: &str) -> Decision {
        let now = Instant::now();
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            // A poisoned map holds nothing but counters; keep going.
            Err(poisoned) => poisoned.into_inner(),
        };

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started_at: now,
        });

        let elapsed = now.duration_since(window.started_at);
        if elapsed >= self.window {
            window.count = 0;
            window.started_at = now;
        }

        let reset_after = self.window.saturating_sub(now.duration_since(window.started_at));
        if window.count >= self.max_requests {
            return Decision::Limited { reset_after };
        }

        window.count += 1;
        Decision::Allowed(Quota {
            remaining: self.max_requests - window.count,
            reset_after,
        })
    }
}
