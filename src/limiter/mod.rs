//! Sliding-window admission control per client identity.
//!
//! Every identity owns a queue of admission timestamps covering the trailing
//! hour. Admission purges the queue, checks the hourly and per-minute budgets
//! and records the new request, all while holding the identity's map entry so
//! that two concurrent requests can never both squeeze past the limit.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::RateLimitConfig;
use crate::utils::clock::SharedClock;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

const HOUR: Duration = Duration::from_secs(60 * 60);
const MINUTE: Duration = Duration::from_secs(60);

/// Admission timestamps for one identity, oldest first
#[derive(Debug, Default)]
struct ClientWindow {
    admitted: VecDeque<Instant>,
}

impl ClientWindow {
    /// Drop timestamps that fell out of the trailing hour
    fn purge(&mut self, now: Instant) {
        while let Some(&oldest) = self.admitted.front() {
            if now.saturating_duration_since(oldest) < HOUR {
                break;
            }
            self.admitted.pop_front();
        }
    }

    fn within_last_minute(&self, now: Instant) -> usize {
        self.admitted
            .iter()
            .rev()
            .take_while(|&&t| now.saturating_duration_since(t) < MINUTE)
            .count()
    }
}

/// Usage figures reported by `/api/stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub requests_last_hour: usize,
    pub limit_per_hour: usize,
    pub remaining: usize,
}

/// Per-identity rate limiter with a minute and an hour budget.
#[derive(Debug)]
pub struct RateLimiter {
    limits: RateLimitConfig,
    windows: DashMap<String, ClientWindow>,
    clock: SharedClock,
}

impl RateLimiter {
    pub fn new(limits: RateLimitConfig, clock: SharedClock) -> Self {
        Self {
            limits,
            windows: DashMap::new(),
            clock,
        }
    }

    /// Admit a request for `identity`, recording it on success.
    ///
    /// Rejected requests are not recorded, so a client that keeps hammering
    /// while limited does not extend its own penalty.
    pub fn admit(&self, identity: &str) -> bool {
        let now = self.clock.now();
        let mut window = self.windows.entry(identity.to_string()).or_default();

        window.purge(now);

        if window.admitted.len() >= self.limits.per_hour {
            debug!("Hourly limit reached for {}", identity);
            return false;
        }

        if window.within_last_minute(now) >= self.limits.per_minute {
            debug!("Per-minute limit reached for {}", identity);
            return false;
        }

        window.admitted.push_back(now);
        true
    }

    /// Current usage for `identity` without recording a request
    pub fn usage(&self, identity: &str) -> UsageSnapshot {
        let now = self.clock.now();
        let requests_last_hour = match self.windows.get_mut(identity) {
            Some(mut window) => {
                window.purge(now);
                window.admitted.len()
            }
            None => 0,
        };

        UsageSnapshot {
            requests_last_hour,
            limit_per_hour: self.limits.per_hour,
            remaining: self.limits.per_hour.saturating_sub(requests_last_hour),
        }
    }

    /// Number of identities with a window, live or not
    pub fn tracked_identities(&self) -> usize {
        self.windows.len()
    }

    /// Forget identities with no request in the trailing hour.
    ///
    /// Returns the number of identities removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.purge(now);
            !window.admitted.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }
}
