//! Frontier queue and per-host pacing
//!
//! This module handles:
//! - The FIFO frontier of URLs waiting to be visited
//! - The seen set that guarantees each URL is fetched at most once
//! - Per-host spacing between requests, including robots.txt crawl delays

use crate::state::HostState;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

/// FIFO queue of pending URLs plus the set of URLs already visited
///
/// A URL is in at most one of three states: never discovered, pending in the
/// queue, or seen. Pushing a pending or seen URL is a no-op.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    pending: HashSet<String>,
    seen: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a URL unless it is already pending or seen
    ///
    /// # Returns
    ///
    /// `true` if the URL was added
    pub fn push(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.seen.contains(&url) || self.pending.contains(&url) {
            return false;
        }
        self.pending.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Dequeues the next URL that has not been seen and marks it seen
    ///
    /// Check and mark happen in one step, so a URL is handed out once per run.
    pub fn pop_unseen(&mut self) -> Option<String> {
        while let Some(url) = self.queue.pop_front() {
            self.pending.remove(&url);
            if self.seen.insert(url.clone()) {
                return Some(url);
            }
            tracing::trace!("Skipping already seen URL {}", url);
        }
        None
    }

    /// Marks a URL seen without visiting it
    ///
    /// Used for redirect targets so they are not fetched a second time.
    pub fn mark_seen(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.pending.remove(&url);
        self.queue.retain(|queued| queued != &url);
        self.seen.insert(url);
    }

    pub fn is_seen(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Number of URLs waiting in the queue
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

/// Enforces a minimum spacing between requests to the same host
///
/// The pacer is owned by the coordinator and shared by all workers through
/// it, so the limit is global rather than per worker.
#[derive(Debug)]
pub struct Pacer {
    /// Per-host state tracking
    host_states: HashMap<String, HostState>,

    /// Effective delay applied to every host
    delay: Duration,
}

impl Pacer {
    /// Creates a pacer using the larger of the configured and robots delays
    pub fn new(config_delay: Duration, robots_delay: Option<f64>) -> Self {
        Self {
            host_states: HashMap::new(),
            delay: effective_delay(config_delay, robots_delay),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits until `host` may receive another request, then records it
    pub async fn wait_turn(&mut self, host: &str) {
        loop {
            let now = Instant::now();
            let state = self
                .host_states
                .entry(host.to_string())
                .or_insert_with(HostState::new);

            match state.time_until_next_request(self.delay, now) {
                Some(wait) => {
                    tracing::trace!("Pacing {} for {:?}", host, wait);
                    tokio::time::sleep(wait).await;
                }
                None => {
                    state.record_request(now);
                    return;
                }
            }
        }
    }

    /// Records that a request to `host` finished at `at`
    pub fn record_completion(&mut self, host: &str, at: Instant) {
        self.host_states
            .entry(host.to_string())
            .or_insert_with(HostState::new)
            .record_completion(at);
    }

    /// Gets the state for a specific host
    pub fn host_state(&self, host: &str) -> Option<&HostState> {
        self.host_states.get(host)
    }
}

/// Longest robots.txt crawl delay honoured, in seconds
pub const MAX_ROBOTS_DELAY_SECS: f64 = 3600.0;

/// Calculates the effective delay for a host
///
/// This takes the maximum of the configured delay and the robots.txt
/// crawl delay (if specified). Negative or non-finite robots values are
/// ignored and larger ones are capped at `MAX_ROBOTS_DELAY_SECS`.
pub fn effective_delay(config_delay: Duration, robots_delay: Option<f64>) -> Duration {
    let robots_delay = robots_delay
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs.min(MAX_ROBOTS_DELAY_SECS)).ok())
        .unwrap_or(Duration::ZERO);

    std::cmp::max(config_delay, robots_delay)
}
