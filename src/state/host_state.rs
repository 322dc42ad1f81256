use std::time::Duration;
use tokio::time::Instant;

/// Tracks request timing for one host during crawling
///
/// Pacing is measured from the most recent request event on the host: either
/// the moment a request was dispatched or the moment one completed, whichever
/// is later. With a single fetch in flight this amounts to sleeping the full
/// delay after every visited URL.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of requests dispatched to this host in the current run
    pub request_count: u64,

    /// Number of requests dispatched but not yet completed
    pub in_flight: u32,

    /// Most recent dispatch or completion
    pub last_activity: Option<Instant>,
}

impl HostState {
    /// Creates a new HostState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a request was dispatched
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.in_flight += 1;
        self.touch(now);
    }

    /// Records that a request finished, successfully or not
    pub fn record_completion(&mut self, now: Instant) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.touch(now);
    }

    fn touch(&mut self, now: Instant) {
        self.last_activity = Some(match self.last_activity {
            Some(prev) if prev > now => prev,
            _ => now,
        });
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_next_request(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_activity?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }
}
