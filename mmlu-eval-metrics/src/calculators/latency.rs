use std::time::{Duration, Instant};

/// Wall-clock timer for backend calls.
pub struct LatencyCalculator;

impl LatencyCalculator {
    pub fn start() -> Instant {
        Instant::now()
    }

    pub fn measure(start: Instant) -> Duration {
        start.elapsed()
    }
}
