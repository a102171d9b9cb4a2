use std::time::{Duration, Instant};

use tracing::trace;

const TICK: Duration = Duration::from_secs(1);

/// Deadline of the next one second tick. Only exists while running, so
/// pausing or dropping the stopwatch cancels it.
#[derive(Debug)]
struct Ticker {
    next: Instant,
}

#[derive(Debug, Default)]
pub struct Stopwatch {
    elapsed: u64,
    ticker: Option<Ticker>,
}

impl Stopwatch {
    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn start(&mut self, now: Instant) {
        if self.ticker.is_none() {
            self.ticker = Some(Ticker { next: now + TICK });
            trace!("Stopwatch started at {}s", self.elapsed);
        }
    }

    pub fn stop(&mut self) {
        if self.ticker.take().is_some() {
            trace!("Stopwatch stopped at {}s", self.elapsed);
        }
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.is_running() {
            self.stop();
        } else {
            self.start(now);
        }
    }

    pub fn reset(&mut self) {
        self.ticker = None;
        self.elapsed = 0;
    }

    /// Count every whole second that passed up to `now`.
    pub fn advance(&mut self, now: Instant) {
        if let Some(ticker) = self.ticker.as_mut() {
            while now >= ticker.next {
                self.elapsed += 1;
                ticker.next += TICK;
            }
        }
    }

    pub fn display(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ninety_seconds_reads_one_thirty() {
        let t0 = Instant::now();
        let mut watch = Stopwatch::default();
        watch.start(t0);
        watch.advance(t0 + Duration::from_secs(90));
        assert_eq!(watch.display(), "1:30");
    }

    #[test]
    fn ticks_one_at_a_time() {
        let t0 = Instant::now();
        let mut watch = Stopwatch::default();
        watch.start(t0);
        watch.advance(t0 + Duration::from_millis(999));
        assert_eq!(watch.elapsed(), 0);
        for s in 1..=3 {
            watch.advance(t0 + Duration::from_secs(s));
        }
        assert_eq!(watch.elapsed(), 3);
    }

    #[test]
    fn pause_keeps_the_count_and_stops_ticking() {
        let t0 = Instant::now();
        let mut watch = Stopwatch::default();
        watch.toggle(t0);
        watch.advance(t0 + Duration::from_secs(5));
        watch.toggle(t0 + Duration::from_secs(5));
        assert!(!watch.is_running());
        watch.advance(t0 + Duration::from_secs(60));
        assert_eq!(watch.display(), "0:05");

        let t1 = t0 + Duration::from_secs(60);
        watch.toggle(t1);
        watch.advance(t1 + Duration::from_secs(2));
        assert_eq!(watch.elapsed(), 7);
    }

    #[test]
    fn starting_twice_does_not_double_tick() {
        let t0 = Instant::now();
        let mut watch = Stopwatch::default();
        watch.start(t0);
        watch.start(t0 + Duration::from_millis(500));
        watch.advance(t0 + Duration::from_secs(10));
        assert_eq!(watch.elapsed(), 10);
    }

    #[test]
    fn reset_zeroes_and_pauses() {
        let t0 = Instant::now();
        let mut watch = Stopwatch::default();
        watch.start(t0);
        watch.advance(t0 + Duration::from_secs(42));
        watch.reset();
        assert_eq!(watch.display(), "0:00");
        assert!(!watch.is_running());

        watch.reset();
        assert_eq!(watch.display(), "0:00");
    }

    #[test]
    fn minutes_are_unpadded_and_unbounded() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(59), "0:59");
        assert_eq!(format_elapsed(61), "1:01");
        assert_eq!(format_elapsed(6000), "100:00");
    }
}
