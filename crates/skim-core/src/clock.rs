use std::fmt;
use std::time::{Duration, Instant};

/// A pausable stopwatch cell. `tic` restarts the measurement, `toc` reads
/// the accumulated seconds without stopping it.
#[derive(Debug, Clone)]
pub struct Clock {
    started: Instant,
    accumulated: Duration,
    running: bool,
}

impl Clock {
    pub fn new() -> Self {
        Clock {
            started: Instant::now(),
            accumulated: Duration::ZERO,
            running: true,
        }
    }

    pub fn tic(&mut self) {
        self.started = Instant::now();
        self.accumulated = Duration::ZERO;
        self.running = true;
    }

    pub fn toc(&self) -> f64 {
        let total = if self.running {
            self.accumulated + self.started.elapsed()
        } else {
            self.accumulated
        };
        total.as_secs_f64()
    }

    pub fn pause(&mut self) {
        if self.running {
            self.accumulated += self.started.elapsed();
            self.running = false;
        }
    }

    pub fn resume(&mut self) {
        if !self.running {
            self.started = Instant::now();
            self.running = true;
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.toc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_freezes_the_reading() {
        let mut clock = Clock::new();
        clock.pause();
        let a = clock.toc();
        let b = clock.toc();
        assert_eq!(a, b);
        clock.resume();
        assert!(clock.toc() >= a);
    }

    #[test]
    fn tic_resets() {
        let mut clock = Clock::new();
        clock.pause();
        clock.tic();
        assert!(clock.toc() < 1.0);
    }
}
