//! Level timer

use serde::{Deserialize, Serialize};

/// Elapsed play time for a level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelTimer {
    elapsed: f64,
    running: bool,
}

impl LevelTimer {
    /// Create a stopped timer at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds elapsed while running
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Advance by `delta_time` if running
    pub fn tick(&mut self, delta_time: f64) {
        if self.running {
            self.elapsed += delta_time.max(0.0);
        }
    }

    /// Elapsed time as `m:ss.ss`
    pub fn formatted(&self) -> String {
        format_time(self.elapsed)
    }
}

/// Format seconds as `m:ss.ss`
pub fn format_time(seconds: f64) -> String {
    let hundredths = (seconds.max(0.0) * 100.0).round() as u64;
    let minutes = hundredths / 6000;
    let rest = hundredths % 6000;
    format!("{}:{:02}.{:02}", minutes, rest / 100, rest % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00.00");
        assert_eq!(format_time(65.5), "1:05.50");
        assert_eq!(format_time(59.999), "1:00.00");
        assert_eq!(format_time(754.25), "12:34.25");
    }

    #[test]
    fn test_only_runs_when_started() {
        let mut timer = LevelTimer::new();
        timer.tick(1.0);
        assert_eq!(timer.elapsed(), 0.0);

        timer.start();
        timer.tick(1.5);
        timer.stop();
        timer.tick(3.0);
        assert_eq!(timer.elapsed(), 1.5);
        assert_eq!(timer.formatted(), "0:01.50");
    }
}
