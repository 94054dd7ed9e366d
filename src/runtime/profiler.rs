//! Elapsed / CPU / memory instrumentation around a command body.
//!
//! Purely observational: a missing CPU clock or memory reading only thins
//! out the report, it never touches the body's result.

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

use super::usage::{ResourceUsage, process_cpu_time};

pub const DEFAULT_NOISE_FLOOR: Duration = Duration::from_millis(10);

/// Measurements for one command run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileReport {
    pub command: String,
    pub elapsed_secs: f64,
    pub cpu_secs: Option<f64>,
    /// Command peak minus the reading taken before the body ran, in MiB.
    pub used_mb: i64,
    pub peak_mb: u64,
    pub current_mb: u64,
}

impl fmt::Display for ProfileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} elapsed time {:.2} seconds",
            self.command, self.elapsed_secs
        )?;
        if let Some(cpu) = self.cpu_secs {
            write!(f, ", cpu_time {cpu:.2} seconds")?;
        }
        write!(
            f,
            "; used memory {}Mb, peak memory {}Mb, current memory {}Mb",
            self.used_mb, self.peak_mb, self.current_mb
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Profiler {
    pub enabled: bool,
    /// Runs shorter than this are not reported.
    pub noise_floor: Duration,
}

impl Default for Profiler {
    fn default() -> Self {
        Self {
            enabled: true,
            noise_floor: DEFAULT_NOISE_FLOOR,
        }
    }
}

fn kb_to_mb(kb: u64) -> u64 {
    kb / 1024
}

impl Profiler {
    pub fn new(enabled: bool, noise_floor: Duration) -> Self {
        Self {
            enabled,
            noise_floor,
        }
    }

    /// Run `body`, returning its result and a report when the run was long
    /// enough to be worth one.
    pub fn run<T>(
        &self,
        command: &str,
        usage: &dyn ResourceUsage,
        body: impl FnOnce() -> T,
    ) -> (T, Option<ProfileReport>) {
        if !self.enabled {
            return (body(), None);
        }

        let memory_before = usage.current_kb();
        let cpu_before = process_cpu_time();
        let started = Instant::now();

        let result = body();

        let elapsed = started.elapsed();
        if elapsed <= self.noise_floor {
            return (result, None);
        }
        let cpu = match (cpu_before, process_cpu_time()) {
            (Some(before), Some(after)) => Some(after.saturating_sub(before).as_secs_f64()),
            _ => None,
        };
        let used_kb = usage.command_peak_kb() as i64 - memory_before as i64;

        let report = ProfileReport {
            command: command.to_string(),
            elapsed_secs: elapsed.as_secs_f64(),
            cpu_secs: cpu,
            used_mb: used_kb / 1024,
            peak_mb: kb_to_mb(usage.process_peak_kb()),
            current_mb: kb_to_mb(usage.current_kb()),
        };
        (result, Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeUsage {
        current: Cell<u64>,
        peak: u64,
    }

    impl ResourceUsage for FakeUsage {
        fn current_kb(&self) -> u64 {
            self.current.get()
        }
        fn command_peak_kb(&self) -> u64 {
            self.peak
        }
        fn process_peak_kb(&self) -> u64 {
            8 * 1024
        }
        fn in_flight(&self) -> bool {
            true
        }
    }

    #[test]
    fn quick_runs_are_not_reported() {
        let usage = FakeUsage {
            current: Cell::new(0),
            peak: 0,
        };
        let (value, report) = Profiler::default().run("fast", &usage, || 7);
        assert_eq!(value, 7);
        assert!(report.is_none());
    }

    #[test]
    fn slow_runs_report_memory_delta() {
        let usage = FakeUsage {
            current: Cell::new(1024),
            peak: 4 * 1024,
        };
        let profiler = Profiler::new(true, Duration::from_millis(1));
        let (value, report) = profiler.run("slow", &usage, || {
            std::thread::sleep(Duration::from_millis(15));
            usage.current.set(2048);
            "done"
        });
        assert_eq!(value, "done");
        let report = report.expect("report above noise floor");
        assert_eq!(report.command, "slow");
        assert!(report.elapsed_secs >= 0.015);
        assert_eq!(report.used_mb, 3);
        assert_eq!(report.peak_mb, 8);
        assert_eq!(report.current_mb, 2);
        assert!(report.to_string().starts_with("slow elapsed time"));
    }

    #[test]
    fn disabled_profiler_only_runs_the_body() {
        let usage = FakeUsage {
            current: Cell::new(0),
            peak: 0,
        };
        let profiler = Profiler::new(false, Duration::ZERO);
        let (value, report) = profiler.run("x", &usage, || {
            std::thread::sleep(Duration::from_millis(2));
            1
        });
        assert_eq!(value, 1);
        assert!(report.is_none());
    }
}
