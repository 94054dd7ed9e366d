//! Resource usage counters and the background sampler that feeds them.
//!
//! The sampler thread writes, the profiler reads. Counters are relaxed
//! atomics: readings may be one sample stale, which is fine for reporting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace};

/// Read-only view of memory usage consumed by the profiler.
pub trait ResourceUsage {
    /// Resident memory at the last sample, in KiB.
    fn current_kb(&self) -> u64;
    /// Highest sample since the running command started, in KiB.
    fn command_peak_kb(&self) -> u64;
    /// Highest sample since start-up, in KiB.
    fn process_peak_kb(&self) -> u64;
    /// Whether a command body is executing right now.
    fn in_flight(&self) -> bool;
}

#[derive(Debug, Default)]
pub struct SharedUsage {
    current: AtomicU64,
    command_peak: AtomicU64,
    process_peak: AtomicU64,
    in_flight: AtomicBool,
}

impl SharedUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one sample.
    pub fn record(&self, kb: u64) {
        self.current.store(kb, Ordering::Relaxed);
        self.process_peak.fetch_max(kb, Ordering::Relaxed);
        if self.in_flight.load(Ordering::Relaxed) {
            self.command_peak.fetch_max(kb, Ordering::Relaxed);
        }
    }

    /// Mark a command as running; its peak starts from the current reading.
    pub fn begin_command(&self) {
        if let Some(kb) = resident_kb() {
            self.record(kb);
        }
        self.command_peak
            .store(self.current.load(Ordering::Relaxed), Ordering::Relaxed);
        self.in_flight.store(true, Ordering::Relaxed);
    }

    pub fn end_command(&self) {
        if let Some(kb) = resident_kb() {
            self.record(kb);
        }
        self.in_flight.store(false, Ordering::Relaxed);
    }
}

impl ResourceUsage for SharedUsage {
    fn current_kb(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }
    fn command_peak_kb(&self) -> u64 {
        self.command_peak.load(Ordering::Relaxed)
    }
    fn process_peak_kb(&self) -> u64 {
        self.process_peak.load(Ordering::Relaxed)
    }
    fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Relaxed)
    }
}

/* ---- Sampler ---- */

/// Background thread sampling resident memory until dropped.
#[derive(Debug)]
pub struct Sampler {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Sampler {
    pub fn spawn(usage: Arc<SharedUsage>, interval: Duration) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("resource-sampler".into())
            .spawn(move || {
                while !stop_flag.load(Ordering::Relaxed) {
                    if let Some(kb) = resident_kb() {
                        usage.record(kb);
                        trace!(kb, in_flight = usage.in_flight(), "memory sample");
                    }
                    thread::park_timeout(interval);
                }
            })?;
        debug!(interval_ms = interval.as_millis() as u64, "resource sampler started");
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

/* ---- Platform readings ---- */

/// Resident set size of this process in KiB, if the platform exposes it.
#[cfg(target_os = "linux")]
pub fn resident_kb() -> Option<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    // SAFETY: sysconf has no preconditions.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size <= 0 {
        return None;
    }
    Some(pages * page_size as u64 / 1024)
}

/// Max resident set size; the closest portable reading outside Linux.
#[cfg(all(unix, not(target_os = "linux")))]
pub fn resident_kb() -> Option<u64> {
    // SAFETY: rusage is plain data and getrusage only writes into it.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    if unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) } != 0 {
        return None;
    }
    let max = usage.ru_maxrss as u64;
    if cfg!(target_os = "macos") {
        Some(max / 1024)
    } else {
        Some(max)
    }
}

#[cfg(not(unix))]
pub fn resident_kb() -> Option<u64> {
    None
}

/// CPU time consumed by the whole process so far.
#[cfg(unix)]
pub fn process_cpu_time() -> Option<Duration> {
    // SAFETY: timespec is plain data; clock_gettime only writes into it.
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    if unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) } != 0 {
        return None;
    }
    Some(Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32))
}

#[cfg(not(unix))]
pub fn process_cpu_time() -> Option<Duration> {
    None
}
