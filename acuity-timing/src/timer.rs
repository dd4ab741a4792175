use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic presentation clock.
///
/// Every timestamp in the experiment pipeline is nanoseconds on this clock,
/// so schedulers generic over `Timer` can run against a virtual clock in
/// tests without touching the trial logic.
pub trait Timer: Clone + Send + Sync {
    fn now_ns(&self) -> u64;
    fn elapsed(&self, since_ns: u64) -> Duration;
    fn sleep(&self, d: Duration);
}

/// Wall-clock timer for real sessions.
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    start: Instant,
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    #[cfg(target_os = "linux")]
    fn precise_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn precise_sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for HighPrecisionTimer {
    fn now_ns(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn elapsed(&self, since_ns: u64) -> Duration {
        Duration::from_nanos(self.now_ns().saturating_sub(since_ns))
    }

    fn sleep(&self, d: Duration) {
        self.precise_sleep(d);
    }
}

/// Test clock: `sleep` advances the clock instantly, so a full session runs
/// in microseconds while keeping timestamp arithmetic realistic.
#[derive(Debug, Clone, Default)]
pub struct VirtualTimer {
    now_ns: Arc<AtomicU64>,
}

impl VirtualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        self.now_ns.fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Timer for VirtualTimer {
    fn now_ns(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }

    fn elapsed(&self, since_ns: u64) -> Duration {
        Duration::from_nanos(self.now_ns().saturating_sub(since_ns))
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}
