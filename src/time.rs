//! Fixed-timestep game clock using an accumulator pattern, plus the wall clock
//! it is fed from.
//!
//! The driver polls at whatever rate it likes; `GameTime` converts wall time
//! into a whole number of ticks at the configured cadence and carries the
//! remainder, so a slow or jittery poll loop never loses time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of wall-clock time in milliseconds since the Unix epoch.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// The real clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}

#[cfg(target_arch = "wasm32")]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
pub struct GameTime {
    /// Milliseconds per tick (e.g. 100ms = 10 ticks/sec)
    ms_per_tick: f64,
    /// Accumulated milliseconds not yet consumed as ticks
    accumulator: f64,
    /// Largest wall-time step accepted by one update
    max_step_ms: u64,
    /// Total elapsed ticks since creation
    pub total_ticks: u64,
    /// Timestamp of the last update (ms), None before the first one
    last_timestamp: Option<u64>,
}

impl GameTime {
    /// `ticks_per_sec` of 0 is treated as 1.
    pub fn new(ticks_per_sec: u32) -> Self {
        Self {
            ms_per_tick: 1000.0 / ticks_per_sec.max(1) as f64,
            accumulator: 0.0,
            max_step_ms: u64::MAX,
            total_ticks: 0,
            last_timestamp: None,
        }
    }

    /// Cap the wall time a single update may consume.
    pub fn with_max_step(mut self, max_step_ms: u64) -> Self {
        self.max_step_ms = max_step_ms;
        self
    }

    pub fn seconds_per_tick(&self) -> f64 {
        self.ms_per_tick / 1000.0
    }

    /// Feed a wall-clock timestamp and get the number of ticks to process.
    ///
    /// The first call only records the timestamp. A clock that moved
    /// backwards yields no ticks.
    pub fn update(&mut self, now_ms: u64) -> u32 {
        let delta = match self.last_timestamp {
            Some(prev) => now_ms.saturating_sub(prev).min(self.max_step_ms),
            None => 0,
        };
        self.last_timestamp = Some(now_ms);

        self.accumulator += delta as f64;
        let ticks = (self.accumulator / self.ms_per_tick) as u32;
        self.accumulator -= ticks as f64 * self.ms_per_tick;
        self.total_ticks += ticks as u64;
        ticks
    }

    /// Forget the last timestamp; the next update starts a fresh interval.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_timestamp = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_returns_zero_ticks() {
        let mut gt = GameTime::new(10);
        assert_eq!(gt.update(5_000), 0);
    }

    #[test]
    fn one_tick_at_100ms() {
        let mut gt = GameTime::new(10);
        gt.update(0);
        assert_eq!(gt.update(100), 1);
        assert_eq!(gt.total_ticks, 1);
    }

    #[test]
    fn multiple_ticks_accumulated() {
        let mut gt = GameTime::new(10);
        gt.update(0);
        assert_eq!(gt.update(350), 3); // 50ms remainder
        assert_eq!(gt.total_ticks, 3);
    }

    #[test]
    fn remainder_carried_over() {
        let mut gt = GameTime::new(10);
        gt.update(0);
        gt.update(150);
        assert_eq!(gt.total_ticks, 1);
        assert_eq!(gt.update(200), 1); // 50ms delta + 50ms carried
        assert_eq!(gt.total_ticks, 2);
    }

    #[test]
    fn clamp_large_delta() {
        let mut gt = GameTime::new(10).with_max_step(500);
        gt.update(0);
        assert_eq!(gt.update(10_000), 5);
    }

    #[test]
    fn unclamped_by_default() {
        let mut gt = GameTime::new(1);
        gt.update(0);
        assert_eq!(gt.update(3_600_000), 3_600);
    }

    #[test]
    fn backwards_clock_yields_nothing() {
        let mut gt = GameTime::new(10);
        gt.update(1_000);
        assert_eq!(gt.update(500), 0);
        assert_eq!(gt.update(600), 1);
    }

    #[test]
    fn sub_tick_frames_accumulate() {
        let mut gt = GameTime::new(10);
        gt.update(0);
        for t in [16, 32, 48, 64, 80, 96] {
            assert_eq!(gt.update(t), 0);
        }
        assert_eq!(gt.update(112), 1); // 12ms remainder
        assert_eq!(gt.total_ticks, 1);
    }

    #[test]
    fn steady_60fps() {
        let mut gt = GameTime::new(10);
        gt.update(0);
        let total: u32 = (1..=60).map(|i| gt.update(i * 16_667 / 1000)).sum();
        assert!((9..=11).contains(&total), "expected ~10 ticks, got {}", total);
    }

    #[test]
    fn reset_drops_pending_time() {
        let mut gt = GameTime::new(10);
        gt.update(0);
        gt.update(90);
        gt.reset();
        assert_eq!(gt.update(1_000), 0);
        assert_eq!(gt.update(1_010), 0);
    }

    #[test]
    fn seconds_per_tick_matches_rate() {
        assert!((GameTime::new(10).seconds_per_tick() - 0.1).abs() < 1e-12);
        assert!((GameTime::new(1).seconds_per_tick() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(100);
        let other = clock.clone();
        clock.advance(50);
        assert_eq!(other.now_ms(), 150);
        other.set(7);
        assert_eq!(clock.now_ms(), 7);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_ticks_never_exceed_elapsed(
            rate in 1u32..60,
            steps in proptest::collection::vec(0u64..5_000, 1..50),
        ) {
            let mut gt = GameTime::new(rate);
            let mut now = 0u64;
            gt.update(now);
            for s in steps {
                now += s;
                gt.update(now);
            }
            let ticked_ms = gt.total_ticks as f64 * 1000.0 / rate as f64;
            prop_assert!(ticked_ms <= now as f64 + 1e-6);
            prop_assert!(now as f64 - ticked_ms < 1000.0 / rate as f64 + 1e-6);
        }
    }
}
