//! Fixed-step clock and present pacing.
//!
//! Real time is banked in an accumulator and paid out in whole simulation
//! steps, so the world advances by the same `fixed_dt` however fast the
//! window presents.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const FRAME_SAMPLES: usize = 60;
/// Longest real frame that is banked; a stall beyond this is dropped.
const MAX_FRAME_SECS: f64 = 0.25;

/// Rolling mean of recent frame durations.
#[derive(Debug, Clone)]
struct FrameMeter {
    samples: VecDeque<f64>,
    sum: f64,
}

impl FrameMeter {
    fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(FRAME_SAMPLES),
            sum: 0.0,
        }
    }

    fn record(&mut self, secs: f64) {
        if self.samples.len() == FRAME_SAMPLES {
            self.sum -= self.samples.pop_front().unwrap_or(0.0);
        }
        self.samples.push_back(secs);
        self.sum += secs;
    }

    fn mean(&self) -> Option<f64> {
        (!self.samples.is_empty()).then(|| self.sum / self.samples.len() as f64)
    }
}

pub struct TimeState {
    pub fixed_dt: f64,
    accumulator: f64,
    last_instant: Instant,
    pub steps_this_frame: u32,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    meter: FrameMeter,
}

impl TimeState {
    /// Clock paying out `steps_per_second` steps of simulated time.
    pub fn with_rate(steps_per_second: u32) -> Self {
        Self {
            fixed_dt: 1.0 / f64::from(steps_per_second.max(1)),
            accumulator: 0.0,
            last_instant: Instant::now(),
            steps_this_frame: 0,
            fixed_step_count: 0,
            frame_count: 0,
            meter: FrameMeter::new(),
        }
    }

    /// Bank the real time since the previous frame and return how many fixed
    /// steps it buys.
    pub fn begin_frame(&mut self) -> u32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.bank(elapsed)
    }

    fn bank(&mut self, elapsed: f64) -> u32 {
        let elapsed = if elapsed > MAX_FRAME_SECS {
            log::warn!(
                "Frame took {:.1}ms, dropping all but {:.0}ms",
                elapsed * 1000.0,
                MAX_FRAME_SECS * 1000.0
            );
            MAX_FRAME_SECS
        } else {
            elapsed
        };
        self.meter.record(elapsed);
        self.frame_count += 1;

        self.accumulator += elapsed;
        let mut steps = 0;
        while self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            steps += 1;
        }
        self.steps_this_frame = steps;
        self.fixed_step_count += u64::from(steps);
        steps
    }

    pub fn fps(&self) -> f64 {
        match self.meter.mean() {
            Some(mean) if mean > 0.0 => 1.0 / mean,
            _ => 0.0,
        }
    }

    pub fn frame_time_ms(&self) -> f64 {
        self.meter.mean().unwrap_or(0.0) * 1000.0
    }
}

/// Caps presentation to a target frame rate by handing the event loop a
/// deadline instead of sleeping.
pub struct FrameLimiter {
    interval: Duration,
    next_deadline: Instant,
}

impl FrameLimiter {
    pub fn new(target_fps: u32) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / f64::from(target_fps.max(1))),
            next_deadline: Instant::now(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    /// True when a new frame may be presented at `now`. Advances the deadline
    /// when it returns true; a deadline that fell far behind resynchronises to
    /// `now` instead of bursting frames.
    pub fn frame_due(&mut self, now: Instant) -> bool {
        if now < self.next_deadline {
            return false;
        }
        self.next_deadline += self.interval;
        if self.next_deadline < now {
            self.next_deadline = now + self.interval;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_sets_fixed_dt() {
        let time = TimeState::with_rate(100);
        assert!((time.fixed_dt - 0.01).abs() < 1e-12);
        assert!((TimeState::with_rate(0).fixed_dt - 1.0).abs() < 1e-12);
    }

    #[test]
    fn remainder_carries_into_next_frame() {
        let mut time = TimeState::with_rate(100);
        assert_eq!(time.bank(0.035), 3);
        assert_eq!(time.steps_this_frame, 3);
        assert_eq!(time.bank(0.006), 1);
        assert_eq!(time.bank(0.004), 0);
        assert_eq!(time.steps_this_frame, 0);
        assert_eq!(time.fixed_step_count, 4);
        assert_eq!(time.frame_count, 3);
    }

    #[test]
    fn stall_is_capped() {
        let mut time = TimeState::with_rate(100);
        let steps = time.bank(2.0);
        // 0.25 / 0.01 lands on 24 or 25 depending on float rounding.
        assert!((24..=25).contains(&steps));
    }

    #[test]
    fn meter_averages_recent_frames() {
        let mut time = TimeState::with_rate(100);
        assert_eq!(time.fps(), 0.0);
        time.bank(0.010);
        time.bank(0.030);
        assert!((time.frame_time_ms() - 20.0).abs() < 1e-9);
        assert!((time.fps() - 50.0).abs() < 1e-9);
        for _ in 0..FRAME_SAMPLES {
            time.bank(0.004);
        }
        assert!((time.frame_time_ms() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn frame_limiter_spaces_frames_by_interval() {
        let start = Instant::now();
        let mut limiter = FrameLimiter::new(100);
        limiter.next_deadline = start;
        assert!(limiter.frame_due(start));
        assert!(!limiter.frame_due(start + Duration::from_millis(5)));
        assert!(limiter.frame_due(start + Duration::from_millis(10)));
    }

    #[test]
    fn frame_limiter_resyncs_after_stall() {
        let start = Instant::now();
        let mut limiter = FrameLimiter::new(100);
        limiter.next_deadline = start;
        let late = start + Duration::from_secs(1);
        assert!(limiter.frame_due(late));
        assert!(!limiter.frame_due(late + Duration::from_millis(1)));
        assert_eq!(limiter.next_deadline(), late + limiter.interval());
    }
}
