//! Variable-timestep frame loop with an Idle → Running → Disposed lifecycle.
//!
//! Each tick measures the wall-clock delta since the previous tick and runs
//! the update and the render in that order. Deltas are never shortened, so
//! the accumulated time always equals the wall time since `start`.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

/// Frames slower than this are reported, in seconds.
pub const SLOW_FRAME_TIME: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Disposed,
}

/// Periodic frame-rate reporting.
struct FrameStats {
    interval: Duration,
    window_start: Instant,
    frames: u32,
}

impl FrameStats {
    fn record(&mut self, now: Instant) {
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start);
        if elapsed >= self.interval {
            let secs = elapsed.as_secs_f32();
            info!(
                fps = self.frames as f32 / secs,
                frame_ms = secs * 1000.0 / self.frames as f32,
                "frame stats"
            );
            self.frames = 0;
            self.window_start = now;
        }
    }
}

pub struct FrameLoop {
    state: LoopState,
    previous: Option<Instant>,
    frame_count: u64,
    elapsed: f64,
    stats: Option<FrameStats>,
}

impl FrameLoop {
    /// `stats_interval_secs` of 0 disables frame stats.
    pub fn new(stats_interval_secs: u32) -> Self {
        let stats = (stats_interval_secs > 0).then(|| FrameStats {
            interval: Duration::from_secs(u64::from(stats_interval_secs)),
            window_start: Instant::now(),
            frames: 0,
        });
        Self {
            state: LoopState::Idle,
            previous: None,
            frame_count: 0,
            elapsed: 0.0,
            stats,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Idle → Running. Returns false and leaves the state alone otherwise.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.state != LoopState::Idle {
            warn!(state = ?self.state, "frame loop start ignored");
            return false;
        }
        self.state = LoopState::Running;
        self.previous = Some(now);
        if let Some(stats) = &mut self.stats {
            stats.window_start = now;
        }
        debug!("frame loop started");
        true
    }

    pub fn dispose(&mut self) {
        if self.state != LoopState::Disposed {
            debug!(frames = self.frame_count, "frame loop disposed");
        }
        self.state = LoopState::Disposed;
        self.previous = None;
    }

    /// Run one frame at `now`: `update(state, delta)` then `render(state)`.
    ///
    /// Does nothing unless the loop is running. Returns the delta used.
    pub fn tick<S>(
        &mut self,
        now: Instant,
        state: &mut S,
        update: impl FnOnce(&mut S, f32),
        render: impl FnOnce(&mut S),
    ) -> Option<f32> {
        if self.state != LoopState::Running {
            return None;
        }
        let previous = self.previous.replace(now).unwrap_or(now);
        let delta = now.saturating_duration_since(previous).as_secs_f32();
        if delta > SLOW_FRAME_TIME {
            warn!("Slow frame: {:.1}ms since the previous tick", delta * 1000.0);
        }

        update(state, delta);
        render(state);

        self.frame_count += 1;
        self.elapsed += f64::from(delta);
        if let Some(stats) = &mut self.stats {
            stats.record(now);
        }
        Some(delta)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Sum of the deltas so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    fn tick(frame_loop: &mut FrameLoop, now: Instant, rec: &mut Recorder) -> Option<f32> {
        frame_loop.tick(
            now,
            rec,
            |r, dt| r.calls.push(format!("update {dt:.3}")),
            |r| r.calls.push("render".to_string()),
        )
    }

    #[test]
    fn test_idle_loop_does_not_tick() {
        let mut frame_loop = FrameLoop::new(0);
        let mut rec = Recorder::default();
        assert_eq!(tick(&mut frame_loop, Instant::now(), &mut rec), None);
        assert!(rec.calls.is_empty());
        assert_eq!(frame_loop.state(), LoopState::Idle);
    }

    #[test]
    fn test_update_runs_before_render() {
        let t0 = Instant::now();
        let mut frame_loop = FrameLoop::new(0);
        assert!(frame_loop.start(t0));
        let mut rec = Recorder::default();
        let dt = tick(&mut frame_loop, t0 + Duration::from_millis(16), &mut rec);
        assert!((dt.unwrap() - 0.016).abs() < 1e-6);
        assert_eq!(rec.calls, vec!["update 0.016".to_string(), "render".to_string()]);
        assert_eq!(frame_loop.frame_count(), 1);
    }

    #[test]
    fn test_slow_frames_keep_full_delta() {
        let t0 = Instant::now();
        let mut frame_loop = FrameLoop::new(0);
        frame_loop.start(t0);
        let mut rec = Recorder::default();
        let dt = tick(&mut frame_loop, t0 + Duration::from_secs(3), &mut rec);
        assert_eq!(dt, Some(3.0));
        assert!((frame_loop.elapsed() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_accumulated_delta_matches_wall_time_at_low_frame_rate() {
        let t0 = Instant::now();
        let mut frame_loop = FrameLoop::new(0);
        frame_loop.start(t0);
        let mut rec = Recorder::default();
        for i in 1..=20 {
            tick(&mut frame_loop, t0 + Duration::from_millis(500 * i), &mut rec);
        }
        assert!(
            (frame_loop.elapsed() - 10.0).abs() < 1e-4,
            "accumulated {} s over 10 s of wall time",
            frame_loop.elapsed()
        );
    }

    #[test]
    fn test_start_only_from_idle() {
        let t0 = Instant::now();
        let mut frame_loop = FrameLoop::new(0);
        assert!(frame_loop.start(t0));
        assert!(!frame_loop.start(t0), "second start must be rejected");

        frame_loop.dispose();
        assert!(!frame_loop.start(t0), "disposed loop must not restart");
        assert_eq!(frame_loop.state(), LoopState::Disposed);
    }

    #[test]
    fn test_dispose_from_any_state() {
        let mut idle = FrameLoop::new(0);
        idle.dispose();
        assert_eq!(idle.state(), LoopState::Disposed);

        let t0 = Instant::now();
        let mut running = FrameLoop::new(0);
        running.start(t0);
        running.dispose();
        let mut rec = Recorder::default();
        assert_eq!(tick(&mut running, t0 + Duration::from_millis(10), &mut rec), None);
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_deltas_sum_to_wall_time() {
        let t0 = Instant::now();
        let mut frame_loop = FrameLoop::new(1);
        frame_loop.start(t0);
        let mut rec = Recorder::default();
        for i in 1..=10 {
            tick(&mut frame_loop, t0 + Duration::from_millis(20 * i), &mut rec);
        }
        assert_eq!(frame_loop.frame_count(), 10);
        assert!((frame_loop.elapsed() - 0.2).abs() < 1e-4);
    }
}
