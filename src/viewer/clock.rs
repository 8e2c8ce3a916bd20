use std::time::Instant;

/// Frame cadence bookkeeping for the host render loop.
pub struct FrameClock {
    last_frame: Option<Instant>,
    window_start: Instant,
    frames: u32,
    pub frame_dt: f32,
    pub fps: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_frame: None,
            window_start: Instant::now(),
            frames: 0,
            frame_dt: 1.0 / 60.0,
            fps: 0.0,
        }
    }

    /// Returns the delta since the previous frame. The fps readout is
    /// refreshed every half second.
    pub fn begin_frame(&mut self, now: Instant) -> f32 {
        let dt = match self.last_frame {
            Some(previous) => now.saturating_duration_since(previous).as_secs_f32(),
            None => 1.0 / 60.0,
        };
        self.last_frame = Some(now);
        self.frame_dt = dt.max(0.0);

        self.frames = self.frames.saturating_add(1);
        let window = now.saturating_duration_since(self.window_start).as_secs_f32();
        if window >= 0.5 {
            self.fps = self.frames as f32 / window;
            self.frames = 0;
            self.window_start = now;
        }
        self.frame_dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// The simulation clock shown in the control panel. Display-only: motion
/// integrates wall-clock time, so pausing or scaling this clock changes
/// the readout, not the animation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    pub running: bool,
    pub time_scale: f32,
    pub current_time: f32,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            running: true,
            time_scale: 1.0,
            current_time: 0.0,
        }
    }
}

impl SimClock {
    pub fn advance(&mut self, delta: f32) {
        if self.running {
            self.current_time += delta * self.time_scale;
        }
    }

    pub fn reset(&mut self) {
        self.current_time = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn frame_clock_measures_delta() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.begin_frame(start);
        let dt = clock.begin_frame(start + Duration::from_millis(20));
        assert!((dt - 0.02).abs() < 1e-3);
    }

    #[test]
    fn sim_clock_scales_and_pauses() {
        let mut sim = SimClock::default();
        sim.time_scale = 2.0;
        sim.advance(0.5);
        assert!((sim.current_time - 1.0).abs() < 1e-6);
        sim.running = false;
        sim.advance(0.5);
        assert!((sim.current_time - 1.0).abs() < 1e-6);
        sim.reset();
        assert_eq!(sim.current_time, 0.0);
    }
}
