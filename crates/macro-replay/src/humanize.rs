//! Human-like variance for recorded events.
//!
//! A [`Humanizer`] jitters timestamps and pointer positions with Gaussian
//! noise scaled by a level in `[0, 1]`, adds small cumulative delays, and
//! can generate curved pointer paths. Level 0 leaves events untouched.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::event::{EventKind, MacroEvent, MouseButton};
use crate::recording::Recording;

/// Timestamp jitter standard deviation at level 1, in milliseconds.
const TIMING_SIGMA_MS: f64 = 5.0;

/// Position jitter standard deviation at level 1, in pixels.
const POSITION_SIGMA_PX: f64 = 2.0;

/// Micro delay standard deviation at level 1, in milliseconds.
const MICRO_DELAY_SIGMA_MS: f64 = 10.0;

/// Path midpoint jitter standard deviation at level 1, in pixels.
const PATH_SIGMA_PX: f64 = 20.0;

/// Default number of points in a smoothed path.
pub const DEFAULT_PATH_POINTS: usize = 20;

/// Adds human-like variance to events.
#[derive(Debug, Clone)]
pub struct Humanizer {
    level: f64,
    rng: StdRng,
}

impl Humanizer {
    /// Create a humanizer. The level is clamped to `[0, 1]`.
    #[must_use]
    pub fn new(level: f64) -> Self {
        Self {
            level: clamp_level(level),
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Create a humanizer with a fixed seed for reproducible output.
    #[must_use]
    pub fn with_seed(level: f64, seed: u64) -> Self {
        Self {
            level: clamp_level(level),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The effective level.
    #[must_use]
    pub const fn level(&self) -> f64 {
        self.level
    }

    /// Jitter timestamps and pointer positions.
    ///
    /// Positions are jittered for pointer moves and left/right button
    /// events. Returned timestamps are non-negative and non-decreasing.
    pub fn humanize_events(&mut self, events: &[MacroEvent]) -> Vec<MacroEvent> {
        if self.level == 0.0 {
            return events.to_vec();
        }

        let mut floor = 0.0_f64;
        events
            .iter()
            .map(|event| {
                let mut event = *event;
                let jitter = self.gaussian(TIMING_SIGMA_MS * self.level);
                event.timestamp = (event.timestamp + jitter).max(floor);
                floor = event.timestamp;

                if jitters_position(event.kind) {
                    let sigma = POSITION_SIGMA_PX * self.level;
                    event.x = offset(event.x, self.gaussian(sigma));
                    event.y = offset(event.y, self.gaussian(sigma));
                }
                event.humanized = true;
                event
            })
            .collect()
    }

    /// Push every event back by a growing sum of small random delays.
    pub fn add_micro_delays(&mut self, events: &[MacroEvent]) -> Vec<MacroEvent> {
        if self.level == 0.0 {
            return events.to_vec();
        }

        let mut cumulative = 0.0;
        events
            .iter()
            .map(|event| {
                cumulative += self.gaussian(MICRO_DELAY_SIGMA_MS * self.level).abs();
                MacroEvent {
                    timestamp: event.timestamp + cumulative,
                    ..*event
                }
            })
            .collect()
    }

    /// Generate a curved pointer path from `start` to `end`.
    ///
    /// The path is a quadratic Bézier through a randomly displaced
    /// midpoint; the first and last points are exactly `start` and `end`.
    pub fn smooth_path(
        &mut self,
        start: (i32, i32),
        end: (i32, i32),
        points: usize,
    ) -> Vec<(i32, i32)> {
        match points {
            0 => return Vec::new(),
            1 => return vec![start],
            _ => {}
        }

        let (x0, y0) = (f64::from(start.0), f64::from(start.1));
        let (x2, y2) = (f64::from(end.0), f64::from(end.1));
        let sigma = PATH_SIGMA_PX * self.level;
        let mid_x = (x0 + x2) / 2.0 + self.gaussian(sigma);
        let mid_y = (y0 + y2) / 2.0 + self.gaussian(sigma);
        // Control point that makes the curve pass through the midpoint at t = 0.5.
        let cx = 2.0 * mid_x - (x0 + x2) / 2.0;
        let cy = 2.0 * mid_y - (y0 + y2) / 2.0;

        let last = points - 1;
        (0..points)
            .map(|i| {
                if i == 0 {
                    return start;
                }
                if i == last {
                    return end;
                }
                let t = i as f64 / last as f64;
                let u = 1.0 - t;
                let x = u * u * x0 + 2.0 * u * t * cx + t * t * x2;
                let y = u * u * y0 + 2.0 * u * t * cy + t * t * y2;
                (x.round() as i32, y.round() as i32)
            })
            .collect()
    }

    /// Humanize a recording's events into a copy-identity recording.
    #[must_use]
    pub fn humanize_recording(&mut self, recording: &Recording) -> Recording {
        let events = self.humanize_events(recording.events());
        let events = self.add_micro_delays(&events);
        tracing::debug!(
            recording.id = %recording.id,
            level = self.level,
            events = events.len(),
            "Humanized recording"
        );
        recording.with_events(events)
    }

    /// Sample N(0, sigma) with the Box-Muller transform.
    fn gaussian(&mut self, sigma: f64) -> f64 {
        if sigma <= 0.0 {
            return 0.0;
        }
        let u1: f64 = 1.0 - self.rng.random::<f64>();
        let u2: f64 = self.rng.random();
        sigma * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

impl Default for Humanizer {
    fn default() -> Self {
        Self::new(0.5)
    }
}

/// Humanize a recording at its own humanization level.
#[must_use]
pub fn humanize_recording(recording: &Recording) -> Recording {
    Humanizer::new(recording.humanization_level).humanize_recording(recording)
}

fn clamp_level(level: f64) -> f64 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

const fn jitters_position(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::PointerMove
            | EventKind::ButtonDown(MouseButton::Left | MouseButton::Right)
            | EventKind::ButtonUp(MouseButton::Left | MouseButton::Right)
    )
}

fn offset(value: i32, delta: f64) -> i32 {
    (f64::from(value) + delta).round() as i32
}
