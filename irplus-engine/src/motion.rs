//! Mouse acceleration while a direction button is held.

use crate::action::Direction;

/// Acceleration parameters for held mouse moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampConfig {
    /// Speed of the first step after a stop or direction change
    pub initial_speed: i32,
    /// Added per repeat while held
    pub acceleration: i32,
    /// Upper bound on speed
    pub max_speed: i32,
    /// A gap longer than this counts as a stop
    pub stop_threshold_ms: u64,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            initial_speed: 5,
            acceleration: 3,
            max_speed: 40,
            stop_threshold_ms: 250,
        }
    }
}

/// Current pointer speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseMotionRamp {
    speed: i32,
}

impl MouseMotionRamp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    pub fn reset(&mut self) {
        self.speed = 0;
    }

    /// Advance one step in `direction` and return the `(dx, dy)` displacement.
    ///
    /// `continuing_after_ms` is the time since the previous action when that
    /// action was a move in the same direction, `None` otherwise.
    pub fn step(
        &mut self,
        direction: Direction,
        continuing_after_ms: Option<u64>,
        config: &RampConfig,
    ) -> (i32, i32) {
        self.speed = match continuing_after_ms {
            Some(elapsed) if elapsed <= config.stop_threshold_ms => self
                .speed
                .saturating_add(config.acceleration)
                .min(config.max_speed),
            _ => config.initial_speed,
        };
        let (ux, uy) = direction.unit();
        (ux * self.speed, uy * self.speed)
    }
}
