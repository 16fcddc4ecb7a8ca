use glam::DVec2;
use std::time::Duration;

/// Width and height of the playing field, fixed for a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Tuning for one match. The physics is tuned to `tick`, changing it
/// changes how fast everything moves.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    pub bounds: Bounds,

    pub paddle_width: f64,
    pub paddle_height: f64,
    pub paddle_speed: f64, // units per tick
    pub left_paddle_x: f64,
    pub right_paddle_x: f64,

    pub ball_radius: f64,
    pub ball_speed: f64, // units per tick
    /// Top-left corner of the ball on the first serve. Later serves are
    /// recentered exactly.
    pub ball_spawn: DVec2,

    pub tick: Duration,
}

impl MatchConfig {
    /// Vertical start position that centres a paddle in the field.
    pub fn paddle_start_y(&self) -> f64 {
        self.bounds.height / 2.0 - self.paddle_height / 2.0
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        let bounds = Bounds::new(1000.0, 500.0);
        Self {
            bounds,
            paddle_width: 20.0,
            paddle_height: 150.0,
            paddle_speed: 5.0,
            left_paddle_x: 50.0,
            right_paddle_x: 930.0,
            ball_radius: 20.0,
            ball_speed: 5.0,
            ball_spawn: bounds.center() - DVec2::splat(25.0),
            tick: Duration::from_millis(17),
        }
    }
}
