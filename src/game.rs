use crate::config::{Bounds, MatchConfig};
use crate::entity::{Ball, Direction, Paddle, ScoreSignal, Side};
use glam::DVec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// The four logical keys, two per paddle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    LeftUp,
    LeftDown,
    RightUp,
    RightDown,
}

impl Control {
    pub fn side(&self) -> Side {
        match self {
            Control::LeftUp | Control::LeftDown => Side::Left,
            Control::RightUp | Control::RightDown => Side::Right,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Control::LeftUp | Control::RightUp => Direction::Up,
            Control::LeftDown | Control::RightDown => Direction::Down,
        }
    }
}

/// Held-key state for one paddle.
///
/// The most recent press wins. A release only clears the direction if it
/// belongs to the key that set it, so letting go of a stale key after
/// switching does not stop the paddle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    direction: Direction,
}

impl InputState {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn press(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn release(&mut self, direction: Direction) {
        if self.direction == direction {
            self.direction = Direction::Still;
        }
    }
}

/// Everything a render sink needs, copied out of a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub bounds: Bounds,
    pub left: Paddle,
    pub right: Paddle,
    pub ball_center: DVec2,
    pub ball_radius: f64,
    pub left_score: u32,
    pub right_score: u32,
}

impl Snapshot {
    /// Side with the strictly higher score.
    pub fn leader(&self) -> Option<Side> {
        if self.left_score > self.right_score {
            Some(Side::Left)
        } else if self.right_score > self.left_score {
            Some(Side::Right)
        } else {
            None
        }
    }
}

/// One match: two paddles, one ball, two scores.
pub struct Match {
    pub bounds: Bounds,
    pub left: Paddle,
    pub right: Paddle,
    pub ball: Ball,
    pub left_score: u32,
    pub right_score: u32,
    left_input: InputState,
    right_input: InputState,
    running: bool,
    rng: StdRng,
}

impl Match {
    pub fn new(config: &MatchConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &MatchConfig, mut rng: StdRng) -> Self {
        let y = config.paddle_start_y();
        let left = Paddle::new(
            config.left_paddle_x,
            y,
            config.paddle_width,
            config.paddle_height,
            config.paddle_speed,
        );
        let right = Paddle::new(
            config.right_paddle_x,
            y,
            config.paddle_width,
            config.paddle_height,
            config.paddle_speed,
        );
        let ball = Ball::new(
            config.ball_spawn,
            config.ball_radius,
            config.ball_speed,
            &mut rng,
        );

        Self {
            bounds: config.bounds,
            left,
            right,
            ball,
            left_score: 0,
            right_score: 0,
            left_input: InputState::default(),
            right_input: InputState::default(),
            running: true,
            rng,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Freeze the match. Later calls to `advance` do nothing.
    pub fn halt(&mut self) {
        self.running = false;
    }

    pub fn input(&self, side: Side) -> Direction {
        match side {
            Side::Left => self.left_input.direction(),
            Side::Right => self.right_input.direction(),
        }
    }

    fn input_mut(&mut self, side: Side) -> &mut InputState {
        match side {
            Side::Left => &mut self.left_input,
            Side::Right => &mut self.right_input,
        }
    }

    pub fn on_press(&mut self, control: Control) {
        self.input_mut(control.side()).press(control.direction());
    }

    pub fn on_release(&mut self, control: Control) {
        self.input_mut(control.side()).release(control.direction());
    }

    /// Run one tick.
    pub fn advance(&mut self) -> ScoreSignal {
        if !self.running {
            return ScoreSignal::None;
        }

        let signal = self.ball.advance(self.bounds, &self.left, &self.right);
        if let Some(scorer) = signal.scorer() {
            match scorer {
                Side::Left => self.left_score += 1,
                Side::Right => self.right_score += 1,
            }
            tracing::debug!(
                ?scorer,
                left = self.left_score,
                right = self.right_score,
                "point scored"
            );
            self.ball.reset(self.bounds, &mut self.rng);
        }

        self.left.advance(self.left_input.direction(), self.bounds.height);
        self.right.advance(self.right_input.direction(), self.bounds.height);

        signal
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bounds: self.bounds,
            left: self.left,
            right: self.right,
            ball_center: self.ball.center(),
            ball_radius: self.ball.radius,
            left_score: self.left_score,
            right_score: self.right_score,
        }
    }
}
