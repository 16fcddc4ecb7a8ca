use crate::config::Bounds;
use glam::DVec2;
use rand::Rng;

/// Steering input for a paddle. `Up` moves toward the top of the field,
/// which is the direction of decreasing y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Up,
    #[default]
    Still,
    Down,
}

impl Direction {
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Still => 0.0,
            Direction::Down => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// What the ball reports after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSignal {
    None,
    LeftExit,
    RightExit,
}

impl ScoreSignal {
    /// The side that scores from this signal, if any.
    pub fn scorer(&self) -> Option<Side> {
        match self {
            ScoreSignal::None => None,
            ScoreSignal::LeftExit => Some(Side::Right),
            ScoreSignal::RightExit => Some(Side::Left),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paddle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub speed: f64,
}

impl Paddle {
    pub fn new(x: f64, y: f64, width: f64, height: f64, speed: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            speed,
        }
    }

    pub fn advance(&mut self, direction: Direction, bounds_height: f64) {
        self.y -= direction.sign() * self.speed;
        self.y = self.y.max(0.0).min(bounds_height - self.height);
    }

    /// True when `point` is inside the rectangle. Points on an edge are outside.
    pub fn contains_strictly(&self, point: DVec2) -> bool {
        point.x > self.x
            && point.x < self.x + self.width
            && point.y > self.y
            && point.y < self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    /// Top-left corner of the bounding box.
    pub position: DVec2,
    pub radius: f64,
    pub velocity: DVec2,
    speed: f64,
    center: DVec2,
}

impl Ball {
    /// Ball at `position` heading in a random direction at `speed`.
    pub fn new<R: Rng + ?Sized>(position: DVec2, radius: f64, speed: f64, rng: &mut R) -> Self {
        let velocity = random_unit(|| rng.gen_range(-1.0..1.0)) * speed;
        Self::with_velocity(position, radius, speed, velocity)
    }

    pub fn with_velocity(position: DVec2, radius: f64, speed: f64, velocity: DVec2) -> Self {
        Self {
            position,
            radius,
            velocity,
            speed,
            center: position + DVec2::splat(radius),
        }
    }

    /// The speed the ball was served with. Hits scale the velocity, never this.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn center(&self) -> DVec2 {
        self.center
    }

    pub fn diameter(&self) -> f64 {
        self.radius * 2.0
    }

    /// Per-hit velocity multiplier.
    pub fn amplification(&self) -> f64 {
        1.0 + self.speed / 15.0
    }

    pub fn advance(&mut self, bounds: Bounds, left: &Paddle, right: &Paddle) -> ScoreSignal {
        let diameter = self.diameter();

        self.position += self.velocity;

        // Top and bottom walls
        if self.position.y < 0.0 {
            self.position.y = 0.0;
            self.velocity.y = -self.velocity.y;
        }
        if self.position.y + diameter > bounds.height {
            self.position.y = bounds.height - diameter;
            self.velocity.y = -self.velocity.y;
        }

        // Single-corner tests, not swept: a fast ball can pass through a
        // paddle and edge contact is a miss.
        let bottom = self.position.y + diameter;
        if right.contains_strictly(DVec2::new(self.position.x + diameter, bottom)) {
            self.position.x = right.x - diameter;
            self.bounce();
        }
        if left.contains_strictly(DVec2::new(self.position.x, bottom)) {
            self.position.x = left.x + left.width;
            self.bounce();
        }

        if self.position.x < 0.0 {
            return ScoreSignal::LeftExit;
        }
        if self.position.x + diameter > bounds.width {
            return ScoreSignal::RightExit;
        }

        self.center = self.position + DVec2::splat(self.radius);
        ScoreSignal::None
    }

    fn bounce(&mut self) {
        let factor = self.amplification();
        self.velocity.x *= -factor;
        self.velocity.y *= factor;
    }

    /// Serve again from the middle of the field at the original speed.
    pub fn reset<R: Rng + ?Sized>(&mut self, bounds: Bounds, rng: &mut R) {
        self.position = bounds.center() - DVec2::splat(self.radius);
        self.center = self.position + DVec2::splat(self.radius);
        self.velocity = random_unit(|| rng.gen_range(-1.0..1.0)) * self.speed;
    }
}

/// Normalizes a pair drawn from `sample`, drawing again while the pair is
/// too short to normalize.
fn random_unit(mut sample: impl FnMut() -> f64) -> DVec2 {
    loop {
        let v = DVec2::new(sample(), sample());
        let length = v.length();
        if length > f64::EPSILON {
            return v / length;
        }
        tracing::warn!(x = v.x, y = v.y, "degenerate serve direction, resampling");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EPS: f64 = 1e-9;

    fn field() -> Bounds {
        Bounds::new(1000.0, 500.0)
    }

    fn paddles() -> (Paddle, Paddle) {
        (
            Paddle::new(50.0, 175.0, 20.0, 150.0, 5.0),
            Paddle::new(930.0, 175.0, 20.0, 150.0, 5.0),
        )
    }

    #[test]
    fn test_paddle_up_decreases_y() {
        let mut paddle = Paddle::new(50.0, 175.0, 20.0, 150.0, 5.0);
        paddle.advance(Direction::Up, 500.0);
        assert_eq!(paddle.y, 170.0);
        paddle.advance(Direction::Down, 500.0);
        paddle.advance(Direction::Down, 500.0);
        assert_eq!(paddle.y, 180.0);
    }

    #[test]
    fn test_paddle_clamps_at_both_edges() {
        let mut paddle = Paddle::new(50.0, 2.0, 20.0, 150.0, 5.0);
        paddle.advance(Direction::Up, 500.0);
        assert_eq!(paddle.y, 0.0);

        paddle.y = 348.0;
        paddle.advance(Direction::Down, 500.0);
        assert_eq!(paddle.y, 350.0);
    }

    #[test]
    fn test_paddle_still_is_idempotent() {
        let mut paddle = Paddle::new(50.0, 123.5, 20.0, 150.0, 5.0);
        for _ in 0..10 {
            paddle.advance(Direction::Still, 500.0);
        }
        assert_eq!(paddle.y, 123.5);
    }

    #[test]
    fn test_contains_strictly_excludes_edges() {
        let paddle = Paddle::new(930.0, 175.0, 20.0, 150.0, 5.0);
        assert!(paddle.contains_strictly(DVec2::new(940.0, 200.0)));
        assert!(!paddle.contains_strictly(DVec2::new(930.0, 200.0)));
        assert!(!paddle.contains_strictly(DVec2::new(950.0, 200.0)));
        assert!(!paddle.contains_strictly(DVec2::new(940.0, 175.0)));
        assert!(!paddle.contains_strictly(DVec2::new(940.0, 325.0)));
    }

    #[test]
    fn test_free_flight_moves_by_velocity() {
        let (left, right) = paddles();
        let mut ball =
            Ball::with_velocity(DVec2::new(500.0, 240.0), 20.0, 5.0, DVec2::new(5.0, 0.0));

        let signal = ball.advance(field(), &left, &right);

        assert_eq!(signal, ScoreSignal::None);
        assert_eq!(ball.position, DVec2::new(505.0, 240.0));
        assert_eq!(ball.center(), DVec2::new(525.0, 260.0));
    }

    #[test]
    fn test_right_edge_past_field_is_right_exit() {
        let (left, right) = paddles();
        let mut ball =
            Ball::with_velocity(DVec2::new(965.0, 240.0), 20.0, 5.0, DVec2::new(5.0, 0.0));

        assert_eq!(ball.advance(field(), &left, &right), ScoreSignal::RightExit);
        assert_eq!(ball.position, DVec2::new(970.0, 240.0));
    }

    #[test]
    fn test_left_edge_past_zero_is_left_exit() {
        let (left, right) = paddles();
        let mut ball =
            Ball::with_velocity(DVec2::new(2.0, 20.0), 20.0, 5.0, DVec2::new(-5.0, 0.0));

        assert_eq!(ball.advance(field(), &left, &right), ScoreSignal::LeftExit);
    }

    #[test]
    fn test_right_paddle_hit_flips_and_amplifies() {
        let (left, right) = paddles();
        let mut ball =
            Ball::with_velocity(DVec2::new(905.0, 200.0), 20.0, 5.0, DVec2::new(3.0, 4.0));

        let signal = ball.advance(field(), &left, &right);

        assert_eq!(signal, ScoreSignal::None);
        assert_eq!(ball.position.x, 890.0);
        let factor = 1.0 + 5.0 / 15.0;
        assert!((ball.velocity.x - (-3.0 * factor)).abs() < EPS);
        assert!((ball.velocity.y - 4.0 * factor).abs() < EPS);
    }

    #[test]
    fn test_left_paddle_hit_moves_ball_flush() {
        let (left, right) = paddles();
        let mut ball =
            Ball::with_velocity(DVec2::new(70.0, 200.0), 20.0, 5.0, DVec2::new(-5.0, 0.0));

        ball.advance(field(), &left, &right);

        assert_eq!(ball.position.x, 70.0);
        assert!(ball.velocity.x > 0.0);
        assert!((ball.velocity.length() - 5.0 * ball.amplification()).abs() < EPS);
    }

    #[test]
    fn test_exact_contact_is_a_miss() {
        let (left, right) = paddles();
        // Right edge lands exactly on the paddle's far edge.
        let mut ball =
            Ball::with_velocity(DVec2::new(905.0, 200.0), 20.0, 5.0, DVec2::new(5.0, 0.0));

        ball.advance(field(), &left, &right);

        assert_eq!(ball.position.x, 910.0);
        assert_eq!(ball.velocity, DVec2::new(5.0, 0.0));
    }

    #[test]
    fn test_fast_ball_tunnels_through_paddle() {
        let (left, right) = paddles();
        let mut ball =
            Ball::with_velocity(DVec2::new(880.0, 200.0), 20.0, 5.0, DVec2::new(90.0, 0.0));

        assert_eq!(ball.advance(field(), &left, &right), ScoreSignal::RightExit);
    }

    #[test]
    fn test_walls_reflect_and_clamp() {
        let (left, right) = paddles();
        let mut ball =
            Ball::with_velocity(DVec2::new(500.0, 2.0), 20.0, 5.0, DVec2::new(0.0, -5.0));
        ball.advance(field(), &left, &right);
        assert_eq!(ball.position.y, 0.0);
        assert_eq!(ball.velocity.y, 5.0);

        let mut ball =
            Ball::with_velocity(DVec2::new(500.0, 458.0), 20.0, 5.0, DVec2::new(0.0, 5.0));
        ball.advance(field(), &left, &right);
        assert_eq!(ball.position.y, 460.0);
        assert_eq!(ball.velocity.y, -5.0);
    }

    #[test]
    fn test_reset_recenters_at_original_speed() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut ball =
            Ball::with_velocity(DVec2::new(970.0, 240.0), 20.0, 5.0, DVec2::new(40.0, 3.0));

        ball.reset(field(), &mut rng);

        assert_eq!(ball.position, DVec2::new(480.0, 230.0));
        assert_eq!(ball.center(), DVec2::new(500.0, 250.0));
        assert!((ball.velocity.length() - 5.0).abs() < EPS);
    }

    #[test]
    fn test_random_unit_resamples_zero_vector() {
        let mut samples = [0.0, 0.0, 0.0, 0.0, 0.6, 0.8].into_iter();
        let v = random_unit(|| samples.next().unwrap_or(1.0));

        assert!((v - DVec2::new(0.6, 0.8)).length() < EPS);
        assert_eq!(samples.next(), None);
    }

    #[test]
    fn test_score_signal_scorer() {
        assert_eq!(ScoreSignal::LeftExit.scorer(), Some(Side::Right));
        assert_eq!(ScoreSignal::RightExit.scorer(), Some(Side::Left));
        assert_eq!(ScoreSignal::None.scorer(), None);
        assert_eq!(Side::Left.opposite(), Side::Right);
    }
}
