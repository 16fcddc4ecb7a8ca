use crate::entity::Side;
use crate::game::{Control, Snapshot};
use crate::renderer::{Input, Renderer};
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor},
    terminal::{self, ClearType},
};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::time::{Duration, Instant};

// Lines reserved under the field for the score and help text
const INFO_LINES: u16 = 3;

// Without release events a key counts as released once the terminal stops
// repeating it. The first repeat arrives after the OS repeat delay, later
// ones much faster.
const FIRST_REPEAT_TIMEOUT: Duration = Duration::from_millis(550);
const REPEAT_TIMEOUT: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Net,
    Paddle,
    LeadingPaddle,
    Ball,
}

/// Rasterize the field onto a `cols` x `rows` grid, sampling each cell at
/// its centre.
pub fn rasterize(snapshot: &Snapshot, cols: usize, rows: usize) -> Vec<Vec<Cell>> {
    let mut grid = vec![vec![Cell::Empty; cols]; rows];
    if cols == 0 || rows == 0 {
        return grid;
    }

    let sx = snapshot.bounds.width / cols as f64;
    let sy = snapshot.bounds.height / rows as f64;
    let net_col = ((snapshot.bounds.width / 2.0) / sx) as usize;
    let leader = snapshot.leader();

    for (row, line) in grid.iter_mut().enumerate() {
        for (col, cell) in line.iter_mut().enumerate() {
            let x = (col as f64 + 0.5) * sx;
            let y = (row as f64 + 0.5) * sy;

            let dx = x - snapshot.ball_center.x;
            let dy = y - snapshot.ball_center.y;
            if dx * dx + dy * dy <= snapshot.ball_radius * snapshot.ball_radius {
                *cell = Cell::Ball;
                continue;
            }

            let paddle = [(Side::Left, &snapshot.left), (Side::Right, &snapshot.right)]
                .into_iter()
                .find(|(_, p)| x >= p.x && x <= p.x + p.width && y >= p.y && y <= p.y + p.height);
            if let Some((side, _)) = paddle {
                *cell = if leader == Some(side) {
                    Cell::LeadingPaddle
                } else {
                    Cell::Paddle
                };
                continue;
            }

            if col == net_col {
                *cell = Cell::Net;
            }
        }
    }

    // Small grids can miss the ball between sample points.
    let bx = (snapshot.ball_center.x / sx) as usize;
    let by = (snapshot.ball_center.y / sy) as usize;
    if by < rows && bx < cols {
        grid[by][bx] = Cell::Ball;
    }

    grid
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Control(Control),
    Quit,
    Restart,
}

/// Map a terminal key to what it does in the game.
pub fn map_key(key: KeyEvent) -> Option<KeyAction> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(KeyAction::Quit);
    }

    match key.code {
        KeyCode::Char('w') | KeyCode::Char('W') => Some(KeyAction::Control(Control::LeftUp)),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(KeyAction::Control(Control::LeftDown)),
        KeyCode::Up => Some(KeyAction::Control(Control::RightUp)),
        KeyCode::Down => Some(KeyAction::Control(Control::RightDown)),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(KeyAction::Quit),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(KeyAction::Restart),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct Hold {
    control: Control,
    last_seen: Instant,
    repeating: bool,
}

impl Hold {
    fn expired(&self, now: Instant) -> bool {
        let timeout = if self.repeating {
            REPEAT_TIMEOUT
        } else {
            FIRST_REPEAT_TIMEOUT
        };
        now.duration_since(self.last_seen) > timeout
    }
}

/// Turns key presses into press/release pairs on terminals that only
/// report presses.
#[derive(Debug, Default)]
struct HoldTracker {
    holds: Vec<Hold>,
}

impl HoldTracker {
    fn pressed(&mut self, control: Control, now: Instant) {
        match self.holds.iter_mut().find(|h| h.control == control) {
            Some(hold) => {
                hold.last_seen = now;
                hold.repeating = true;
            }
            None => self.holds.push(Hold {
                control,
                last_seen: now,
                repeating: false,
            }),
        }
    }

    fn released(&mut self, control: Control) {
        self.holds.retain(|h| h.control != control);
    }

    fn expire(&mut self, now: Instant, out: &mut VecDeque<Input>) {
        self.holds.retain(|hold| {
            if hold.expired(now) {
                out.push_back(Input::Release(hold.control));
                false
            } else {
                true
            }
        });
    }
}

pub struct CliRenderer {
    last_render: Instant,
    target_frame_time: Duration,
    cols: usize,
    rows: usize,
    release_events: bool,
    holds: HoldTracker,
    pending: VecDeque<Input>,
}

impl CliRenderer {
    pub fn new() -> Self {
        Self {
            last_render: Instant::now(),
            // Target 30 FPS for smooth rendering
            target_frame_time: Duration::from_millis(33),
            cols: 0,
            rows: 0,
            release_events: false,
            holds: HoldTracker::default(),
            pending: VecDeque::new(),
        }
    }

    fn resize(&mut self, term_width: u16, term_height: u16) {
        // Each cell is 2 chars wide
        self.cols = (term_width / 2) as usize;
        self.rows = term_height.saturating_sub(INFO_LINES) as usize;
    }

    fn draw_cell(&self, cell: Cell, stdout: &mut io::Stdout) -> io::Result<()> {
        let color = match cell {
            Cell::Empty => Color::Black,
            Cell::Net => Color::DarkGrey,
            Cell::Paddle | Cell::Ball => Color::White,
            Cell::LeadingPaddle => Color::Yellow,
        };
        queue!(stdout, SetBackgroundColor(color), Print("  "))?;
        Ok(())
    }

    fn draw_info(&self, snapshot: &Snapshot, stdout: &mut io::Stdout) -> io::Result<()> {
        let score = format!("{}  |  {}", snapshot.left_score, snapshot.right_score);
        let pad = (self.cols * 2).saturating_sub(score.len()) / 2;

        queue!(
            stdout,
            cursor::MoveTo(0, self.rows as u16),
            ResetColor,
            terminal::Clear(ClearType::UntilNewLine),
            Print(format!("{:pad$}{}", "", score, pad = pad))
        )?;

        let mode = if self.release_events { "" } else { " (no key release support)" };
        queue!(
            stdout,
            cursor::MoveTo(0, self.rows as u16 + 1),
            Print(format!(
                "Left: W/S | Right: Up/Down | R to restart | Q to quit{}",
                mode
            ))
        )?;

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Resize(width, height) => {
                self.resize(width, height);
                let mut stdout = io::stdout();
                let _ = execute!(stdout, terminal::Clear(ClearType::All));
            }
            Event::Key(key) => {
                let Some(action) = map_key(key) else {
                    return;
                };
                let now = Instant::now();

                match (action, key.kind) {
                    (KeyAction::Control(control), KeyEventKind::Press) => {
                        if !self.release_events {
                            self.holds.pressed(control, now);
                        }
                        self.pending.push_back(Input::Press(control));
                    }
                    (KeyAction::Control(_), KeyEventKind::Repeat) => {}
                    (KeyAction::Control(control), KeyEventKind::Release) => {
                        self.holds.released(control);
                        self.pending.push_back(Input::Release(control));
                    }
                    (KeyAction::Quit, KeyEventKind::Press) => self.pending.push_back(Input::Quit),
                    (KeyAction::Restart, KeyEventKind::Press) => {
                        self.pending.push_back(Input::Restart)
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

impl Default for CliRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for CliRenderer {
    fn init(&mut self) -> io::Result<()> {
        let (width, height) = terminal::size()?;
        self.resize(width, height);

        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::Clear(ClearType::All),
            cursor::Hide
        )?;

        self.release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.release_events {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        tracing::debug!(
            cols = self.cols,
            rows = self.rows,
            release_events = self.release_events,
            "terminal ready"
        );
        Ok(())
    }

    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        // Frame rate limiting: skip rendering if not enough time has passed
        if self.last_render.elapsed() < self.target_frame_time {
            return Ok(());
        }

        self.last_render = Instant::now();

        let mut stdout = io::stdout();

        queue!(stdout, cursor::MoveTo(0, 0))?;

        for line in rasterize(snapshot, self.cols, self.rows) {
            for cell in line {
                self.draw_cell(cell, &mut stdout)?;
            }
            queue!(stdout, ResetColor, Print("\r\n"))?;
        }

        self.draw_info(snapshot, &mut stdout)?;

        stdout.flush()?;
        Ok(())
    }

    fn cleanup(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        if self.release_events {
            execute!(stdout, PopKeyboardEnhancementFlags)?;
            self.release_events = false;
        }
        execute!(
            stdout,
            cursor::Show,
            terminal::LeaveAlternateScreen,
            ResetColor
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    fn poll_input(&mut self) -> io::Result<Option<Input>> {
        if let Some(input) = self.pending.pop_front() {
            return Ok(Some(input));
        }

        while event::poll(Duration::from_millis(1))? {
            self.handle_event(event::read()?);
        }
        self.holds.expire(Instant::now(), &mut self.pending);

        Ok(self.pending.pop_front())
    }
}

impl Drop for CliRenderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::game::Match;
    use glam::DVec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn snapshot() -> Snapshot {
        let mut game = Match::with_rng(&MatchConfig::default(), StdRng::seed_from_u64(1));
        game.ball = crate::entity::Ball::with_velocity(
            DVec2::new(480.0, 230.0),
            20.0,
            5.0,
            DVec2::new(5.0, 0.0),
        );
        game.snapshot()
    }

    fn count(grid: &[Vec<Cell>], wanted: Cell) -> usize {
        grid.iter().flatten().filter(|&&c| c == wanted).count()
    }

    #[test]
    fn test_rasterize_places_paddles_and_ball() {
        let grid = rasterize(&snapshot(), 100, 50);

        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0].len(), 100);
        // Left paddle covers x 50..70, y 175..325 => cols 5..7, rows 17..32
        assert_eq!(grid[25][5], Cell::Paddle);
        assert_eq!(grid[25][93], Cell::Paddle);
        assert_eq!(grid[25][50], Cell::Ball);
        assert_eq!(grid[0][50], Cell::Net);
        assert_eq!(count(&grid, Cell::LeadingPaddle), 0);
    }

    #[test]
    fn test_rasterize_highlights_leader() {
        let mut snap = snapshot();
        snap.right_score = 3;
        let grid = rasterize(&snap, 100, 50);

        assert_eq!(grid[25][93], Cell::LeadingPaddle);
        assert_eq!(grid[25][5], Cell::Paddle);
    }

    #[test]
    fn test_rasterize_tiny_grid_still_shows_ball() {
        let grid = rasterize(&snapshot(), 4, 2);
        assert_eq!(count(&grid, Cell::Ball), 1);
    }

    #[test]
    fn test_rasterize_empty_grid() {
        assert!(rasterize(&snapshot(), 0, 0).is_empty());
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(
            map_key(KeyEvent::from(KeyCode::Char('w'))),
            Some(KeyAction::Control(Control::LeftUp))
        );
        assert_eq!(
            map_key(KeyEvent::from(KeyCode::Char('S'))),
            Some(KeyAction::Control(Control::LeftDown))
        );
        assert_eq!(
            map_key(KeyEvent::from(KeyCode::Up)),
            Some(KeyAction::Control(Control::RightUp))
        );
        assert_eq!(
            map_key(KeyEvent::from(KeyCode::Down)),
            Some(KeyAction::Control(Control::RightDown))
        );
        assert_eq!(map_key(KeyEvent::from(KeyCode::Char('r'))), Some(KeyAction::Restart));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyAction::Quit)
        );
        assert_eq!(map_key(KeyEvent::from(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_hold_expires_into_release() {
        let start = Instant::now();
        let mut holds = HoldTracker::default();
        let mut out = VecDeque::new();

        holds.pressed(Control::LeftUp, start);
        holds.expire(start + Duration::from_millis(300), &mut out);
        assert!(out.is_empty(), "first repeat may still be on its way");

        holds.pressed(Control::LeftUp, start + Duration::from_millis(400));
        holds.expire(start + Duration::from_millis(450), &mut out);
        assert!(out.is_empty());

        holds.expire(start + Duration::from_millis(600), &mut out);
        assert_eq!(out.pop_front(), Some(Input::Release(Control::LeftUp)));
        assert!(holds.holds.is_empty());
    }

    #[test]
    fn test_explicit_release_drops_hold() {
        let start = Instant::now();
        let mut holds = HoldTracker::default();
        let mut out = VecDeque::new();

        holds.pressed(Control::RightDown, start);
        holds.released(Control::RightDown);
        holds.expire(start + Duration::from_secs(5), &mut out);
        assert!(out.is_empty());
    }
}
