use crate::config::MatchConfig;
use crate::game::{Control, Match, Snapshot};
use std::time::Duration;

/// Fixed-period tick source.
///
/// Time is passed in as a `Duration` since any fixed epoch, so native
/// drivers can feed `Instant::elapsed` and the browser can feed
/// `performance.now()`.
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    period: Duration,
    last_tick: Duration,
}

impl Ticker {
    pub fn new(period: Duration, now: Duration) -> Self {
        Self {
            period,
            last_tick: now,
        }
    }

    /// Number of ticks that have come due since the last call.
    pub fn due(&mut self, now: Duration) -> u32 {
        if self.period.is_zero() || now < self.last_tick {
            return 0;
        }

        let mut ticks = 0;
        while now - self.last_tick >= self.period {
            self.last_tick += self.period;
            ticks += 1;
        }
        ticks
    }
}

/// Owns the running match and its tick driver.
///
/// A match is never partially reset: `restart` throws the old one away and
/// builds a new one from the config.
pub struct App {
    config: MatchConfig,
    current: Option<Match>,
    ticker: Option<Ticker>,
}

impl App {
    /// Longest run of catch-up ticks a single `pump` will execute. A driver
    /// that stalled for longer skips the backlog instead of fast-forwarding.
    pub const MAX_CATCH_UP: u32 = 5;

    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            current: None,
            ticker: None,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn start(&mut self, now: Duration) {
        self.current = Some(Match::new(&self.config));
        self.ticker = Some(Ticker::new(self.config.tick, now));
        tracing::debug!(tick_ms = self.config.tick.as_millis() as u64, "match started");
    }

    pub fn restart(&mut self, now: Duration) {
        self.stop();
        self.start(now);
    }

    /// Stop ticking. The last match stays visible but frozen.
    pub fn stop(&mut self) {
        if self.ticker.take().is_some() {
            tracing::debug!("match stopped");
        }
        if let Some(game) = self.current.as_mut() {
            game.halt();
        }
    }

    pub fn on_press(&mut self, control: Control) {
        if let Some(game) = self.current.as_mut() {
            game.on_press(control);
        }
    }

    pub fn on_release(&mut self, control: Control) {
        if let Some(game) = self.current.as_mut() {
            game.on_release(control);
        }
    }

    /// Advance the match by every tick that is due. Returns how many ran.
    pub fn pump(&mut self, now: Duration) -> u32 {
        let (Some(ticker), Some(game)) = (self.ticker.as_mut(), self.current.as_mut()) else {
            return 0;
        };

        let due = ticker.due(now);
        let ticks = due.min(Self::MAX_CATCH_UP);
        if due > ticks {
            tracing::debug!(skipped = due - ticks, "dropping stale ticks");
        }
        for _ in 0..ticks {
            game.advance();
        }
        ticks
    }

    pub fn current(&self) -> Option<&Match> {
        self.current.as_ref()
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.current.as_ref().map(Match::snapshot)
    }
}
