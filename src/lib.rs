pub mod app;
pub mod config;
pub mod entity;
pub mod game;
pub mod renderer;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli_renderer;

#[cfg(target_arch = "wasm32")]
pub mod web_main;
#[cfg(target_arch = "wasm32")]
pub mod web_renderer;

pub use app::{App, Ticker};
pub use config::{Bounds, MatchConfig};
pub use entity::{Ball, Direction, Paddle, ScoreSignal, Side};
pub use game::{Control, InputState, Match, Snapshot};
pub use renderer::{Input, Renderer};

#[cfg(not(target_arch = "wasm32"))]
pub use cli_renderer::CliRenderer;
#[cfg(target_arch = "wasm32")]
pub use web_renderer::WebRenderer;
