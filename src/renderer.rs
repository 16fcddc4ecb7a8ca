use crate::game::{Control, Snapshot};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Press(Control),
    Release(Control),
    Quit,
    Restart,
}

/// Trait that abstracts rendering implementation.
/// This allows for different rendering backends (CLI, Web, etc.)
pub trait Renderer {
    /// Initialize the renderer
    fn init(&mut self) -> io::Result<()>;

    /// Draw one frame. Sinks only read the snapshot.
    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()>;

    /// Clean up and restore terminal/display state
    fn cleanup(&mut self) -> io::Result<()>;

    /// Poll for the next pending input, if any
    fn poll_input(&mut self) -> io::Result<Option<Input>>;
}

