use rally::{App, CliRenderer, Input, MatchConfig, Renderer};
use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// Log file used when RUST_LOG is set; stderr belongs to the alternate screen
const LOG_FILE: &str = "rally.log";

fn init_logging() -> io::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }

    let file = File::create(LOG_FILE)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> io::Result<()> {
    init_logging()?;

    let epoch = Instant::now();
    let mut app = App::new(MatchConfig::default());
    let mut renderer = CliRenderer::new();

    renderer.init()?;
    app.start(epoch.elapsed());

    'running: loop {
        // Drain pending input
        while let Some(input) = renderer.poll_input()? {
            match input {
                Input::Press(control) => app.on_press(control),
                Input::Release(control) => app.on_release(control),
                Input::Restart => app.restart(epoch.elapsed()),
                Input::Quit => break 'running,
            }
        }

        // Update game logic at fixed rate
        app.pump(epoch.elapsed());

        // Let renderer decide when to actually render
        // (it manages its own frame rate internally)
        if let Some(snapshot) = app.snapshot() {
            renderer.render(&snapshot)?;
        }
    }

    app.stop();
    renderer.cleanup()?;
    Ok(())
}
