use crate::{App, Input, MatchConfig, Renderer, WebRenderer};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

struct GameLoop {
    app: App,
    renderer: WebRenderer,
}

fn to_duration(millis: f64) -> Duration {
    Duration::from_secs_f64(millis.max(0.0) / 1000.0)
}

impl GameLoop {
    fn new(now: f64) -> Result<Self, JsValue> {
        let mut renderer = WebRenderer::new("gameCanvas", "restart")?;
        renderer.init().map_err(|e| JsValue::from_str(&e.to_string()))?;

        let mut app = App::new(MatchConfig::default());
        app.start(to_duration(now));

        Ok(Self { app, renderer })
    }

    fn update_frame(&mut self, current_time: f64) -> Result<(), JsValue> {
        let now = to_duration(current_time);

        while let Some(input) = self
            .renderer
            .poll_input()
            .map_err(|e| JsValue::from_str(&e.to_string()))?
        {
            match input {
                Input::Press(control) => self.app.on_press(control),
                Input::Release(control) => self.app.on_release(control),
                Input::Restart => {
                    web_sys::console::log_1(&"[WASM] Restarting match".into());
                    self.app.restart(now);
                }
                Input::Quit => {
                    // In web, we can't really quit, just stop ticking
                    self.app.stop();
                }
            }
        }

        self.app.pump(now);

        if let Some(snapshot) = self.app.snapshot() {
            self.renderer
                .render(&snapshot)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
        }

        Ok(())
    }
}

fn request_frame(window: &web_sys::Window, callback: &Closure<dyn FnMut()>) -> Result<(), JsValue> {
    window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    Ok(())
}

#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or("no window")?;
    let performance = window.performance().ok_or("no performance")?;

    let game_loop = match GameLoop::new(performance.now()) {
        Ok(gl) => Rc::new(RefCell::new(gl)),
        Err(e) => {
            web_sys::console::error_1(&format!("[WASM] Failed to create game loop: {:?}", e).into());
            return Err(e);
        }
    };

    // Closure for animation frame; it re-arms itself every frame
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    let frame_window = window.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let current_time = performance.now();

        if let Err(e) = game_loop.borrow_mut().update_frame(current_time) {
            web_sys::console::error_1(&e);
            return; // Stop loop on error
        }

        if let Some(callback) = f.borrow().as_ref() {
            if let Err(e) = request_frame(&frame_window, callback) {
                web_sys::console::error_1(&e);
            }
        }
    }) as Box<dyn FnMut()>));

    if let Some(callback) = g.borrow().as_ref() {
        request_frame(&window, callback)?;
    }

    web_sys::console::log_1(&"[WASM] Match started".into());

    Ok(())
}
