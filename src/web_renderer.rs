use crate::entity::Side;
use crate::game::{Control, Snapshot};
use crate::renderer::{Input, Renderer};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::f64::consts::PI;
use std::io;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent};

const TARGET_FRAME_TIME: f64 = 16.0; // ~60 FPS

const COLOR_FIELD: &str = "black";
const COLOR_FOREGROUND: &str = "white";
const COLOR_LEADER: &str = "gold";
const SCORE_FONT: &str = "48px sans-serif";

fn js_err(err: JsValue) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{:?}", err))
}

fn control_for_key(key: &str) -> Option<Control> {
    match key {
        "w" | "W" => Some(Control::LeftUp),
        "s" | "S" => Some(Control::LeftDown),
        "ArrowUp" => Some(Control::RightUp),
        "ArrowDown" => Some(Control::RightDown),
        _ => None,
    }
}

pub struct WebRenderer {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    window: web_sys::Window,
    restart_button: Option<HtmlElement>,
    device_pixel_ratio: f64,
    last_render_time: f64,

    // Input state
    pending_input: Rc<RefCell<VecDeque<Input>>>,
}

impl WebRenderer {
    /// `restart_id` names an optional button that restarts the match.
    pub fn new(canvas_id: &str, restart_id: &str) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("canvas not found")?
            .dyn_into::<HtmlCanvasElement>()?;

        let context = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let restart_button = document
            .get_element_by_id(restart_id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());

        // Get device pixel ratio for high DPI displays
        let device_pixel_ratio = window.device_pixel_ratio();

        Ok(Self {
            canvas,
            context,
            window,
            restart_button,
            device_pixel_ratio,
            last_render_time: 0.0,
            pending_input: Rc::new(RefCell::new(VecDeque::new())),
        })
    }

    fn setup_keyboard_listeners(&self) -> Result<(), JsValue> {
        let pending_input = self.pending_input.clone();
        let keydown = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            let key = event.key();
            let input = match key.as_str() {
                "r" | "R" => Some(Input::Restart),
                // Held keys auto-repeat; the first press already set the direction
                _ if event.repeat() => None,
                other => control_for_key(other).map(Input::Press),
            };

            if let Some(input) = input {
                pending_input.borrow_mut().push_back(input);
                event.prevent_default();
            }
        }) as Box<dyn FnMut(KeyboardEvent)>);

        self.window
            .add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget(); // Keep listener alive

        let pending_input = self.pending_input.clone();
        let keyup = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            if let Some(control) = control_for_key(&event.key()) {
                pending_input.borrow_mut().push_back(Input::Release(control));
                event.prevent_default();
            }
        }) as Box<dyn FnMut(KeyboardEvent)>);

        self.window
            .add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        keyup.forget();

        Ok(())
    }

    fn setup_restart_listener(&self) -> Result<(), JsValue> {
        let Some(button) = &self.restart_button else {
            return Ok(());
        };

        let pending_input = self.pending_input.clone();
        let click = Closure::wrap(Box::new(move |_event: MouseEvent| {
            pending_input.borrow_mut().push_back(Input::Restart);
        }) as Box<dyn FnMut(MouseEvent)>);

        button.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        click.forget();

        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.window
            .performance()
            .map(|performance| performance.now())
            .unwrap_or(0.0)
    }

    fn fit_canvas(&self, snapshot: &Snapshot) -> Result<(), JsValue> {
        let display_width = snapshot.bounds.width;
        let display_height = snapshot.bounds.height;

        // Internal resolution (actual pixels, scaled for high DPI)
        let pixel_width = (display_width * self.device_pixel_ratio) as u32;
        let pixel_height = (display_height * self.device_pixel_ratio) as u32;

        if self.canvas.width() != pixel_width || self.canvas.height() != pixel_height {
            self.canvas.set_width(pixel_width);
            self.canvas.set_height(pixel_height);

            let element: &HtmlElement = self.canvas.unchecked_ref();
            element
                .style()
                .set_property("width", &format!("{}px", display_width))?;
            element
                .style()
                .set_property("height", &format!("{}px", display_height))?;

            // Setting width/height resets the context transform
            self.context
                .scale(self.device_pixel_ratio, self.device_pixel_ratio)?;
        }
        Ok(())
    }

    fn draw(&self, snapshot: &Snapshot) -> Result<(), JsValue> {
        let width = snapshot.bounds.width;
        let height = snapshot.bounds.height;
        let ctx = &self.context;

        ctx.set_fill_style_str(COLOR_FIELD);
        ctx.fill_rect(0.0, 0.0, width, height);

        // Net
        ctx.begin_path();
        ctx.set_stroke_style_str(COLOR_FOREGROUND);
        ctx.move_to(width / 2.0, 0.0);
        ctx.line_to(width / 2.0, height);
        ctx.stroke();

        ctx.set_fill_style_str(COLOR_FOREGROUND);
        ctx.set_font(SCORE_FONT);
        ctx.fill_text(&snapshot.left_score.to_string(), width / 2.0 - 48.0, 50.0)?;
        ctx.fill_text(&snapshot.right_score.to_string(), width / 2.0 + 24.0, 50.0)?;

        ctx.begin_path();
        ctx.arc(
            snapshot.ball_center.x,
            snapshot.ball_center.y,
            snapshot.ball_radius,
            0.0,
            2.0 * PI,
        )?;
        ctx.fill();

        let leader = snapshot.leader();
        for (side, paddle) in [(Side::Left, &snapshot.left), (Side::Right, &snapshot.right)] {
            let color = if leader == Some(side) {
                COLOR_LEADER
            } else {
                COLOR_FOREGROUND
            };
            ctx.set_fill_style_str(color);
            ctx.fill_rect(paddle.x, paddle.y, paddle.width, paddle.height);
        }

        Ok(())
    }
}

impl Renderer for WebRenderer {
    fn init(&mut self) -> io::Result<()> {
        self.setup_keyboard_listeners().map_err(js_err)?;
        self.setup_restart_listener().map_err(js_err)?;
        self.last_render_time = self.current_time();
        Ok(())
    }

    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        let now = self.current_time();

        // Frame rate limiting
        if now - self.last_render_time < TARGET_FRAME_TIME {
            return Ok(());
        }
        self.last_render_time = now;

        self.fit_canvas(snapshot).map_err(js_err)?;
        self.draw(snapshot).map_err(js_err)
    }

    fn cleanup(&mut self) -> io::Result<()> {
        // No cleanup needed for web
        Ok(())
    }

    fn poll_input(&mut self) -> io::Result<Option<Input>> {
        Ok(self.pending_input.borrow_mut().pop_front())
    }
}
