use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::config::SceneConfig;
use crate::crossfade::{report_play_rejected, CrossfadeAction, VideoCrossfade};
use crate::driver::{FrameDriver, FrameResult};
use crate::field::{AmbientField, FieldAnimation, SphereField};
use crate::follow::{CursorFollower, NameTilt};
use crate::pose::PoseRecord;
use crate::sequencer::PhaseSequencer;
use crate::surface::{DrawSurface, RadialGradient, Rgba};
use crate::typing::{Typewriter, TypewriterConfig};

/// `DrawSurface` over a browser 2D canvas context.
struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    width: f32,
    height: f32,
}

impl CanvasSurface {
    fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("Canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            ctx,
            width: canvas.width() as f32,
            height: canvas.height() as f32,
        })
    }

    fn circle_path(&self, center: Vec2, radius: f32) {
        self.ctx.begin_path();
        if let Err(e) = self.ctx.arc(
            center.x as f64,
            center.y as f64,
            radius.max(0.0) as f64,
            0.0,
            std::f64::consts::TAU,
        ) {
            log::warn!("Canvas arc failed: {:?}", e);
        }
    }
}

impl DrawSurface for CanvasSurface {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width as f64, self.height as f64);
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(origin.x as f64, origin.y as f64, size.x as f64, size.y as f64);
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        self.stroke_polyline(&[from, to], color, width);
    }

    fn stroke_polyline(&mut self, points: &[Vec2], color: Rgba, width: f32) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.begin_path();
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in rest {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width as f64);
        self.ctx.stroke();
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.circle_path(center, radius);
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill();
    }

    fn fill_circle_gradient(&mut self, center: Vec2, radius: f32, gradient: &RadialGradient) {
        let canvas_gradient = match self.ctx.create_radial_gradient(
            gradient.center.x as f64,
            gradient.center.y as f64,
            0.0,
            gradient.center.x as f64,
            gradient.center.y as f64,
            gradient.radius.max(0.0) as f64,
        ) {
            Ok(g) => g,
            Err(e) => {
                log::warn!("Failed to create radial gradient: {:?}", e);
                return;
            }
        };
        for stop in &gradient.stops {
            if let Err(e) = canvas_gradient.add_color_stop(stop.offset, &stop.color.to_css()) {
                log::warn!("Invalid gradient stop: {:?}", e);
            }
        }
        self.circle_path(center, radius);
        self.ctx.set_fill_style_canvas_gradient(&canvas_gradient);
        self.ctx.fill();
    }
}

#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

fn parse_config(config_json: Option<String>) -> Result<SceneConfig, JsValue> {
    match config_json {
        Some(json) => SceneConfig::from_json_str(&json)
            .map_err(|e| JsValue::from_str(&format!("Invalid scene config: {:#}", e))),
        None => Ok(SceneConfig::default()),
    }
}

#[wasm_bindgen]
pub struct WasmFieldAnimation {
    inner: Rc<RefCell<FieldContext>>,
}

struct FieldContext {
    driver: FrameDriver,
    surface: CanvasSurface,
}

#[wasm_bindgen]
impl WasmFieldAnimation {
    pub fn set_pointer(&self, x: f32, y: f32) {
        self.inner.borrow_mut().driver.set_pointer(Vec2::new(x, y));
    }

    pub fn pointer_left(&self) {
        self.inner.borrow_mut().driver.pointer_left();
    }

    /// Run one animation frame. Returns false once stopped; the host should
    /// then stop requesting frames.
    pub fn frame(&self, now_ms: f64) -> bool {
        let mut inner = self.inner.borrow_mut();
        let ctx = &mut *inner;
        ctx.driver.frame(now_ms, &mut ctx.surface) != FrameResult::Stopped
    }

    pub fn stop(&self) {
        self.inner.borrow_mut().driver.stop();
    }

    pub fn entity_count(&self) -> usize {
        self.inner
            .borrow()
            .driver
            .field()
            .map(FieldAnimation::entity_count)
            .unwrap_or(0)
    }
}

/// Attach a field animation ("ambient" or "sphere") to a canvas.
///
/// The field is sized to the canvas; other parameters come from `config_json`.
#[wasm_bindgen]
pub fn create_field_animation(
    canvas: HtmlCanvasElement,
    kind: &str,
    config_json: Option<String>,
) -> Result<WasmFieldAnimation, JsValue> {
    init_panic_hook();

    let mut config = parse_config(config_json)?;
    let (width, height) = (canvas.width() as f32, canvas.height() as f32);
    if width <= 0.0 || height <= 0.0 {
        return Err(JsValue::from_str("Canvas has zero size"));
    }

    let field = match kind {
        "ambient" => {
            config.ambient.width = width;
            config.ambient.height = height;
            FieldAnimation::Ambient(AmbientField::new(&config.ambient, config.seed))
        }
        "sphere" => {
            config.sphere.width = width;
            config.sphere.height = height;
            FieldAnimation::Sphere(SphereField::new(&config.sphere, config.seed))
        }
        other => return Err(JsValue::from_str(&format!("Unknown field kind: {}", other))),
    };

    let surface = CanvasSurface::new(&canvas)?;
    let driver = FrameDriver::new(&config.driver).with_field(field);

    Ok(WasmFieldAnimation {
        inner: Rc::new(RefCell::new(FieldContext { driver, surface })),
    })
}

#[wasm_bindgen]
pub struct WasmWalkCycle {
    sequencer: PhaseSequencer,
}

#[wasm_bindgen]
impl WasmWalkCycle {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmWalkCycle, JsValue> {
        let config = parse_config(config_json)?;
        let sequencer = PhaseSequencer::new(config.walk_cycle)
            .map_err(|e| JsValue::from_str(&format!("Invalid walk cycle: {:#}", e)))?;
        Ok(Self { sequencer })
    }

    /// Pose at `time_ms` as JSON (joint rotations keyed by joint name).
    pub fn pose_json(&self, time_ms: f64) -> String {
        let sample = self.sequencer.sample(time_ms / 1000.0);
        let pose = self.sequencer.evaluate_sample(time_ms / 1000.0, &sample);
        let record = PoseRecord::new(time_ms, sample.phase.name(), sample.progress, &pose);
        serde_json::to_string(&record).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn phase(&self, time_ms: f64) -> String {
        self.sequencer.sample(time_ms / 1000.0).phase.name().to_string()
    }
}

#[wasm_bindgen]
pub struct WasmTypewriter {
    inner: Typewriter,
}

#[wasm_bindgen]
impl WasmTypewriter {
    #[wasm_bindgen(constructor)]
    pub fn new(text: Option<String>, char_interval_ms: Option<f64>) -> Self {
        let defaults = TypewriterConfig::default();
        let config = TypewriterConfig {
            text: text.unwrap_or(defaults.text),
            char_interval_ms: char_interval_ms.unwrap_or(defaults.char_interval_ms),
            cursor_linger_ms: defaults.cursor_linger_ms,
        };
        Self {
            inner: Typewriter::new(&config),
        }
    }

    pub fn start(&mut self, now_ms: f64) {
        self.inner.start(now_ms);
    }

    pub fn cancel(&mut self) {
        self.inner.cancel();
    }

    /// Returns true when the text or cursor changed.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.inner.tick(now_ms)
    }

    pub fn visible_text(&self) -> String {
        self.inner.visible_text()
    }

    pub fn cursor_visible(&self) -> bool {
        self.inner.cursor_visible()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

#[wasm_bindgen]
pub struct WasmPointerEffects {
    cursor: CursorFollower,
    tilt: NameTilt,
}

#[wasm_bindgen]
impl WasmPointerEffects {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cursor: CursorFollower::default(),
            tilt: NameTilt::default(),
        }
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.cursor.pointer_moved(Vec2::new(x, y));
    }

    /// Pointer over the name heading, relative to its centre.
    pub fn heading_pointer_moved(&mut self, dx: f32, dy: f32, width: f32, height: f32) {
        self.tilt.pointer_moved(Vec2::new(dx, dy), Vec2::new(width, height));
    }

    pub fn heading_pointer_left(&mut self) {
        self.tilt.pointer_left();
    }

    /// Advance one frame. Returns true while the heading is still easing back.
    pub fn update(&mut self) -> bool {
        self.cursor.update();
        self.tilt.update()
    }

    /// Ring and dot positions as [ring_x, ring_y, dot_x, dot_y].
    pub fn cursor_positions(&self) -> Vec<f32> {
        vec![self.cursor.ring.x, self.cursor.ring.y, self.cursor.dot.x, self.cursor.dot.y]
    }

    pub fn heading_transform(&self) -> String {
        self.tilt.css_transform()
    }
}

impl Default for WasmPointerEffects {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
pub struct WasmVideoCrossfade {
    inner: VideoCrossfade,
}

#[wasm_bindgen]
impl WasmVideoCrossfade {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: VideoCrossfade::default(),
        }
    }

    /// Returns true when the host should start the second clip and swap opacities.
    pub fn on_time_update(&mut self, current_secs: f64, duration_secs: f64, now_ms: f64) -> bool {
        self.inner.on_time_update(current_secs, duration_secs, now_ms) == Some(CrossfadeAction::StartSecond)
    }

    /// Returns true when the host should pause and hide the first clip.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.inner.tick(now_ms) == Some(CrossfadeAction::RetireFirst)
    }

    pub fn play_rejected(&self, clip: &str, reason: &str) {
        report_play_rejected(clip, reason);
    }
}

impl Default for WasmVideoCrossfade {
    fn default() -> Self {
        Self::new()
    }
}
