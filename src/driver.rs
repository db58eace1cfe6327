//! Per-frame orchestration.
//!
//! The host calls [`FrameDriver::frame`] once per display refresh with its
//! monotonic clock. The driver prepares the surface, advances and paints the
//! field, then evaluates the walk cycle and writes the pose onto the scene graph.

use anyhow::Result;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::field::{ClearMode, FieldAnimation};
use crate::particle::FrameContext;
use crate::pose::Pose;
use crate::rig::RobotRig;
use crate::scene_graph::SceneGraph;
use crate::sequencer::PhaseSequencer;
use crate::surface::DrawSurface;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverConfig {
    /// Frames per second to paint at most. 0 paints on every callback.
    pub target_fps: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { target_fps: 60.0 }
    }
}

/// Outcome of one host callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameResult {
    Rendered,
    /// Callback arrived before the target interval elapsed.
    Skipped,
    /// The driver was stopped; the host should stop requesting frames.
    Stopped,
}

/// Skips callbacks that arrive faster than the target interval.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval_ms: f64,
    last_ms: Option<f64>,
}

impl FrameThrottle {
    pub fn new(target_fps: f64) -> Self {
        let interval_ms = if target_fps > 0.0 { 1000.0 / target_fps } else { 0.0 };
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Whether a frame should be painted at `now_ms`.
    ///
    /// The remainder of the elapsed time is carried over so the paint cadence
    /// stays aligned to the interval rather than drifting with callback jitter.
    pub fn should_render(&mut self, now_ms: f64) -> bool {
        let Some(last) = self.last_ms else {
            self.last_ms = Some(now_ms);
            return true;
        };
        if self.interval_ms <= 0.0 {
            self.last_ms = Some(now_ms);
            return true;
        }
        let delta = now_ms - last;
        if delta < self.interval_ms {
            return false;
        }
        self.last_ms = Some(now_ms - delta % self.interval_ms);
        true
    }
}

/// The posed figure: its sequencer plus the scene graph it writes into.
#[derive(Debug, Clone)]
pub struct WalkingFigure {
    pub sequencer: PhaseSequencer,
    pub rig: RobotRig,
    pub scene: SceneGraph,
}

impl WalkingFigure {
    pub fn new(sequencer: PhaseSequencer) -> Result<Self> {
        let mut scene = SceneGraph::new();
        let rig = RobotRig::build(&mut scene)?;
        Ok(Self { sequencer, rig, scene })
    }

    /// Evaluate the walk cycle at `now_ms` and apply it to the rig.
    pub fn advance(&mut self, now_ms: f64) -> Pose {
        let pose = self.sequencer.evaluate(now_ms / 1000.0);
        self.rig.apply(&pose, &mut self.scene);
        pose
    }
}

pub struct FrameDriver {
    field: Option<FieldAnimation>,
    figure: Option<WalkingFigure>,
    pointer: Vec2,
    throttle: FrameThrottle,
    running: bool,
    frames_rendered: u64,
    frames_skipped: u64,
    last_pose: Option<Pose>,
}

impl FrameDriver {
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            field: None,
            figure: None,
            pointer: Vec2::ZERO,
            throttle: FrameThrottle::new(config.target_fps),
            running: true,
            frames_rendered: 0,
            frames_skipped: 0,
            last_pose: None,
        }
    }

    pub fn with_field(mut self, field: FieldAnimation) -> Self {
        self.pointer = field.resting_pointer();
        self.field = Some(field);
        self
    }

    pub fn with_figure(mut self, figure: WalkingFigure) -> Self {
        self.figure = Some(figure);
        self
    }

    pub fn field(&self) -> Option<&FieldAnimation> {
        self.field.as_ref()
    }

    pub fn figure(&self) -> Option<&WalkingFigure> {
        self.figure.as_ref()
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.figure.as_ref().map(|f| &f.scene)
    }

    pub fn scene_mut(&mut self) -> Option<&mut SceneGraph> {
        self.figure.as_mut().map(|f| &mut f.scene)
    }

    /// Pose applied by the most recent rendered frame.
    pub fn last_pose(&self) -> Option<&Pose> {
        self.last_pose.as_ref()
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Record a pointer position; read by the next frame.
    pub fn set_pointer(&mut self, position: Vec2) {
        self.pointer = position;
    }

    /// Pointer left the surface: fall back to the field's resting point.
    pub fn pointer_left(&mut self) {
        self.pointer = self
            .field
            .as_ref()
            .map(FieldAnimation::resting_pointer)
            .unwrap_or(Vec2::ZERO);
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!(
                "Frame driver stopped after {} frames ({} skipped)",
                self.frames_rendered,
                self.frames_skipped
            );
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    /// Run one host callback.
    pub fn frame(&mut self, now_ms: f64, surface: &mut dyn DrawSurface) -> FrameResult {
        if !self.running {
            return FrameResult::Stopped;
        }
        if !self.throttle.should_render(now_ms) {
            self.frames_skipped += 1;
            log::trace!("Skipped frame at {:.1}ms", now_ms);
            return FrameResult::Skipped;
        }

        if let Some(field) = &mut self.field {
            let ctx = FrameContext::new(now_ms, self.pointer);
            match field.clear_mode() {
                ClearMode::Clear => surface.clear(),
                ClearMode::Fade(color) => surface.fade(color),
            }
            field.update(&ctx);
            field.draw(surface, &ctx);
        }

        if let Some(figure) = &mut self.figure {
            self.last_pose = Some(figure.advance(now_ms));
        }

        self.frames_rendered += 1;
        if self.frames_rendered % 600 == 0 {
            log::debug!(
                "{} frames rendered, {} skipped",
                self.frames_rendered,
                self.frames_skipped
            );
        }
        FrameResult::Rendered
    }
}
