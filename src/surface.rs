//! 2D drawing surface abstraction.
//!
//! Field animations paint through [`DrawSurface`] so the same entity code can
//! target a browser canvas, the native raster backend, or a recording double
//! in tests. Coordinates are in surface pixels with the origin at the top left.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An RGB colour with a fractional alpha, matching the canvas `rgba()` notation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 1.0);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 1.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Same colour with a different alpha (clamped to 0..=1).
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Linear interpolation between two colours, channel by channel.
    pub fn lerp(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// CSS colour string for canvas style properties.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// A colour stop along a radial gradient, `offset` in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

/// Radial gradient starting at `center` (offset 0) and ending at `radius` (offset 1).
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub center: Vec2,
    pub radius: f32,
    pub stops: Vec<GradientStop>,
}

impl RadialGradient {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius,
            stops: Vec::with_capacity(3),
        }
    }

    /// Append a colour stop. Stops are expected in ascending offset order.
    pub fn with_stop(mut self, offset: f32, color: Rgba) -> Self {
        self.stops.push(GradientStop {
            offset: offset.clamp(0.0, 1.0),
            color,
        });
        self
    }

    /// Colour of the gradient at `distance` from its centre.
    pub fn color_at(&self, distance: f32) -> Rgba {
        let Some(first) = self.stops.first() else {
            return Rgba::new(0, 0, 0, 0.0);
        };
        let t = if self.radius > 0.0 {
            (distance / self.radius).clamp(0.0, 1.0)
        } else {
            1.0
        };
        if t <= first.offset {
            return first.color;
        }

        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset {
                let span = b.offset - a.offset;
                let local = if span > 0.0 { (t - a.offset) / span } else { 1.0 };
                return a.color.lerp(b.color, local);
            }
        }

        self.stops[self.stops.len() - 1].color
    }
}

/// Minimal 2D drawing API the animations render through.
pub trait DrawSurface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    /// Composite a filled rectangle over the current contents.
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32);

    /// Stroke a connected path through `points`.
    fn stroke_polyline(&mut self, points: &[Vec2], color: Rgba, width: f32) {
        for pair in points.windows(2) {
            self.stroke_line(pair[0], pair[1], color, width);
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    /// Fill a circle of `radius` around `center`, coloured by `gradient`.
    fn fill_circle_gradient(&mut self, center: Vec2, radius: f32, gradient: &RadialGradient);

    /// Composite a translucent fill over the whole surface (trail effect).
    fn fade(&mut self, color: Rgba) {
        let size = Vec2::new(self.width(), self.height());
        self.fill_rect(Vec2::ZERO, size, color);
    }
}

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    FillRect {
        origin: Vec2,
        size: Vec2,
        color: Rgba,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Rgba,
        width: f32,
    },
    Polyline {
        points: Vec<Vec2>,
        color: Rgba,
        width: f32,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Rgba,
    },
    GradientCircle {
        center: Vec2,
        radius: f32,
        gradient: RadialGradient,
    },
}

/// Surface that records commands instead of painting them.
///
/// Used to inspect draw order and opacities without a pixel backend.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f32,
    height: f32,
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Drop all recorded commands.
    pub fn reset(&mut self) {
        self.commands.clear();
    }

    /// All recorded straight line segments.
    pub fn lines(&self) -> impl Iterator<Item = (Vec2, Vec2, Rgba)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Line { from, to, color, .. } => Some((*from, *to, *color)),
            _ => None,
        })
    }
}

impl DrawSurface for RecordingSurface {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        self.commands.push(DrawCommand::FillRect {
            origin,
            size,
            color,
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            color,
            width,
        });
    }

    fn stroke_polyline(&mut self, points: &[Vec2], color: Rgba, width: f32) {
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            color,
            width,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn fill_circle_gradient(&mut self, center: Vec2, radius: f32, gradient: &RadialGradient) {
        self.commands.push(DrawCommand::GradientCircle {
            center,
            radius,
            gradient: gradient.clone(),
        });
    }
}
