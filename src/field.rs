//! Entity fields: fixed populations of particles plus shared animation context.
//!
//! A field is created once with a fixed entity count and never grows or
//! shrinks. Each frame it updates every entity, then paints proximity
//! connections, then paints the entities on top so connection lines never
//! occlude glyphs. Connection evaluation is O(n²) in the entity count, so
//! populations stay in the tens to ~100.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::particle::{DriftParticle, EntityRng, FlowingLine, FrameContext, SphereGeometry, SphereParticle};
use crate::surface::{DrawSurface, RadialGradient, Rgba};

/// How proximity connections are drawn between entities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStyle {
    /// Pairs closer than this (in pixels) are connected.
    pub threshold: f32,
    /// Line alpha for coincident entities; falls linearly to 0 at the threshold.
    pub max_alpha: f32,
    pub color: Rgba,
    pub width: f32,
}

impl ConnectionStyle {
    /// Normalized connection strength `(threshold - d) / threshold`, or None at or beyond the threshold.
    pub fn strength(&self, distance: f32) -> Option<f32> {
        if distance < self.threshold {
            Some((self.threshold - distance) / self.threshold)
        } else {
            None
        }
    }

    /// Stroke a line for every unordered pair closer than the threshold.
    pub fn draw_connections(&self, positions: &[Vec2], surface: &mut dyn DrawSurface) {
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                let delta = *a - *b;
                // Cheap axis-aligned rejection before the exact distance
                if delta.x.abs() >= self.threshold || delta.y.abs() >= self.threshold {
                    continue;
                }
                if let Some(strength) = self.strength(delta.length()) {
                    surface.stroke_line(
                        *a,
                        *b,
                        self.color.with_alpha(strength * self.max_alpha),
                        self.width,
                    );
                }
            }
        }
    }
}

/// Configuration for the full-viewport drifting particle background.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AmbientFieldConfig {
    pub width: f32,
    pub height: f32,
    pub particle_count: usize,
    /// Per-axis speed bound in pixels per frame.
    pub max_speed: f32,
    pub size_range: [f32; 2],
    pub opacity_range: [f32; 2],
    pub color: Rgba,
    pub connection: ConnectionStyle,
}

impl Default for AmbientFieldConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            particle_count: 50,
            max_speed: 0.25,
            size_range: [1.0, 3.0],
            opacity_range: [0.2, 0.7],
            color: Rgba::rgb(139, 0, 0),
            connection: ConnectionStyle {
                threshold: 80.0,
                max_alpha: 0.075,
                color: Rgba::rgb(139, 0, 0),
                width: 1.0,
            },
        }
    }
}

/// Configuration for the glowing sphere animation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SphereFieldConfig {
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub particle_count: usize,
    pub line_count: usize,
    pub line_segments: usize,
    pub reaction_radius: f32,
    pub max_repulsion: f32,
    pub pulse_amplitude: f32,
    pub connection: ConnectionStyle,
    /// Translucent fill composited each frame to leave trails.
    pub fade: Rgba,
}

impl Default for SphereFieldConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 900.0,
            radius: 250.0,
            particle_count: 100,
            line_count: 30,
            line_segments: 20,
            reaction_radius: 120.0,
            max_repulsion: 10.0,
            pulse_amplitude: 20.0,
            connection: ConnectionStyle {
                threshold: 120.0,
                max_alpha: 0.15,
                color: Rgba::rgb(153, 0, 0),
                width: 0.8,
            },
            fade: Rgba::new(0, 0, 0, 0.05),
        }
    }
}

/// How the surface is prepared before a field paints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearMode {
    /// Wipe the previous frame entirely.
    Clear,
    /// Composite a low-alpha fill so previous frames linger as trails.
    Fade(Rgba),
}

/// Drifting particles on a toroidal surface.
#[derive(Debug, Clone)]
pub struct AmbientField {
    bounds: Vec2,
    particles: Vec<DriftParticle>,
    color: Rgba,
    connection: ConnectionStyle,
}

impl AmbientField {
    pub fn new(config: &AmbientFieldConfig, seed: u64) -> Self {
        let bounds = Vec2::new(config.width, config.height);
        let mut rng = EntityRng::new(seed);
        let particles = (0..config.particle_count)
            .map(|_| {
                DriftParticle::new(
                    &mut rng,
                    bounds,
                    config.max_speed,
                    config.size_range,
                    config.opacity_range,
                )
            })
            .collect();
        log::info!(
            "Created ambient field: {} particles on {}x{}",
            config.particle_count,
            config.width,
            config.height
        );
        Self {
            bounds,
            particles,
            color: config.color,
            connection: config.connection,
        }
    }

    pub fn particles(&self) -> &[DriftParticle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [DriftParticle] {
        &mut self.particles
    }

    pub fn update(&mut self) {
        for particle in &mut self.particles {
            particle.update(self.bounds);
        }
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface) {
        let positions: Vec<Vec2> = self.particles.iter().map(|p| p.position).collect();
        self.connection.draw_connections(&positions, surface);
        for particle in &self.particles {
            particle.draw(surface, self.color);
        }
    }
}

/// Orbiting particles, flowing strands and a pulsing core on a sphere.
#[derive(Debug, Clone)]
pub struct SphereField {
    geometry: SphereGeometry,
    bounds: Vec2,
    particles: Vec<SphereParticle>,
    lines: Vec<FlowingLine>,
    connection: ConnectionStyle,
    fade: Rgba,
}

impl SphereField {
    pub fn new(config: &SphereFieldConfig, seed: u64) -> Self {
        let bounds = Vec2::new(config.width, config.height);
        let geometry = SphereGeometry {
            center: bounds * 0.5,
            radius: config.radius,
            reaction_radius: config.reaction_radius,
            max_repulsion: config.max_repulsion,
            pulse_amplitude: config.pulse_amplitude,
        };
        let mut rng = EntityRng::new(seed);
        let start = FrameContext::new(0.0, geometry.center);
        let lines = (0..config.line_count)
            .map(|_| FlowingLine::new(&mut rng, config.line_segments, &start, &geometry))
            .collect();
        let particles = (0..config.particle_count)
            .map(|_| SphereParticle::new(&mut rng, &geometry))
            .collect();
        log::info!(
            "Created sphere field: {} particles, {} flowing lines, radius {}",
            config.particle_count,
            config.line_count,
            config.radius
        );
        Self {
            geometry,
            bounds,
            particles,
            lines,
            connection: config.connection,
            fade: config.fade,
        }
    }

    pub fn geometry(&self) -> &SphereGeometry {
        &self.geometry
    }

    pub fn particles(&self) -> &[SphereParticle] {
        &self.particles
    }

    pub fn lines(&self) -> &[FlowingLine] {
        &self.lines
    }

    pub fn update(&mut self, ctx: &FrameContext) {
        for line in &mut self.lines {
            line.update(ctx, &self.geometry);
        }
        for particle in &mut self.particles {
            particle.update(ctx, &self.geometry);
        }
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface, ctx: &FrameContext) {
        for line in &self.lines {
            line.draw(surface);
        }

        let positions: Vec<Vec2> = self.particles.iter().map(|p| p.position).collect();
        self.connection.draw_connections(&positions, surface);

        for particle in &self.particles {
            particle.draw(surface, ctx);
        }

        // Pulsing centre cluster
        let center = self.geometry.center;
        let glow = RadialGradient::new(center, 80.0)
            .with_stop(0.0, Rgba::new(180, 0, 0, 0.3))
            .with_stop(0.5, Rgba::new(153, 0, 0, 0.2))
            .with_stop(1.0, Rgba::new(139, 0, 0, 0.0));
        surface.fill_circle_gradient(center, 60.0 + ctx.oscillate(0.002, 0.0) * 10.0, &glow);
    }
}

/// A field animation driven by the frame driver.
#[derive(Debug, Clone)]
pub enum FieldAnimation {
    Ambient(AmbientField),
    Sphere(SphereField),
}

impl FieldAnimation {
    pub fn bounds(&self) -> Vec2 {
        match self {
            FieldAnimation::Ambient(f) => f.bounds,
            FieldAnimation::Sphere(f) => f.bounds,
        }
    }

    /// Number of entities; constant for the life of the field.
    pub fn entity_count(&self) -> usize {
        match self {
            FieldAnimation::Ambient(f) => f.particles.len(),
            FieldAnimation::Sphere(f) => f.particles.len() + f.lines.len(),
        }
    }

    pub fn clear_mode(&self) -> ClearMode {
        match self {
            FieldAnimation::Ambient(_) => ClearMode::Clear,
            FieldAnimation::Sphere(f) => ClearMode::Fade(f.fade),
        }
    }

    /// Where the pointer is assumed to be when it is not over the surface.
    pub fn resting_pointer(&self) -> Vec2 {
        self.bounds() * 0.5
    }

    pub fn update(&mut self, ctx: &FrameContext) {
        match self {
            FieldAnimation::Ambient(f) => f.update(),
            FieldAnimation::Sphere(f) => f.update(ctx),
        }
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface, ctx: &FrameContext) {
        match self {
            FieldAnimation::Ambient(f) => f.draw(surface),
            FieldAnimation::Sphere(f) => f.draw(surface, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};

    fn style() -> ConnectionStyle {
        ConnectionStyle {
            threshold: 80.0,
            max_alpha: 0.5,
            color: Rgba::rgb(139, 0, 0),
            width: 1.0,
        }
    }

    #[test]
    fn test_strength_boundary() {
        let style = style();
        assert_eq!(style.strength(0.0), Some(1.0));
        assert_eq!(style.strength(40.0), Some(0.5));
        assert_eq!(style.strength(80.0), None);
        assert_eq!(style.strength(120.0), None);
    }

    #[test]
    fn test_connections_only_for_close_pairs() {
        let positions = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(30.0, 40.0), // 50 from the first
            Vec2::new(500.0, 500.0),
        ];
        let mut surface = RecordingSurface::new(600.0, 600.0);
        style().draw_connections(&positions, &mut surface);

        let lines: Vec<_> = surface.lines().collect();
        assert_eq!(lines.len(), 1);
        let (from, to, color) = lines[0];
        assert_eq!(from, positions[0]);
        assert_eq!(to, positions[1]);
        assert!((color.a - 0.5 * 30.0 / 80.0).abs() < 1e-6);
    }

    #[test]
    fn test_ambient_field_count_is_fixed() {
        let config = AmbientFieldConfig::default();
        let mut field = FieldAnimation::Ambient(AmbientField::new(&config, 9));
        let ctx = FrameContext::new(0.0, Vec2::ZERO);
        for _ in 0..100 {
            field.update(&ctx);
        }
        assert_eq!(field.entity_count(), config.particle_count);
        assert_eq!(field.clear_mode(), ClearMode::Clear);
    }

    #[test]
    fn test_ambient_draws_connections_before_particles() {
        let config = AmbientFieldConfig {
            particle_count: 2,
            ..Default::default()
        };
        let mut field = AmbientField::new(&config, 1);
        field.particles_mut()[0].position = Vec2::new(100.0, 100.0);
        field.particles_mut()[1].position = Vec2::new(110.0, 100.0);

        let mut surface = RecordingSurface::new(config.width, config.height);
        field.draw(&mut surface);
        assert!(matches!(surface.commands[0], DrawCommand::Line { .. }));
        assert!(matches!(surface.commands[1], DrawCommand::Circle { .. }));
        assert!(matches!(surface.commands[2], DrawCommand::Circle { .. }));
    }

    #[test]
    fn test_same_seed_same_field() {
        let config = SphereFieldConfig::default();
        let a = SphereField::new(&config, 77);
        let b = SphereField::new(&config, 77);
        assert_eq!(a.particles()[10].position, b.particles()[10].position);
        assert_eq!(a.lines()[3].points(), b.lines()[3].points());
    }

    #[test]
    fn test_sphere_field_fades_and_ends_with_core_glow() {
        let config = SphereFieldConfig {
            particle_count: 5,
            line_count: 2,
            ..Default::default()
        };
        let mut field = FieldAnimation::Sphere(SphereField::new(&config, 2));
        assert_eq!(field.clear_mode(), ClearMode::Fade(Rgba::new(0, 0, 0, 0.05)));
        assert_eq!(field.entity_count(), 7);

        let ctx = FrameContext::new(16.0, field.resting_pointer());
        field.update(&ctx);
        let mut surface = RecordingSurface::new(config.width, config.height);
        field.draw(&mut surface, &ctx);
        match surface.commands.last() {
            Some(DrawCommand::GradientCircle { center, .. }) => {
                assert_eq!(*center, Vec2::new(600.0, 450.0));
            }
            other => panic!("Expected core glow last, got {:?}", other),
        }
    }
}
