//! Procedurally animated entities.
//!
//! Entities are created once with randomized parameters drawn from fixed
//! distributions, then mutated every frame. All shared state (clock, pointer,
//! surface bounds, sphere geometry) is passed in explicitly; nothing is captured.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

use crate::surface::{DrawSurface, RadialGradient, Rgba};

/// Per-frame context shared by every entity in a field.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Milliseconds since the animation clock started.
    pub time_ms: f64,
    /// Pointer position in surface space.
    pub pointer: Vec2,
}

impl FrameContext {
    pub fn new(time_ms: f64, pointer: Vec2) -> Self {
        Self { time_ms, pointer }
    }

    /// `sin(time_ms * frequency + phase)`, evaluated in f64 so long sessions keep precision.
    pub fn oscillate(&self, frequency: f64, phase: f64) -> f32 {
        (self.time_ms * frequency + phase).sin() as f32
    }
}

/// Deterministic xorshift64 generator for entity parameters.
#[derive(Clone, Debug)]
pub struct EntityRng {
    state: u64,
}

impl EntityRng {
    pub fn new(seed: u64) -> Self {
        // Seed 0 is degenerate for xorshift (produces all zeros)
        let state = if seed == 0 { 0x5DEECE66D } else { seed };
        Self { state }
    }

    /// Uniform sample in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        (self.state >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform sample in [min, max).
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Uniform sample in [-half_width, half_width).
    pub fn centered(&mut self, half_width: f32) -> f32 {
        (self.next_f32() - 0.5) * 2.0 * half_width
    }
}

/// Wrap a coordinate toroidally: leaving one edge re-enters at the opposite edge.
pub fn wrap_coordinate(value: f32, extent: f32) -> f32 {
    if value > extent {
        0.0
    } else if value < 0.0 {
        extent
    } else {
        value
    }
}

/// Instantaneous positional correction pushing an entity away from the pointer.
///
/// Zero at or beyond `reaction_radius`; grows linearly to `max_force` as the
/// distance shrinks. A pointer exactly on the entity has no direction and
/// yields no displacement.
pub fn repulsion(position: Vec2, pointer: Vec2, reaction_radius: f32, max_force: f32) -> Vec2 {
    let delta = pointer - position;
    let distance_squared = delta.length_squared();
    if distance_squared >= reaction_radius * reaction_radius || distance_squared <= f32::EPSILON {
        return Vec2::ZERO;
    }
    let distance = distance_squared.sqrt();
    let force = (reaction_radius - distance) / reaction_radius;
    -(delta / distance) * force * max_force
}

/// A free-drifting dot on a toroidal surface.
#[derive(Debug, Clone)]
pub struct DriftParticle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub opacity: f32,
}

impl DriftParticle {
    pub fn new(
        rng: &mut EntityRng,
        bounds: Vec2,
        max_speed: f32,
        size_range: [f32; 2],
        opacity_range: [f32; 2],
    ) -> Self {
        Self {
            position: Vec2::new(rng.next_f32() * bounds.x, rng.next_f32() * bounds.y),
            size: rng.range(size_range[0], size_range[1]),
            velocity: Vec2::new(rng.centered(max_speed), rng.centered(max_speed)),
            opacity: rng.range(opacity_range[0], opacity_range[1]),
        }
    }

    /// Advance by one frame of velocity, wrapping at the surface edges.
    pub fn update(&mut self, bounds: Vec2) {
        let next = self.position + self.velocity;
        self.position = Vec2::new(
            wrap_coordinate(next.x, bounds.x),
            wrap_coordinate(next.y, bounds.y),
        );
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface, color: Rgba) {
        surface.fill_circle(self.position, self.size, color.with_alpha(self.opacity * 0.5));
    }
}

/// Shared geometry of the glowing sphere.
#[derive(Debug, Clone, Copy)]
pub struct SphereGeometry {
    pub center: Vec2,
    pub radius: f32,
    pub reaction_radius: f32,
    pub max_repulsion: f32,
    pub pulse_amplitude: f32,
}

impl SphereGeometry {
    /// Project spherical coordinates onto the surface plane.
    pub fn project(&self, radius: f32, azimuth: f32, polar: f32) -> Vec2 {
        self.center + Vec2::new(azimuth.cos(), azimuth.sin()) * radius * polar.sin()
    }
}

const SPHERE_CORE: Rgba = Rgba::rgb(153, 0, 0);
const SPHERE_MID: Rgba = Rgba::rgb(139, 0, 0);
const SPHERE_EDGE: Rgba = Rgba::new(102, 0, 0, 0.0);

/// A particle orbiting on the sphere shell with a breathing radius.
#[derive(Debug, Clone)]
pub struct SphereParticle {
    pub azimuth: f32,
    pub polar: f32,
    pub base_radius: f32,
    pub azimuth_speed: f32,
    pub polar_speed: f32,
    pub size: f32,
    pub opacity: f32,
    pub pulse_speed: f64,
    pub pulse_offset: f64,
    pub position: Vec2,
}

impl SphereParticle {
    pub fn new(rng: &mut EntityRng, geometry: &SphereGeometry) -> Self {
        let azimuth = rng.next_f32() * TAU;
        let polar = rng.next_f32() * PI;
        let base_radius = geometry.radius * rng.range(0.7, 1.0);
        Self {
            azimuth,
            polar,
            base_radius,
            size: rng.range(1.5, 4.0),
            opacity: rng.range(0.4, 1.0),
            pulse_speed: rng.range(0.001, 0.003) as f64,
            pulse_offset: rng.range(0.0, 1000.0) as f64,
            azimuth_speed: rng.centered(0.0025),
            polar_speed: rng.centered(0.0015),
            position: geometry.project(base_radius, azimuth, polar),
        }
    }

    /// Shell radius at the frame's time; stays within `base_radius ± pulse_amplitude`.
    pub fn radius_at(&self, ctx: &FrameContext, geometry: &SphereGeometry) -> f32 {
        self.base_radius + ctx.oscillate(self.pulse_speed, self.pulse_offset) * geometry.pulse_amplitude
    }

    pub fn update(&mut self, ctx: &FrameContext, geometry: &SphereGeometry) {
        self.azimuth += self.azimuth_speed;
        self.polar += self.polar_speed;

        let radius = self.radius_at(ctx, geometry);
        let projected = geometry.project(radius, self.azimuth, self.polar);
        self.position = projected
            + repulsion(
                projected,
                ctx.pointer,
                geometry.reaction_radius,
                geometry.max_repulsion,
            );
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface, ctx: &FrameContext) {
        let glow = 0.6 + ctx.oscillate(0.002, self.pulse_offset) * 0.3;

        let gradient = RadialGradient::new(self.position, self.size * 3.0)
            .with_stop(0.0, SPHERE_CORE.with_alpha(self.opacity * glow))
            .with_stop(0.4, SPHERE_MID.with_alpha(self.opacity * 0.6))
            .with_stop(1.0, SPHERE_EDGE);
        surface.fill_circle_gradient(self.position, self.size, &gradient);

        // Bright core
        surface.fill_circle(
            self.position,
            self.size * 0.4,
            Rgba::WHITE.with_alpha(self.opacity * 0.8),
        );
    }
}

/// A spiral strand sweeping across the sphere.
#[derive(Debug, Clone)]
pub struct FlowingLine {
    pub azimuth: f32,
    pub azimuth_speed: f32,
    pub polar: f32,
    pub polar_speed: f32,
    pub offset: f64,
    segment_count: usize,
    points: Vec<Vec2>,
}

impl FlowingLine {
    pub fn new(
        rng: &mut EntityRng,
        segment_count: usize,
        ctx: &FrameContext,
        geometry: &SphereGeometry,
    ) -> Self {
        let mut line = Self {
            azimuth: rng.next_f32() * TAU,
            azimuth_speed: rng.centered(0.01),
            polar: rng.next_f32() * PI,
            polar_speed: rng.centered(0.005),
            offset: rng.range(0.0, 1000.0) as f64,
            segment_count,
            points: Vec::with_capacity(segment_count),
        };
        line.rebuild_points(ctx, geometry);
        line
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    fn rebuild_points(&mut self, ctx: &FrameContext, geometry: &SphereGeometry) {
        let breathe = 0.8 + ctx.oscillate(0.001, self.offset) * 0.2;
        self.points.clear();
        for i in 0..self.segment_count {
            let t = i as f32 / self.segment_count as f32;
            let radius = geometry.radius * (0.3 + t * 0.7) * breathe;
            self.points.push(geometry.project(
                radius,
                self.azimuth + t * 0.5,
                self.polar + t * PI,
            ));
        }
    }

    pub fn update(&mut self, ctx: &FrameContext, geometry: &SphereGeometry) {
        self.azimuth += self.azimuth_speed;
        self.polar += self.polar_speed;
        self.rebuild_points(ctx, geometry);
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface) {
        if self.points.len() < 2 {
            return;
        }
        surface.stroke_polyline(&self.points, SPHERE_CORE.with_alpha(0.3), 1.5);

        // Glowing nodes, brighter toward the outer end
        let count = self.points.len() as f32;
        for (index, point) in self.points.iter().enumerate().step_by(3) {
            let alpha = index as f32 / count;
            let gradient = RadialGradient::new(*point, 3.0)
                .with_stop(0.0, SPHERE_CORE.with_alpha(0.8 * alpha))
                .with_stop(1.0, SPHERE_MID.with_alpha(0.0));
            surface.fill_circle_gradient(*point, 3.0, &gradient);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};

    fn geometry() -> SphereGeometry {
        SphereGeometry {
            center: Vec2::new(600.0, 450.0),
            radius: 250.0,
            reaction_radius: 120.0,
            max_repulsion: 10.0,
            pulse_amplitude: 20.0,
        }
    }

    #[test]
    fn test_rng_is_deterministic_and_in_range() {
        let mut a = EntityRng::new(42);
        let mut b = EntityRng::new(42);
        for _ in 0..1000 {
            let v = a.next_f32();
            assert_eq!(v, b.next_f32());
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_zero_seed_is_not_degenerate() {
        let mut rng = EntityRng::new(0);
        let samples: Vec<f32> = (0..10).map(|_| rng.next_f32()).collect();
        assert!(samples.iter().any(|&v| v > 0.0));
    }

    #[test]
    fn test_wrap_coordinate() {
        assert_eq!(wrap_coordinate(101.0, 100.0), 0.0);
        assert_eq!(wrap_coordinate(-0.1, 100.0), 100.0);
        assert_eq!(wrap_coordinate(50.0, 100.0), 50.0);
        assert_eq!(wrap_coordinate(100.0, 100.0), 100.0);
    }

    #[test]
    fn test_drift_particle_stays_in_bounds() {
        let bounds = Vec2::new(320.0, 200.0);
        let mut rng = EntityRng::new(7);
        let mut particle = DriftParticle::new(&mut rng, bounds, 0.25, [1.0, 3.0], [0.2, 0.7]);
        particle.velocity = Vec2::new(3.7, -2.9);
        for _ in 0..10_000 {
            particle.update(bounds);
            assert!((0.0..=bounds.x).contains(&particle.position.x));
            assert!((0.0..=bounds.y).contains(&particle.position.y));
        }
    }

    #[test]
    fn test_repulsion_zero_at_boundary() {
        let pointer = Vec2::new(100.0, 100.0);
        let at_edge = pointer + Vec2::new(120.0, 0.0);
        assert_eq!(repulsion(at_edge, pointer, 120.0, 10.0), Vec2::ZERO);
        let outside = pointer + Vec2::new(0.0, 130.0);
        assert_eq!(repulsion(outside, pointer, 120.0, 10.0), Vec2::ZERO);
    }

    #[test]
    fn test_repulsion_grows_toward_pointer() {
        let pointer = Vec2::ZERO;
        let mut last = 0.0;
        for distance in [110.0, 80.0, 40.0, 10.0, 1.0] {
            let push = repulsion(Vec2::new(distance, 0.0), pointer, 120.0, 10.0);
            // Pushed away from the pointer along +x
            assert!(push.x > 0.0);
            assert!(push.length() > last);
            assert!(push.length() <= 10.0);
            last = push.length();
        }
    }

    #[test]
    fn test_repulsion_with_pointer_on_entity() {
        assert_eq!(repulsion(Vec2::ONE, Vec2::ONE, 120.0, 10.0), Vec2::ZERO);
    }

    #[test]
    fn test_sphere_particle_radius_band() {
        let geometry = geometry();
        let mut rng = EntityRng::new(11);
        let particle = SphereParticle::new(&mut rng, &geometry);
        assert!(particle.base_radius >= geometry.radius * 0.7);
        assert!(particle.base_radius <= geometry.radius);
        for step in 0..500 {
            let ctx = FrameContext::new(step as f64 * 16.7, Vec2::new(-1000.0, -1000.0));
            let r = particle.radius_at(&ctx, &geometry);
            assert!((r - particle.base_radius).abs() <= geometry.pulse_amplitude + 1e-3);
        }
    }

    #[test]
    fn test_sphere_particle_avoids_pointer() {
        let geometry = geometry();
        let mut rng = EntityRng::new(3);
        let mut particle = SphereParticle::new(&mut rng, &geometry);
        particle.azimuth_speed = 0.0;
        particle.polar_speed = 0.0;

        let far = FrameContext::new(0.0, Vec2::new(-5000.0, -5000.0));
        particle.update(&far, &geometry);
        let resting = particle.position;

        let near = FrameContext::new(0.0, resting + Vec2::new(30.0, 0.0));
        particle.update(&near, &geometry);
        assert!(particle.position.x < resting.x);
        assert!((particle.position.y - resting.y).abs() < 1e-3);
    }

    #[test]
    fn test_flowing_line_draws_path_then_nodes() {
        let geometry = geometry();
        let mut rng = EntityRng::new(5);
        let ctx = FrameContext::new(0.0, geometry.center);
        let line = FlowingLine::new(&mut rng, 20, &ctx, &geometry);
        assert_eq!(line.points().len(), 20);

        let mut surface = RecordingSurface::new(1200.0, 900.0);
        line.draw(&mut surface);
        assert!(matches!(surface.commands[0], DrawCommand::Polyline { .. }));
        // Nodes at indices 0, 3, ..., 18
        let nodes = surface
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::GradientCircle { .. }))
            .count();
        assert_eq!(nodes, 7);
    }
}
