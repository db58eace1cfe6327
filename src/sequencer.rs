//! Walk-cycle phase sequencer.
//!
//! Maps elapsed time onto a repeating cycle of contiguous phases
//! (walk, fold arms, hold) and computes the figure's pose for that instant.
//! Evaluation is a pure function of the elapsed time: no state is carried
//! between frames.
//!
//! The hold phase contains a nested return: once its progress passes
//! `return_start`, the root and arms ease back (cubic ease-out) toward the
//! cycle's starting configuration so the next walk begins where it should.

use std::f32::consts::FRAC_PI_3;

use anyhow::{ensure, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::pose::{Joint, Pose, Side};

/// Named segment of the walk cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Walking,
    Folding,
    Holding,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Walking => "walking",
            Phase::Folding => "folding",
            Phase::Holding => "holding",
        }
    }
}

/// Walk-cycle timing and pose constants. Durations in seconds, angles in radians.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WalkCycleConfig {
    pub cycle_secs: f64,
    pub walk_secs: f64,
    pub fold_secs: f64,
    pub hold_secs: f64,

    /// Root z offset at the start of the walk.
    pub start_z: f32,
    /// Distance covered along +z during the walk.
    pub walk_distance: f32,

    /// Leg swing angular frequency (rad/s).
    pub swing_frequency: f32,
    pub swing_amplitude: f32,
    /// Knee bend per unit of opposite-direction leg swing.
    pub knee_coupling: f32,
    /// Arm counter-swing per unit of leg swing.
    pub arm_counter_swing: f32,

    pub crouch: f32,
    pub lower_leg_rest: f32,
    pub arm_rest: f32,
    pub forearm_rest: f32,

    /// Shoulder raise (z rotation) of the fully folded pose.
    pub fold_raise: f32,
    /// Additional elbow bend of the fully folded pose.
    pub fold_elbow: f32,
    /// Forward arm rotation of the fully folded pose.
    pub fold_forward: f32,

    /// Hold progress after which the return toward the start begins.
    pub return_start: f32,

    pub base_height: f32,
    pub bob_frequency: f32,
    pub bob_amplitude: f32,
    pub yaw_frequency: f32,
    pub yaw_amplitude: f32,
}

impl Default for WalkCycleConfig {
    fn default() -> Self {
        Self {
            cycle_secs: 8.0,
            walk_secs: 4.0,
            fold_secs: 2.0,
            hold_secs: 2.0,
            start_z: -1.8,
            walk_distance: 1.5,
            swing_frequency: 4.0,
            swing_amplitude: 0.4,
            knee_coupling: 0.6,
            arm_counter_swing: 0.3,
            crouch: 0.3,
            lower_leg_rest: -0.5,
            arm_rest: 0.2,
            forearm_rest: -0.3,
            fold_raise: FRAC_PI_3,
            fold_elbow: 0.8,
            fold_forward: 0.3,
            return_start: 0.5,
            base_height: -0.4,
            bob_frequency: 1.5,
            bob_amplitude: 0.02,
            yaw_frequency: 0.3,
            yaw_amplitude: 0.15,
        }
    }
}

impl WalkCycleConfig {
    /// Check that the phase table is well formed.
    pub fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("walk", self.walk_secs),
            ("fold", self.fold_secs),
            ("hold", self.hold_secs),
        ] {
            ensure!(
                secs.is_finite() && secs > 0.0,
                "{} phase duration must be positive, got {}",
                name,
                secs
            );
        }
        let total = self.walk_secs + self.fold_secs + self.hold_secs;
        ensure!(
            (total - self.cycle_secs).abs() < 1e-6,
            "Phase durations sum to {}s but the cycle is {}s",
            total,
            self.cycle_secs
        );
        ensure!(
            (0.0..1.0).contains(&self.return_start),
            "returnStart must be in [0, 1), got {}",
            self.return_start
        );
        Ok(())
    }
}

/// A phase with its half-open time span within the cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSpan {
    pub phase: Phase,
    pub start: f64,
    pub end: f64,
}

/// Where in the cycle a given time falls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSample {
    pub phase: Phase,
    /// Fraction of the active phase elapsed, 0..1.
    pub progress: f32,
    /// Elapsed time wrapped into the cycle, seconds.
    pub cycle_time: f64,
}

/// Cubic ease-out: fast start, gentle arrival.
pub fn ease_out_cubic(t: f32) -> f32 {
    let t1 = t - 1.0;
    t1 * t1 * t1 + 1.0
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Time-driven walk cycle.
#[derive(Debug, Clone)]
pub struct PhaseSequencer {
    config: WalkCycleConfig,
    spans: [PhaseSpan; 3],
}

impl PhaseSequencer {
    pub fn new(config: WalkCycleConfig) -> Result<Self> {
        config.validate()?;

        let walk_end = config.walk_secs;
        let fold_end = walk_end + config.fold_secs;
        let spans = [
            PhaseSpan { phase: Phase::Walking, start: 0.0, end: walk_end },
            PhaseSpan { phase: Phase::Folding, start: walk_end, end: fold_end },
            PhaseSpan { phase: Phase::Holding, start: fold_end, end: config.cycle_secs },
        ];
        log::info!(
            "Walk cycle: {}s (walk {}s, fold {}s, hold {}s)",
            config.cycle_secs,
            config.walk_secs,
            config.fold_secs,
            config.hold_secs
        );
        Ok(Self { config, spans })
    }

    pub fn config(&self) -> &WalkCycleConfig {
        &self.config
    }

    pub fn spans(&self) -> &[PhaseSpan] {
        &self.spans
    }

    /// Locate the active phase for an elapsed time in seconds.
    pub fn sample(&self, elapsed_secs: f64) -> PhaseSample {
        let cycle_time = elapsed_secs.rem_euclid(self.config.cycle_secs);
        let span = self
            .spans
            .iter()
            .find(|s| cycle_time >= s.start && cycle_time < s.end)
            // rem_euclid can round up to exactly the cycle length
            .unwrap_or(&self.spans[2]);
        let progress = ((cycle_time - span.start) / (span.end - span.start)).clamp(0.0, 1.0);
        PhaseSample {
            phase: span.phase,
            progress: progress as f32,
            cycle_time,
        }
    }

    /// Signed leg swing at a time within the cycle, before any damping.
    ///
    /// Driven by cycle time so the swing restarts from zero with each walk.
    pub fn leg_swing(&self, cycle_time: f64) -> f32 {
        ((cycle_time * self.config.swing_frequency as f64).sin() as f32) * self.config.swing_amplitude
    }

    /// Root z at the end of the walk; held through fold and the first part of hold.
    pub fn end_z(&self) -> f32 {
        self.config.start_z + self.config.walk_distance
    }

    /// Compute the full pose for an elapsed time in seconds.
    pub fn evaluate(&self, elapsed_secs: f64) -> Pose {
        let sample = self.sample(elapsed_secs);
        self.evaluate_sample(elapsed_secs, &sample)
    }

    /// Compute the pose for an already located phase sample.
    pub fn evaluate_sample(&self, elapsed_secs: f64, sample: &PhaseSample) -> Pose {
        let c = &self.config;
        let p = sample.progress;
        let mut pose = Pose::default();

        let root_z = match sample.phase {
            Phase::Walking => {
                let swing = self.leg_swing(sample.cycle_time);
                self.set_legs(&mut pose, swing);
                self.set_walking_arms(&mut pose, swing);
                lerp(c.start_z, self.end_z(), p)
            }
            Phase::Folding => {
                // Leg swing settles as the fold completes
                let swing = self.leg_swing(sample.cycle_time) * (1.0 - p);
                self.set_legs(&mut pose, swing);
                self.set_walking_arms(&mut pose, swing);
                self.blend_folded_arms(&mut pose, p);
                self.end_z()
            }
            Phase::Holding => {
                self.set_legs(&mut pose, 0.0);
                self.set_walking_arms(&mut pose, 0.0);
                if p > c.return_start {
                    let back = ease_out_cubic((p - c.return_start) / (1.0 - c.return_start));
                    self.blend_folded_arms(&mut pose, 1.0 - back);
                    lerp(self.end_z(), c.start_z, back)
                } else {
                    self.blend_folded_arms(&mut pose, 1.0);
                    self.end_z()
                }
            }
        };

        let t = elapsed_secs;
        let bob = (t * c.bob_frequency as f64).sin() as f32 * c.bob_amplitude;
        pose.root_position = Vec3::new(0.0, c.base_height + bob, root_z);
        pose.root_yaw = (t * c.yaw_frequency as f64).sin() as f32 * c.yaw_amplitude;
        pose
    }

    /// Crouched legs in antiphase; knees only ever bend forward.
    fn set_legs(&self, pose: &mut Pose, swing: f32) {
        let c = &self.config;
        for side in [Side::Left, Side::Right] {
            let signed = swing * side.sign();
            pose.rotation_mut(Joint::upper_leg(side)).x = c.crouch + signed;
            pose.rotation_mut(Joint::lower_leg(side)).x =
                c.lower_leg_rest + (-signed * c.knee_coupling).max(0.0);
        }
    }

    /// Relaxed arms counter-swinging against the same-side leg.
    fn set_walking_arms(&self, pose: &mut Pose, swing: f32) {
        let c = &self.config;
        for side in [Side::Left, Side::Right] {
            let arm = pose.rotation_mut(Joint::upper_arm(side));
            arm.x = c.arm_rest - swing * side.sign() * c.arm_counter_swing;
            arm.z = 0.0;
            pose.rotation_mut(Joint::forearm(side)).x = c.forearm_rest;
        }
    }

    /// Cross-fade the current arm pose toward the folded pose by `amount`.
    fn blend_folded_arms(&self, pose: &mut Pose, amount: f32) {
        let c = &self.config;
        for side in [Side::Left, Side::Right] {
            let arm = pose.rotation_mut(Joint::upper_arm(side));
            arm.x = lerp(arm.x, c.arm_rest - c.fold_forward, amount);
            // Shoulders raise in opposite z directions
            arm.z = amount * c.fold_raise * side.sign();
            pose.rotation_mut(Joint::forearm(side)).x = c.forearm_rest - amount * c.fold_elbow;
        }
    }
}
