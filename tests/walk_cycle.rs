use std::f32::consts::FRAC_PI_3;

use portfolio_fx::pose::Joint;
use portfolio_fx::sequencer::{Phase, PhaseSequencer, WalkCycleConfig};

const EPS: f32 = 1e-5;

fn sequencer() -> PhaseSequencer {
    PhaseSequencer::new(WalkCycleConfig::default()).unwrap()
}

#[test]
fn test_evaluation_is_deterministic() {
    let seq = sequencer();
    for ms in [0.0, 1234.5, 4000.0, 6999.0, 123_456.0] {
        assert_eq!(seq.evaluate(ms / 1000.0), seq.evaluate(ms / 1000.0));
    }
}

#[test]
fn test_periodic_phase_and_joints() {
    let seq = sequencer();
    // Bob and yaw run on absolute time, so only joints and root z repeat per cycle
    let a = seq.evaluate(2.5);
    let b = seq.evaluate(10.5);
    assert_eq!(seq.sample(2.5).phase, seq.sample(10.5).phase);
    for joint in Joint::ALL {
        assert!((a.rotation(joint) - b.rotation(joint)).abs().max_element() < EPS);
    }
    assert!((a.root_position.z - b.root_position.z).abs() < EPS);
}

#[test]
fn test_mid_walk_leg_swing() {
    let seq = sequencer();
    let pose = seq.evaluate(2.0);
    let crouch = seq.config().crouch;
    let expected = (2.0f32 * 4.0).sin() * 0.4;
    assert!((pose.rotation(Joint::LeftUpperLeg).x - crouch - expected).abs() < EPS);
    assert!((pose.rotation(Joint::RightUpperLeg).x - crouch + expected).abs() < EPS);
}

#[test]
fn test_mid_walk_knees_and_arm_counter_swing() {
    let seq = sequencer();
    let pose = seq.evaluate(2.0);
    let swing = (8.0f32).sin() * 0.4;
    assert!(swing > 0.0);

    // Left leg swings forward: its knee stays at rest, the right knee bends
    assert!((pose.rotation(Joint::LeftLowerLeg).x - (-0.5 + (-swing * 0.6).max(0.0))).abs() < EPS);
    assert!((pose.rotation(Joint::RightLowerLeg).x - (-0.5 + (swing * 0.6).max(0.0))).abs() < EPS);
    assert!(pose.rotation(Joint::RightLowerLeg).x > -0.5 + 0.2);

    // Each arm swings against the leg on its own side
    assert!((pose.rotation(Joint::LeftUpperArm).x - (0.2 - swing * 0.3)).abs() < EPS);
    assert!((pose.rotation(Joint::RightUpperArm).x - (0.2 + swing * 0.3)).abs() < EPS);
    assert!((pose.rotation(Joint::LeftForearm).x - -0.3).abs() < EPS);
}

#[test]
fn test_knee_bends_only_on_backward_swing() {
    let seq = sequencer();
    for step in 1..400 {
        let t = step as f64 * 0.01;
        let pose = seq.evaluate(t);
        let swing = seq.leg_swing(t);
        let left_bend = pose.rotation(Joint::LeftLowerLeg).x + 0.5;
        let right_bend = pose.rotation(Joint::RightLowerLeg).x + 0.5;
        if swing > 1e-3 {
            assert!(left_bend.abs() < EPS && right_bend > 0.0, "t={}", t);
        } else if swing < -1e-3 {
            assert!(right_bend.abs() < EPS && left_bend > 0.0, "t={}", t);
        }
    }
}

#[test]
fn test_mid_fold_leg_swing_is_damped() {
    let seq = sequencer();
    let pose = seq.evaluate(5.0);
    let damped = (20.0f32).sin() * 0.4 * 0.5;
    assert!((pose.rotation(Joint::LeftUpperLeg).x - (0.3 + damped)).abs() < EPS);
    assert!((pose.rotation(Joint::RightUpperLeg).x - (0.3 - damped)).abs() < EPS);

    // Upper arm x is halfway from the damped walking value to the folded value
    let walking = 0.2 - damped * 0.3;
    let folded = 0.2 - 0.3;
    assert!((pose.rotation(Joint::LeftUpperArm).x - (walking + (folded - walking) * 0.5)).abs() < EPS);
    assert!((pose.rotation(Joint::LeftForearm).x - (-0.3 - 0.5 * 0.8)).abs() < EPS);
}

#[test]
fn test_mid_fold_arm_raise() {
    let seq = sequencer();
    let sample = seq.sample(5.0);
    assert_eq!(sample.phase, Phase::Folding);
    assert!((sample.progress - 0.5).abs() < EPS);

    let pose = seq.evaluate(5.0);
    assert!((pose.rotation(Joint::LeftUpperArm).z - 0.5 * FRAC_PI_3).abs() < EPS);
    assert!((pose.rotation(Joint::RightUpperArm).z + 0.5 * FRAC_PI_3).abs() < EPS);
}

#[test]
fn test_mid_hold_has_not_started_return() {
    let seq = sequencer();
    let hold_start = seq.evaluate(6.0);
    let mid_hold = seq.evaluate(7.0);
    assert_eq!(seq.sample(7.0).phase, Phase::Holding);
    assert!((mid_hold.root_position.z - hold_start.root_position.z).abs() < EPS);
}

#[test]
fn test_root_travel() {
    let seq = sequencer();
    assert!((seq.evaluate(0.0).root_position.z - -1.8).abs() < EPS);
    assert!((seq.evaluate(4.0).root_position.z - (-1.8 + 1.5)).abs() < EPS);
    assert!((seq.evaluate(2.0).root_position.z - (-1.8 + 0.75)).abs() < EPS);
}

#[test]
fn test_phase_boundaries_do_not_pop() {
    let seq = sequencer();
    for boundary in [4.0, 6.0, 8.0] {
        let before = seq.evaluate(boundary - 1e-6);
        let after = seq.evaluate(boundary);
        assert!(
            before.max_difference(&after) < 1e-3,
            "pose jumps at {}s by {}",
            boundary,
            before.max_difference(&after)
        );
    }
}

#[test]
fn test_bob_and_yaw_superimposed_in_every_phase() {
    let seq = sequencer();
    let config = seq.config();
    for t in [1.0f64, 5.0, 6.5, 7.5] {
        let pose = seq.evaluate(t);
        let bob = (t as f32 * config.bob_frequency).sin() * config.bob_amplitude;
        let yaw = (t as f32 * config.yaw_frequency).sin() * config.yaw_amplitude;
        assert!((pose.root_position.y - (config.base_height + bob)).abs() < EPS);
        assert!((pose.root_yaw - yaw).abs() < EPS);
    }
}

#[test]
fn test_custom_cycle_timing() {
    let config = WalkCycleConfig {
        cycle_secs: 4.0,
        walk_secs: 2.0,
        fold_secs: 1.0,
        hold_secs: 1.0,
        ..Default::default()
    };
    let seq = PhaseSequencer::new(config).unwrap();
    assert_eq!(seq.sample(1.9).phase, Phase::Walking);
    assert_eq!(seq.sample(2.5).phase, Phase::Folding);
    assert_eq!(seq.sample(3.5).phase, Phase::Holding);
    assert_eq!(seq.sample(4.1).phase, Phase::Walking);
}
