//! Joint poses for the walking figure.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::Serialize;

/// Body side. Left/right pairs mirror each other's sign conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// +1 for left, -1 for right.
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

/// The animated joints of the figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Joint {
    LeftUpperArm,
    RightUpperArm,
    LeftForearm,
    RightForearm,
    LeftUpperLeg,
    RightUpperLeg,
    LeftLowerLeg,
    RightLowerLeg,
}

impl Joint {
    pub const ALL: [Joint; 8] = [
        Joint::LeftUpperArm,
        Joint::RightUpperArm,
        Joint::LeftForearm,
        Joint::RightForearm,
        Joint::LeftUpperLeg,
        Joint::RightUpperLeg,
        Joint::LeftLowerLeg,
        Joint::RightLowerLeg,
    ];

    /// Scene node name of this joint.
    pub fn name(self) -> &'static str {
        match self {
            Joint::LeftUpperArm => "left_upper_arm",
            Joint::RightUpperArm => "right_upper_arm",
            Joint::LeftForearm => "left_forearm",
            Joint::RightForearm => "right_forearm",
            Joint::LeftUpperLeg => "left_upper_leg",
            Joint::RightUpperLeg => "right_upper_leg",
            Joint::LeftLowerLeg => "left_lower_leg",
            Joint::RightLowerLeg => "right_lower_leg",
        }
    }

    pub fn upper_arm(side: Side) -> Self {
        match side {
            Side::Left => Joint::LeftUpperArm,
            Side::Right => Joint::RightUpperArm,
        }
    }

    pub fn forearm(side: Side) -> Self {
        match side {
            Side::Left => Joint::LeftForearm,
            Side::Right => Joint::RightForearm,
        }
    }

    pub fn upper_leg(side: Side) -> Self {
        match side {
            Side::Left => Joint::LeftUpperLeg,
            Side::Right => Joint::RightUpperLeg,
        }
    }

    pub fn lower_leg(side: Side) -> Self {
        match side {
            Side::Left => Joint::LeftLowerLeg,
            Side::Right => Joint::RightLowerLeg,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Complete joint and root state for one frame. Recomputed from scratch every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    rotations: [Vec3; 8],
    /// Root translation.
    pub root_position: Vec3,
    /// Root rotation about the vertical axis, radians.
    pub root_yaw: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            rotations: [Vec3::ZERO; 8],
            root_position: Vec3::ZERO,
            root_yaw: 0.0,
        }
    }
}

impl Pose {
    /// Euler rotation (radians) of a joint.
    pub fn rotation(&self, joint: Joint) -> Vec3 {
        self.rotations[joint.index()]
    }

    pub fn rotation_mut(&mut self, joint: Joint) -> &mut Vec3 {
        &mut self.rotations[joint.index()]
    }

    pub fn set_rotation(&mut self, joint: Joint, rotation: Vec3) {
        self.rotations[joint.index()] = rotation;
    }

    /// Iterate all joints with their rotations.
    pub fn joints(&self) -> impl Iterator<Item = (Joint, Vec3)> + '_ {
        Joint::ALL.iter().map(move |&j| (j, self.rotation(j)))
    }

    /// Largest absolute component difference against another pose.
    pub fn max_difference(&self, other: &Pose) -> f32 {
        let joints = self
            .joints()
            .map(|(j, r)| (r - other.rotation(j)).abs().max_element())
            .fold(0.0f32, f32::max);
        let root = (self.root_position - other.root_position).abs().max_element();
        joints.max(root).max((self.root_yaw - other.root_yaw).abs())
    }
}

/// Serializable snapshot of a pose at a point in time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseRecord {
    pub time_ms: f64,
    pub phase: &'static str,
    pub progress: f32,
    pub joints: BTreeMap<&'static str, [f32; 3]>,
    pub root_position: [f32; 3],
    pub root_yaw: f32,
}

impl PoseRecord {
    pub fn new(time_ms: f64, phase: &'static str, progress: f32, pose: &Pose) -> Self {
        Self {
            time_ms,
            phase,
            progress,
            joints: pose.joints().map(|(j, r)| (j.name(), r.to_array())).collect(),
            root_position: pose.root_position.to_array(),
            root_yaw: pose.root_yaw,
        }
    }
}
