//! The walking robot's joint hierarchy.
//!
//! Builds the transform nodes the walk cycle drives (root plus the eight limb
//! joints, with the attachment nodes hanging off them) at their rest pose, and
//! writes evaluated poses back onto those nodes.

use anyhow::{anyhow, Result};
use glam::Vec3;

use crate::pose::{Joint, Pose, Side};
use crate::scene_graph::{NodeId, SceneGraph, Transform};

pub const ROOT_NAME: &str = "robot";

/// Handles to the animated nodes of one robot in a scene graph.
#[derive(Debug, Clone)]
pub struct RobotRig {
    root: NodeId,
    joints: [NodeId; 8],
}

impl RobotRig {
    /// Create the robot's nodes in `scene` in the crouched rest pose.
    pub fn build(scene: &mut SceneGraph) -> Result<Self> {
        let root = add(
            scene,
            ROOT_NAME,
            Transform::at(Vec3::new(0.0, -0.4, -1.8))
                .with_scale(Vec3::splat(1.2))
                .with_rotation(Vec3::new(0.1, 0.0, 0.0)), // slight forward lean
            None,
        )?;
        add(scene, "head", Transform::at(Vec3::new(0.0, 1.25, 0.0)), Some(root))?;
        add(scene, "torso", Transform::at(Vec3::new(0.0, 0.7, 0.0)), Some(root))?;

        let mut joints = [root; 8];
        for (side, x) in [(Side::Left, -1.0f32), (Side::Right, 1.0)] {
            let prefix = match side {
                Side::Left => "left",
                Side::Right => "right",
            };
            let upper_arm = add(
                scene,
                Joint::upper_arm(side).name(),
                Transform::at(Vec3::new(0.35 * x, 0.7, 0.0)).with_rotation(Vec3::new(0.2, 0.0, 0.0)),
                Some(root),
            )?;
            add(scene, &format!("{}_elbow", prefix), Transform::at(Vec3::new(0.0, -0.16, 0.0)), Some(upper_arm))?;
            let forearm = add(
                scene,
                Joint::forearm(side).name(),
                Transform::at(Vec3::new(0.0, -0.3, 0.0)).with_rotation(Vec3::new(-0.3, 0.0, 0.0)),
                Some(upper_arm),
            )?;
            add(scene, &format!("{}_hand", prefix), Transform::at(Vec3::new(0.0, -0.16, 0.0)), Some(forearm))?;

            let upper_leg = add(
                scene,
                Joint::upper_leg(side).name(),
                Transform::at(Vec3::new(0.13 * x, 0.2, 0.0)).with_rotation(Vec3::new(0.3, 0.0, 0.0)),
                Some(root),
            )?;
            add(scene, &format!("{}_knee", prefix), Transform::at(Vec3::new(0.0, -0.18, 0.0)), Some(upper_leg))?;
            let lower_leg = add(
                scene,
                Joint::lower_leg(side).name(),
                Transform::at(Vec3::new(0.0, -0.32, 0.0)).with_rotation(Vec3::new(-0.5, 0.0, 0.0)),
                Some(upper_leg),
            )?;
            add(scene, &format!("{}_foot", prefix), Transform::at(Vec3::new(0.0, -0.18, 0.03)), Some(lower_leg))?;

            joints[Joint::upper_arm(side).index()] = upper_arm;
            joints[Joint::forearm(side).index()] = forearm;
            joints[Joint::upper_leg(side).index()] = upper_leg;
            joints[Joint::lower_leg(side).index()] = lower_leg;
        }

        log::debug!("Built robot rig with {} nodes", scene.len());
        Ok(Self { root, joints })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn joint(&self, joint: Joint) -> NodeId {
        self.joints[joint.index()]
    }

    /// Write a pose onto the rig's nodes and request a repaint.
    ///
    /// Only rotation and position fields are touched; the root keeps its
    /// forward lean and scale.
    pub fn apply(&self, pose: &Pose, scene: &mut SceneGraph) {
        for (joint, rotation) in pose.joints() {
            if let Some(transform) = scene.transform_mut(self.joint(joint)) {
                transform.rotation = rotation;
            }
        }
        if let Some(root) = scene.transform_mut(self.root) {
            root.position = pose.root_position;
            root.rotation.y = pose.root_yaw;
        }
        scene.request_repaint();
    }
}

fn add(scene: &mut SceneGraph, name: &str, transform: Transform, parent: Option<NodeId>) -> Result<NodeId> {
    scene
        .add_node(name, transform, parent)
        .ok_or_else(|| anyhow!("Cannot attach rig node '{}': parent {:?} is not in the scene", name, parent))
}
