//! Scene graph for pose-driven models.
//!
//! A hierarchy of named transform nodes. Animation code only writes rotation
//! and position fields on nodes it looks up by name; mesh and material
//! construction belong to the host renderer.

use std::collections::HashMap;

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Unique identifier for scene nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// Transform component for scene nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3, // Euler angles in radians, XYZ order
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local matrix: scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

/// A node in the hierarchy.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// The scene graph - owns all nodes of the modeled figures.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, SceneNode>,
    names: HashMap<String, NodeId>,
    roots: Vec<NodeId>,
    next_id: u64,
    repaint_requested: bool,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            names: HashMap::new(),
            roots: Vec::new(),
            next_id: 1,
            repaint_requested: false,
        }
    }

    /// Generate a new unique node ID.
    fn new_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a node under `parent` (or as a root) and return its ID.
    ///
    /// Returns None if the parent doesn't exist. A repeated name shadows the
    /// earlier node for name lookups.
    pub fn add_node(&mut self, name: &str, transform: Transform, parent: Option<NodeId>) -> Option<NodeId> {
        if let Some(parent) = parent {
            if !self.nodes.contains_key(&parent) {
                return None;
            }
        }

        let id = self.new_id();
        self.nodes.insert(
            id,
            SceneNode {
                name: name.to_string(),
                transform,
                parent,
                children: Vec::new(),
            },
        );
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent_node) => parent_node.children.push(id),
            None => self.roots.push(id),
        }
        self.names.insert(name.to_string(), id);
        Some(id)
    }

    /// Look up a node by name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.nodes.get(&id).map(|n| &n.transform)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.nodes.get_mut(&id).map(|n| &mut n.transform)
    }

    /// Root-to-node composed matrix.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let node = self.nodes.get(&id)?;
        let local = node.transform.matrix();
        match node.parent {
            Some(parent) => Some(self.world_matrix(parent)? * local),
            None => Some(local),
        }
    }

    /// World-space position of a node's origin.
    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| m.transform_point3(Vec3::ZERO))
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ask the host to repaint on its next render pass.
    pub fn request_repaint(&mut self) {
        self.repaint_requested = true;
    }

    /// Consume a pending repaint request.
    pub fn take_repaint_request(&mut self) -> bool {
        std::mem::take(&mut self.repaint_requested)
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_find() {
        let mut scene = SceneGraph::new();
        let root = scene.add_node("root", Transform::default(), None).unwrap();
        let child = scene.add_node("child", Transform::default(), Some(root)).unwrap();

        assert_eq!(scene.find("child"), Some(child));
        assert_eq!(scene.get(root).unwrap().children, vec![child]);
        assert_eq!(scene.roots(), &[root]);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_missing_parent_rejected() {
        let mut scene = SceneGraph::new();
        assert!(scene.add_node("orphan", Transform::default(), Some(NodeId(99))).is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_world_position_composes_parents() {
        let mut scene = SceneGraph::new();
        let root = scene
            .add_node("root", Transform::at(Vec3::new(1.0, 0.0, 0.0)).with_scale(Vec3::splat(2.0)), None)
            .unwrap();
        let child = scene
            .add_node("child", Transform::at(Vec3::new(0.0, 1.0, 0.0)), Some(root))
            .unwrap();

        let world = scene.world_position(child).unwrap();
        assert!((world - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_rotation_moves_children() {
        let mut scene = SceneGraph::new();
        let joint = scene.add_node("joint", Transform::default(), None).unwrap();
        let tip = scene
            .add_node("tip", Transform::at(Vec3::new(0.0, -1.0, 0.0)), Some(joint))
            .unwrap();

        scene.transform_mut(joint).unwrap().rotation.x = std::f32::consts::FRAC_PI_2;
        let world = scene.world_position(tip).unwrap();
        // Rotating +90° about X swings -Y onto -Z
        assert!((world - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_repaint_request_is_consumed() {
        let mut scene = SceneGraph::new();
        assert!(!scene.take_repaint_request());
        scene.request_repaint();
        assert!(scene.take_repaint_request());
        assert!(!scene.take_repaint_request());
    }
}
