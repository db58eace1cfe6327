//! Pointer-following effects: the custom cursor and the tilting name heading.

use glam::Vec2;

/// Two-part cursor that trails the pointer: a slow outer ring and a quicker dot.
#[derive(Debug, Clone)]
pub struct CursorFollower {
    pub target: Vec2,
    pub ring: Vec2,
    pub dot: Vec2,
    ring_factor: f32,
    dot_factor: f32,
}

impl Default for CursorFollower {
    fn default() -> Self {
        Self::new(0.15, 0.25)
    }
}

impl CursorFollower {
    pub fn new(ring_factor: f32, dot_factor: f32) -> Self {
        Self {
            target: Vec2::ZERO,
            ring: Vec2::ZERO,
            dot: Vec2::ZERO,
            ring_factor,
            dot_factor,
        }
    }

    pub fn pointer_moved(&mut self, position: Vec2) {
        self.target = position;
    }

    /// Close a fixed fraction of the remaining gap; call once per frame.
    pub fn update(&mut self) {
        self.ring += (self.target - self.ring) * self.ring_factor;
        self.dot += (self.target - self.dot) * self.dot_factor;
    }
}

/// Rotation (degrees) of the 3D name heading in response to the pointer.
#[derive(Debug, Clone)]
pub struct NameTilt {
    /// x: rotateX, y: rotateY, in degrees.
    pub rotation: Vec2,
    max_degrees: f32,
    return_factor: f32,
    snap_degrees: f32,
    returning: bool,
}

impl Default for NameTilt {
    fn default() -> Self {
        Self {
            rotation: Vec2::ZERO,
            max_degrees: 30.0,
            return_factor: 0.1,
            snap_degrees: 0.1,
            returning: false,
        }
    }
}

impl NameTilt {
    /// Tilt toward a pointer given relative to the heading's centre.
    ///
    /// Applied immediately so fast pointer movement never lags.
    pub fn pointer_moved(&mut self, offset: Vec2, heading_size: Vec2) {
        if heading_size.x <= 0.0 || heading_size.y <= 0.0 {
            return;
        }
        self.returning = false;
        self.rotation = Vec2::new(
            -(offset.y / heading_size.y) * self.max_degrees,
            (offset.x / heading_size.x) * self.max_degrees,
        );
    }

    /// Start easing back to flat.
    pub fn pointer_left(&mut self) {
        self.returning = true;
    }

    /// Advance the return animation one frame. Returns true while still moving.
    pub fn update(&mut self) -> bool {
        if !self.returning {
            return false;
        }
        self.rotation -= self.rotation * self.return_factor;
        if self.rotation.x.abs() > self.snap_degrees || self.rotation.y.abs() > self.snap_degrees {
            true
        } else {
            self.rotation = Vec2::ZERO;
            self.returning = false;
            false
        }
    }

    pub fn css_transform(&self) -> String {
        format!("rotateX({}deg) rotateY({}deg)", self.rotation.x, self.rotation.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_leads_ring() {
        let mut cursor = CursorFollower::default();
        cursor.pointer_moved(Vec2::new(100.0, 0.0));
        cursor.update();
        assert!((cursor.ring.x - 15.0).abs() < 1e-4);
        assert!((cursor.dot.x - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_cursor_converges() {
        let mut cursor = CursorFollower::default();
        cursor.pointer_moved(Vec2::new(40.0, -20.0));
        for _ in 0..200 {
            cursor.update();
        }
        assert!((cursor.ring - cursor.target).length() < 1e-3);
    }

    #[test]
    fn test_tilt_follows_pointer() {
        let mut tilt = NameTilt::default();
        tilt.pointer_moved(Vec2::new(50.0, 25.0), Vec2::new(200.0, 100.0));
        assert!((tilt.rotation.x - -7.5).abs() < 1e-5);
        assert!((tilt.rotation.y - 7.5).abs() < 1e-5);
        assert_eq!(tilt.css_transform(), "rotateX(-7.5deg) rotateY(7.5deg)");
    }

    #[test]
    fn test_tilt_returns_and_snaps() {
        let mut tilt = NameTilt::default();
        tilt.pointer_moved(Vec2::new(100.0, 0.0), Vec2::new(200.0, 100.0));
        tilt.pointer_left();
        let mut frames = 0;
        while tilt.update() {
            frames += 1;
            assert!(frames < 1000);
        }
        assert_eq!(tilt.rotation, Vec2::ZERO);
        assert!(frames > 10);
    }

    #[test]
    fn test_zero_sized_heading_ignored() {
        let mut tilt = NameTilt::default();
        tilt.pointer_moved(Vec2::new(10.0, 10.0), Vec2::ZERO);
        assert_eq!(tilt.rotation, Vec2::ZERO);
    }
}
