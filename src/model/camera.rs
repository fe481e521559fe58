use glam::{Quat, Vec3};

use super::orientation::{gaze_direction, look_rotation};

/// Camera owned by the host renderer. The controller writes into it every frame.
pub trait Camera {
    fn set_orientation(&mut self, orientation: Quat);
    fn set_position(&mut self, position: Vec3);
    /// Re-derive the orientation so the camera faces `target` from its current position.
    fn look_at(&mut self, target: Vec3);
}

/// Result of one controller update.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub orientation: Quat,
    pub look_target: Vec3,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            look_target: Vec3::NEG_Z,
        }
    }
}

/// Plain in-memory camera, for native hosts and tests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseCamera {
    pub position: Vec3,
    pub orientation: Quat,
    /// Last point handed to `look_at`.
    pub last_target: Option<Vec3>,
}

impl PoseCamera {
    pub fn forward(&self) -> Vec3 {
        gaze_direction(self.orientation)
    }
}

impl Camera for PoseCamera {
    fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn look_at(&mut self, target: Vec3) {
        self.last_target = Some(target);
        // Degenerate targets keep the current orientation.
        if let Some(q) = look_rotation(self.position, target) {
            self.orientation = q;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_look_at_turns_camera() {
        let mut cam = PoseCamera::default();
        cam.set_position(Vec3::new(0.0, 1.0, 0.0));
        cam.look_at(Vec3::new(10.0, 1.0, 0.0));
        assert!(cam.forward().abs_diff_eq(Vec3::X, 1e-5));
        assert_eq!(cam.last_target, Some(Vec3::new(10.0, 1.0, 0.0)));
    }

    #[test]
    fn test_look_at_own_position_keeps_orientation() {
        let mut cam = PoseCamera::default();
        let q = Quat::from_rotation_y(0.5);
        cam.set_orientation(q);
        cam.look_at(cam.position);
        assert!(cam.orientation.abs_diff_eq(q, 1e-6));
    }
}
