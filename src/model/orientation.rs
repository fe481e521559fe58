use glam::{Mat3, Quat, Vec3};

/// Pitch is held inside +-60 degrees so the view never flips over the pole.
pub const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_3;

/// Canonical camera forward in its local frame (right-handed, -Z into the screen).
pub const LOCAL_FORWARD: Vec3 = Vec3::NEG_Z;

/// Canonical camera left in its local frame.
pub const LOCAL_LEFT: Vec3 = Vec3::NEG_X;

/// Yaw about world up, then pitch about the camera's own right axis.
pub fn compose_yaw_pitch(yaw: f32, pitch: f32) -> Quat {
    let yaw_q = Quat::from_axis_angle(Vec3::Y, yaw);
    let pitch_q = Quat::from_axis_angle(Vec3::X, pitch);
    (yaw_q * pitch_q).normalize()
}

pub fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT)
}

/// Direction the camera looks along for a given orientation.
pub fn gaze_direction(orientation: Quat) -> Vec3 {
    (orientation * LOCAL_FORWARD).normalize()
}

/// Forward and left movement directions on the horizontal plane.
///
/// Only yaw participates, so walking stays level when looking up or down.
pub fn level_basis(yaw: f32) -> (Vec3, Vec3) {
    let yaw_q = Quat::from_axis_angle(Vec3::Y, yaw);
    (yaw_q * LOCAL_FORWARD, yaw_q * LOCAL_LEFT)
}

/// Orientation that aims `LOCAL_FORWARD` from `eye` at `target` with world up kept upright.
///
/// Returns `None` when the direction is degenerate (target on the eye, or straight up/down).
pub fn look_rotation(eye: Vec3, target: Vec3) -> Option<Quat> {
    let forward = (target - eye).try_normalize()?;
    let right = forward.cross(Vec3::Y).try_normalize()?;
    let up = right.cross(forward);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize())
}
