use std::cell::RefCell;
use std::rc::Rc;

use glam::{Quat, Vec3};

use crate::controller::input::{InputProcessor, InputTracker, KeyBindings};
use crate::model::camera::{Camera, CameraPose};
use crate::model::orientation::{clamp_pitch, compose_yaw_pitch, gaze_direction, level_basis};
use crate::model::{Ray, ViewerContext};

/// Distance of the default gaze point along the view ray.
pub const LOOK_DISTANCE: f32 = 100.0;

/// How the look target is chosen once the gaze ray has been tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetPolicy {
    /// Nearest surface hit within `LOOK_DISTANCE`, else the far point.
    #[default]
    ClosestHit,
    /// Always the far point, even when a closer hit was found.
    FarPoint,
}

/// How held movement keys turn into displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationMode {
    /// Both axes move `move_speed` units per second.
    #[default]
    Uniform,
    /// Forward scale is `input + dt * 10`, strafe scale is `input * dt * 10`.
    /// Forward drifts even with no key held.
    Legacy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Yaw change per full viewport width of pointer travel, in radians.
    pub yaw_rate: f32,
    /// Pitch change per full viewport height of pointer travel, in radians.
    pub pitch_rate: f32,
    /// Walking speed in units per second.
    pub move_speed: f32,
    pub target_policy: TargetPolicy,
    pub translation: TranslationMode,
    pub bindings: KeyBindings,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            yaw_rate: 8.0,
            pitch_rate: 5.0,
            move_speed: 10.0,
            target_policy: TargetPolicy::default(),
            translation: TranslationMode::default(),
            bindings: KeyBindings::default(),
        }
    }
}

/// First-person camera: mouse-look orientation, level WASD walking and a
/// gaze target resolved against the scene's bounding volumes.
pub struct FirstPersonController {
    context: Rc<ViewerContext>,
    input: Rc<RefCell<InputTracker>>,
    processor: InputProcessor,
    config: ControllerConfig,
    yaw: f32,
    pitch: f32,
    position: Vec3,
    pose: CameraPose,
}

impl FirstPersonController {
    pub fn new(context: Rc<ViewerContext>, input: Rc<RefCell<InputTracker>>, config: ControllerConfig) -> Self {
        Self {
            context,
            input,
            processor: InputProcessor::new(config.bindings.clone()),
            config,
            yaw: 0.0,
            pitch: 0.0,
            position: Vec3::ZERO,
            pose: CameraPose::default(),
        }
    }

    /// Advance one frame: orientation, camera write, look target, translation,
    /// then roll the input snapshot.
    ///
    /// The camera receives the position from before this frame's movement.
    /// A non-finite `elapsed` counts as a zero-length frame.
    pub fn update(&mut self, camera: &mut impl Camera, elapsed: f32) -> CameraPose {
        let elapsed = if elapsed.is_finite() { elapsed } else { 0.0 };
        let orientation = self.update_rotation();

        camera.set_orientation(orientation);
        camera.set_position(self.position);

        let look_target = self.resolve_look_target(orientation);
        camera.look_at(look_target);

        self.pose = CameraPose {
            position: self.position,
            orientation,
            look_target,
        };

        self.update_translation(elapsed);
        self.input.borrow_mut().advance_frame(elapsed);

        tracing::trace!(
            yaw = self.yaw,
            pitch = self.pitch,
            position = ?self.position,
            target = ?look_target,
            "camera updated"
        );
        self.pose
    }

    fn update_rotation(&mut self) -> Quat {
        let delta = self.input.borrow().current().pointer_delta;
        let frac = self.context.viewport().normalize_delta(delta);

        // Yaw and pitch only ever hold finite values, so the orientation stays normalized.
        let yaw = self.yaw - frac.x * self.config.yaw_rate;
        if yaw.is_finite() {
            self.yaw = yaw;
        }
        let pitch = self.pitch - frac.y * self.config.pitch_rate;
        if !pitch.is_nan() {
            self.pitch = clamp_pitch(pitch);
        }

        compose_yaw_pitch(self.yaw, self.pitch)
    }

    fn resolve_look_target(&self, orientation: Quat) -> Vec3 {
        let ray = Ray::new(self.position, gaze_direction(orientation));
        let far_point = ray.at(LOOK_DISTANCE);

        let mut closest = far_point;
        for aabb in self.context.bounds().iter() {
            let Some(hit) = ray.hit_point(aabb) else {
                continue;
            };
            if hit.distance(ray.origin) < closest.distance(ray.origin) {
                closest = match self.config.target_policy {
                    TargetPolicy::ClosestHit => hit,
                    TargetPolicy::FarPoint => far_point,
                };
            }
        }
        closest
    }

    fn update_translation(&mut self, elapsed: f32) {
        let (forward_input, strafe_input) = {
            let input = self.input.borrow();
            let snapshot = input.current();
            (self.processor.forward_axis(snapshot), self.processor.strafe_axis(snapshot))
        };

        let (forward_dir, left_dir) = level_basis(self.yaw);
        let (forward_scale, strafe_scale) = match self.config.translation {
            TranslationMode::Uniform => {
                let step = self.config.move_speed * elapsed;
                (forward_input * step, strafe_input * step)
            }
            TranslationMode::Legacy => (forward_input + elapsed * 10.0, strafe_input * elapsed * 10.0),
        };

        let moved = self.position + forward_dir * forward_scale + left_dir * strafe_scale;
        if moved.is_finite() {
            self.position = moved;
        }
    }

    pub fn is_ready(&self) -> bool {
        self.input.borrow().is_initialized()
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn orientation(&self) -> Quat {
        compose_yaw_pitch(self.yaw, self.pitch)
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn set_rates(&mut self, yaw_rate: f32, pitch_rate: f32) {
        tracing::info!(yaw_rate, pitch_rate, "look rates changed");
        self.config.yaw_rate = yaw_rate;
        self.config.pitch_rate = pitch_rate;
    }

    pub fn set_move_speed(&mut self, speed: f32) {
        tracing::info!(speed, "move speed changed");
        self.config.move_speed = speed;
    }

    pub fn set_bindings(&mut self, bindings: KeyBindings) {
        self.processor = InputProcessor::new(bindings.clone());
        self.config.bindings = bindings;
    }

    /// Teleport to `position` facing `yaw`/`pitch`; pitch is clamped.
    pub fn place_at(&mut self, position: Vec3, yaw: f32, pitch: f32) {
        if !position.is_finite() || !yaw.is_finite() || pitch.is_nan() {
            tracing::warn!(?position, yaw, pitch, "ignoring non-finite placement");
            return;
        }
        self.position = position;
        self.yaw = yaw;
        self.pitch = clamp_pitch(pitch);
        tracing::info!(?position, yaw, pitch = self.pitch, "controller placed");
    }
}
