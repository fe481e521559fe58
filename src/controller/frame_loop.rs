use std::cell::RefCell;
use std::rc::Rc;

use crate::controller::camera_controller::{ControllerConfig, FirstPersonController};
use crate::controller::input::InputTracker;
use crate::model::camera::{Camera, CameraPose};
use crate::model::ViewerContext;

/// Turns host frame timestamps (milliseconds, e.g. from requestAnimationFrame)
/// into elapsed seconds.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_ms: Option<f64>,
    /// Longest step handed to the controller, so a backgrounded tab does not
    /// teleport the camera when it resumes.
    pub max_step: f32,
}

impl FrameClock {
    pub fn new(max_step: f32) -> Self {
        Self { last_ms: None, max_step }
    }

    /// Seconds since the previous tick; the first tick is always zero.
    /// A non-finite timestamp yields zero and is not remembered.
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        if !now_ms.is_finite() {
            return 0.0;
        }
        let last = self.last_ms.replace(now_ms).unwrap_or(now_ms);
        (((now_ms - last) / 1000.0) as f32).clamp(0.0, self.max_step)
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(0.1)
    }
}

/// Per-frame state: the shared input tracker, the controller and the camera it drives.
pub struct FrameLoopContext<C: Camera> {
    pub context: Rc<ViewerContext>,
    pub input: Rc<RefCell<InputTracker>>,
    pub controller: FirstPersonController,
    pub camera: C,
    pub clock: FrameClock,
}

impl<C: Camera> FrameLoopContext<C> {
    pub fn new(context: Rc<ViewerContext>, camera: C, config: ControllerConfig) -> Self {
        let input = Rc::new(RefCell::new(InputTracker::new(context.clone())));
        let controller = FirstPersonController::new(context.clone(), input.clone(), config);
        Self {
            context,
            input,
            controller,
            camera,
            clock: FrameClock::default(),
        }
    }

    /// Run one frame at host time `now_ms`.
    pub fn step(&mut self, now_ms: f64) -> CameraPose {
        let dt = self.clock.tick(now_ms);
        self.controller.update(&mut self.camera, dt)
    }

    /// True once at least one pointer sample has arrived.
    pub fn is_ready(&self) -> bool {
        self.controller.is_ready()
    }
}
