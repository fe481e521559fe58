// CONTROLLER: input tracking, first-person camera and the per-frame step
pub mod input;
pub mod camera_controller;
pub mod frame_loop;

pub use input::{InputEvent, InputProcessor, InputSnapshot, InputTracker, KeyBindings, MouseButton};
pub use camera_controller::{ControllerConfig, FirstPersonController, TargetPolicy, TranslationMode, LOOK_DISTANCE};
pub use frame_loop::{FrameClock, FrameLoopContext};
