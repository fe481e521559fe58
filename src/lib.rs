//! First-person walkthrough core for browser 3D room viewers.
//!
//! The input tracker turns pointer and keyboard events into per-frame
//! snapshots; the first-person controller turns those into a camera pose
//! (mouse-look orientation, level WASD walking, and a gaze target resolved
//! against the scene's bounding boxes). Rendering stays with the host.
pub mod logging;

// MVC Architecture (the view belongs to the host renderer)
pub mod model;
pub mod controller;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use controller::{
    ControllerConfig, FirstPersonController, FrameClock, FrameLoopContext, InputEvent, InputSnapshot, InputTracker,
    KeyBindings, MouseButton, TargetPolicy, TranslationMode,
};
pub use model::{Aabb, Camera, CameraPose, PoseCamera, Ray, Viewport, ViewerContext};
