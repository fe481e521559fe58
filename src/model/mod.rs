// MODEL: camera, orientation math, bounding volumes and shared viewer context
pub mod bounds;
pub mod camera;
pub mod context;
pub mod orientation;

pub use bounds::{Aabb, Ray};
pub use camera::{Camera, CameraPose, PoseCamera};
pub use context::{Viewport, ViewerContext};
pub use orientation::{compose_yaw_pitch, PITCH_LIMIT};
