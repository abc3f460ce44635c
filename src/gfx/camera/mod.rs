pub mod camera;
pub mod controller;
pub mod fps_controller;
pub mod orbit_controller;

// Re-export main types
pub use camera::{Camera, ProjectionData, ProjectionType};
pub use controller::{CameraController, CameraControllerKind, FixedController};
pub use fps_controller::{FpsConfig, FpsController};
pub use orbit_controller::{OrbitConfig, OrbitController, OrbitState};
