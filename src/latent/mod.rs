//! Latent-space trajectory engine.

pub mod spline;
pub mod state;
pub mod trajectory;

pub use spline::rspline;
pub use state::{LatentState, Trajectory};
pub use trajectory::{PlanarAxis, PlanarState, lemniscate, lerp, planar_axis, slerp};
