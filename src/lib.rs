//! Planet Siege - simulation kernel for a planet-surface arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (sphere transforms, collision, message bus, world)
//! - `tuning`: Data-driven game balance (nested key-value document)
//! - `resources`: Name-keyed, reference-counted resource handles

pub mod resources;
pub mod sim;
pub mod tuning;

pub use resources::{ResourceCache, ResourceError, ResourceHandle};
pub use tuning::{ConfigError, Tuning};

use glam::Vec3;
use rand::Rng;

/// Game configuration constants
pub mod consts {
    use glam::Vec3;

    /// Fixed simulation timestep (60 Hz, the rate recorded sessions replay at)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Local "up": an object's surface position is `rotation * UP`
    pub const UP: Vec3 = Vec3::Y;
    /// Local "forward": an object's facing is `rotation * FORWARD`
    pub const FORWARD: Vec3 = Vec3::Z;
    /// Local axis forward motion rotates about (`UP × FORWARD`)
    pub const MOVE_AXIS: Vec3 = Vec3::X;

    /// Default planet radius
    pub const PLANET_RADIUS: f32 = 100.0;

    /// Bounding circles are inflated by this factor so they enclose the cube
    pub const CONTACT_SCALE: f32 = 1.4;

    /// An object counts as "on the ground" within this height of the surface
    pub const GROUND_TOLERANCE: f32 = 1.5;
}

/// Angle between two vectors in [0, π]
///
/// Zero-length input yields 0. The cosine is clamped to [-1, 1] before
/// `acos` so rounding never produces NaN.
#[inline]
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    let la = a.length();
    let lb = b.length();
    if la <= 0.0 || lb <= 0.0 {
        return 0.0;
    }
    (a.dot(b) / (la * lb)).clamp(-1.0, 1.0).acos()
}

/// Convert a distance along a great circle to the subtended angle
#[inline]
pub fn angle_on_circle(distance: f32, radius: f32) -> f32 {
    distance / radius
}

/// Convert a subtended angle to the distance along a great circle
#[inline]
pub fn dist_on_circle(angle: f32, radius: f32) -> f32 {
    radius * angle
}

/// Uniform value in [lo, hi]
#[inline]
pub fn random_between<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    lo + (hi - lo) * rng.random::<f32>()
}

/// Uniform index in [0, len), or `None` for an empty range
#[inline]
pub fn random_index<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(rng.random_range(0..len))
    }
}
