//! Pose on a sphere's surface as a single orientation
//!
//! An object's surface position is `rotation * UP` and its facing is
//! `rotation * FORWARD`. Nothing else is stored, so position and facing can
//! never drift apart: moving, turning and jumping are all rotation
//! compositions followed by a renormalize.

use glam::{Affine3A, Quat, Vec3};

use crate::consts::{FORWARD, MOVE_AXIS, UP};
use crate::{angle_between, angle_on_circle, dist_on_circle};

/// Below this length a rotation axis is treated as undefined
const AXIS_EPSILON: f32 = 1e-6;

/// Orientation of an object constrained to a planet's surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereTransform {
    /// Unit quaternion; the whole pose
    pub rotation: Quat,
    /// Radius of the planet the object lives on
    pub planet_radius: f32,
}

impl SphereTransform {
    pub fn new(planet_radius: f32) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            planet_radius,
        }
    }

    pub fn from_rotation(rotation: Quat, planet_radius: f32) -> Self {
        Self {
            rotation: rotation.normalize(),
            planet_radius,
        }
    }

    /// Place the object above `point` (any length), facing an arbitrary
    /// but deterministic direction
    pub fn from_surface_point(point: Vec3, planet_radius: f32) -> Self {
        let dir = point.normalize_or_zero();
        let rotation = if dir == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_rotation_arc(UP, dir)
        };
        Self::from_rotation(rotation, planet_radius)
    }

    /// Unit surface normal at the object's position
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.rotation * UP
    }

    /// Position scaled to the planet's surface
    #[inline]
    pub fn surface_point(&self) -> Vec3 {
        self.position() * self.planet_radius
    }

    /// Unit facing, tangent to the surface
    #[inline]
    pub fn facing(&self) -> Vec3 {
        self.rotation * FORWARD
    }

    /// World axis that forward motion rotates about (`position × facing`)
    #[inline]
    pub fn move_axis(&self) -> Vec3 {
        self.rotation * MOVE_AXIS
    }

    /// Advance along the facing great circle by arc length `distance`
    pub fn move_forward(&mut self, distance: f32) {
        let angle = angle_on_circle(distance, self.planet_radius);
        self.rotation = (self.rotation * Quat::from_axis_angle(MOVE_AXIS, angle)).normalize();
    }

    /// Yaw about the local up axis by `yaw_rate * dt`, rate clamped to ±`max_rate`
    pub fn turn(&mut self, yaw_rate: f32, max_rate: f32, dt: f32) {
        let yaw = yaw_rate.clamp(-max_rate, max_rate) * dt;
        self.yaw(yaw);
    }

    /// Unclamped yaw about the local up axis
    pub fn yaw(&mut self, angle: f32) {
        self.rotation = (self.rotation * Quat::from_axis_angle(UP, angle)).normalize();
    }

    /// Great-circle distance to another surface direction
    pub fn distance_to(&self, other: Vec3) -> f32 {
        dist_on_circle(angle_between(self.position(), other), self.planet_radius)
    }

    /// Slide along the great circle through the current position and
    /// `toward`. Positive distances approach `toward`, negative ones recede.
    ///
    /// Coincident or antipodal targets define no arc; the pose is unchanged.
    pub fn push_along_arc(&mut self, toward: Vec3, distance: f32) {
        let axis = self.position().cross(toward);
        if axis.length() < AXIS_EPSILON {
            return;
        }
        let angle = angle_on_circle(distance, self.planet_radius);
        let q = Quat::from_axis_angle(axis.normalize(), angle);
        self.rotation = (q * self.rotation).normalize();
    }

    /// Resolve overlap with another object by moving half the overlap away
    ///
    /// The other side runs the same step against this object's snapshot, so
    /// together they close the full gap. Returns true when a push happened.
    pub fn separate_from(&mut self, other: Vec3, min_dist: f32) -> bool {
        let dist = self.distance_to(other);
        if dist >= min_dist {
            return false;
        }
        self.push_along_arc(other, -(min_dist - dist) / 2.0);
        true
    }

    /// Signed yaw that points the facing along the great circle to `target`
    ///
    /// The magnitude is the angle between the current move axis and the one
    /// needed to reach `target`; the sign comes from which side of the move
    /// axis the target lies on.
    pub fn yaw_toward(&self, target: Vec3) -> f32 {
        let axis = self.move_axis();
        let yaw = angle_between(axis, self.position().cross(target));
        if axis.dot(target) < 0.0 { -yaw } else { yaw }
    }

    /// Rotate a fraction of the way toward the pose above `target`
    pub fn slerp_toward(&mut self, target: Vec3, fraction: f32) {
        let dir = target.normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        let arc = Quat::from_rotation_arc(self.position(), dir);
        let end = arc * self.rotation;
        self.rotation = self.rotation.slerp(end, fraction).normalize();
    }

    /// Model matrix: rotation · translate(up · height) · scale
    pub fn model_matrix(&self, height: f32, scale: f32) -> Affine3A {
        Affine3A::from_scale_rotation_translation(
            Vec3::splat(scale),
            self.rotation,
            self.rotation * (UP * height),
        )
    }
}

/// Fixed-duration spherical interpolation between two orientations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slerp {
    start: Quat,
    end: Quat,
    duration: f32,
    elapsed: f32,
    running: bool,
}

impl Default for Slerp {
    fn default() -> Self {
        Self {
            start: Quat::IDENTITY,
            end: Quat::IDENTITY,
            duration: 0.0,
            elapsed: 0.0,
            running: false,
        }
    }
}

impl Slerp {
    /// Begin interpolating. A non-positive duration completes on the first step.
    pub fn start(start: Quat, end: Quat, duration: f32) -> Self {
        Self {
            start,
            end,
            duration: duration.max(0.0),
            elapsed: 0.0,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Normalized time in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    /// Advance by `dt` and return the interpolated orientation
    pub fn step(&mut self, dt: f32) -> Quat {
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.elapsed = self.duration;
            self.running = false;
        }
        self.start.slerp(self.end, self.progress()).normalize()
    }
}

/// One frame of a jump
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpSample {
    pub rotation: Quat,
    /// Offset along local up; not folded into the rotation
    pub height: f32,
    pub finished: bool,
}

/// Leap between two surface points along the great circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpArc {
    slerp: Slerp,
    yaw: f32,
    peak: f32,
}

impl JumpArc {
    /// Plan a jump from the current pose to the surface point above `target`
    ///
    /// Travel time is the great-circle angle divided by the angular speed
    /// `speed / planet_radius`. The facing turns toward the direction of
    /// travel over the course of the jump.
    pub fn start(from: &SphereTransform, target: Vec3, speed: f32, peak: f32) -> Self {
        let pos = from.position();
        let dir = target.normalize_or_zero();
        let theta = angle_between(pos, dir);
        let angular_speed = angle_on_circle(speed, from.planet_radius);
        let duration = if angular_speed > 0.0 {
            theta / angular_speed
        } else {
            0.0
        };

        let end = if dir == Vec3::ZERO {
            from.rotation
        } else {
            (Quat::from_rotation_arc(pos, dir) * from.rotation).normalize()
        };

        Self {
            slerp: Slerp::start(from.rotation, end, duration),
            yaw: from.yaw_toward(target),
            peak,
        }
    }

    pub fn duration(&self) -> f32 {
        self.slerp.duration()
    }

    pub fn is_running(&self) -> bool {
        self.slerp.is_running()
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    /// Parabola through 0 at t=0 and t=1, peaking at `peak` when t=0.5
    #[inline]
    pub fn height_at(peak: f32, t: f32) -> f32 {
        -4.0 * peak * t * t + 4.0 * peak * t
    }

    pub fn step(&mut self, dt: f32) -> JumpSample {
        let base = self.slerp.step(dt);
        let t = self.slerp.progress();
        JumpSample {
            rotation: (base * Quat::from_axis_angle(UP, self.yaw * t)).normalize(),
            height: Self::height_at(self.peak, t),
            finished: !self.slerp.is_running(),
        }
    }
}
