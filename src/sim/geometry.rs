//! Intersection tests for contact and targeting
//!
//! Pure functions over primitive volumes (sphere, axis-aligned box, 2D box),
//! rays and segments. Degenerate input never panics: it falls out as a miss
//! or a zero vector.
//!
//! Formulation follows Ericson, "Real-Time Collision Detection".

use glam::{Vec2, Vec3};

/// Sphere volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Axis-aligned box stored as center and half extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Aabb {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }
}

/// Screen-space rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box2D {
    pub min: Vec2,
    pub max: Vec2,
}

impl Box2D {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Inclusive point containment
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Plane `normal · x = d`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

/// Result of a ray or segment query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Intersection point
    pub point: Vec3,
    /// Ray parameter of the intersection (`point = origin + t * dir`)
    pub t: f32,
}

/// Sphere vs sphere overlap (touching counts)
#[inline]
pub fn sphere_sphere(a: &Sphere, b: &Sphere) -> bool {
    let d = a.center - b.center;
    let r = a.radius + b.radius;
    d.dot(d) <= r * r
}

/// Squared distance from `p` to the box (zero inside)
pub fn squared_distance_point_box(p: Vec3, b: &Aabb) -> f32 {
    let lo = b.min();
    let hi = b.max();
    let mut sq = 0.0;
    for i in 0..3 {
        let v = p[i];
        if v < lo[i] {
            sq += (lo[i] - v) * (lo[i] - v);
        }
        if v > hi[i] {
            sq += (v - hi[i]) * (v - hi[i]);
        }
    }
    sq
}

/// Closest point on (or in) the box to `p`, by per-axis clamping
pub fn closest_point_on_box(p: Vec3, b: &Aabb) -> Vec3 {
    let lo = b.min();
    let hi = b.max();
    let mut res = p;
    for i in 0..3 {
        let mut v = p[i];
        if v < lo[i] {
            v = lo[i];
        }
        if v > hi[i] {
            v = hi[i];
        }
        res[i] = v;
    }
    res
}

/// Sphere vs box overlap
#[inline]
pub fn sphere_box(s: &Sphere, b: &Aabb) -> bool {
    squared_distance_point_box(s.center, b) <= s.radius * s.radius
}

/// Sphere vs box overlap, also returning the closest point on the box
pub fn sphere_box_closest(s: &Sphere, b: &Aabb) -> (bool, Vec3) {
    let closest = closest_point_on_box(s.center, b);
    let v = closest - s.center;
    (v.dot(v) <= s.radius * s.radius, closest)
}

/// Does the ray `p + t·d` (t ≥ 0) touch the sphere?
///
/// An origin inside the sphere is an immediate hit.
pub fn ray_sphere_test(p: Vec3, d: Vec3, s: &Sphere) -> bool {
    let m = p - s.center;
    let c = m.dot(m) - s.radius * s.radius;
    if c <= 0.0 {
        return true;
    }
    let b = m.dot(d);
    if b > 0.0 {
        return false;
    }
    b * b - c >= 0.0
}

/// Ray vs sphere with the nearest non-negative intersection
///
/// `d` is expected to be normalized. An origin inside the sphere reports
/// `t = 0` at the origin.
pub fn ray_sphere(p: Vec3, d: Vec3, s: &Sphere) -> Option<RayHit> {
    let m = p - s.center;
    let b = m.dot(d);
    let c = m.dot(m) - s.radius * s.radius;
    // Origin outside and pointing away
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()).max(0.0);
    Some(RayHit {
        point: p + d * t,
        t,
    })
}

/// Segment vs sphere, delegating to [`ray_sphere`] with a normalized direction
///
/// The hit is not clipped to the segment end; callers compare `t` against
/// the segment length when they need that. A zero-length segment only hits
/// when its start lies inside the sphere.
pub fn segment_sphere(start: Vec3, end: Vec3, s: &Sphere) -> Option<RayHit> {
    let dir = (end - start).normalize_or_zero();
    ray_sphere(start, dir, s)
}

/// Segment vs box, separating-axis test
///
/// The cross-product axes get `f32::EPSILON` slack so near-parallel
/// segments do not produce false negatives.
pub fn segment_box(p0: Vec3, p1: Vec3, b: &Aabb) -> bool {
    let e = b.half_extents;
    let mid = (p0 + p1) * 0.5;
    let d = p1 - mid;
    let m = mid - b.center;

    let mut adx = d.x.abs();
    if m.x.abs() > e.x + adx {
        return false;
    }
    let mut ady = d.y.abs();
    if m.y.abs() > e.y + ady {
        return false;
    }
    let mut adz = d.z.abs();
    if m.z.abs() > e.z + adz {
        return false;
    }

    adx += f32::EPSILON;
    ady += f32::EPSILON;
    adz += f32::EPSILON;

    if (m.y * d.z - m.z * d.y).abs() > e.y * adz + e.z * ady {
        return false;
    }
    if (m.z * d.x - m.x * d.z).abs() > e.x * adz + e.z * adx {
        return false;
    }
    if (m.x * d.y - m.y * d.x).abs() > e.x * ady + e.y * adx {
        return false;
    }
    true
}

/// Ray vs box, slab method
///
/// Returns the entry point (or the origin when it starts inside).
pub fn ray_box(p: Vec3, d: Vec3, b: &Aabb) -> Option<RayHit> {
    let lo = b.min();
    let hi = b.max();
    let mut tmin = 0.0_f32;
    let mut tmax = f32::MAX;

    for i in 0..3 {
        if d[i].abs() < f32::EPSILON {
            // Parallel to the slab: must already be inside it
            if p[i] < lo[i] || p[i] > hi[i] {
                return None;
            }
        } else {
            let ood = 1.0 / d[i];
            let mut t1 = (lo[i] - p[i]) * ood;
            let mut t2 = (hi[i] - p[i]) * ood;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            tmin = tmin.max(t1);
            tmax = tmax.min(t2);
            if tmin > tmax {
                return None;
            }
        }
    }

    Some(RayHit {
        point: p + d * tmin,
        t: tmin,
    })
}

/// Plane through three points (clockwise winding)
///
/// Collinear points give a zero normal.
pub fn plane_from_triangle(a: Vec3, b: Vec3, c: Vec3) -> Plane {
    let normal = (b - a).cross(c - a).normalize_or_zero();
    Plane {
        normal,
        d: normal.dot(a),
    }
}

/// Signed distance from `q` to the plane; negative means below
pub fn point_plane_distance(q: Vec3, plane: &Plane) -> f32 {
    let nn = plane.normal.dot(plane.normal);
    if nn <= 0.0 {
        return 0.0;
    }
    (plane.normal.dot(q) - plane.d) / nn
}

/// Faces of the box that `q` lies on or above
///
/// Used for simple positional correction: push the point out along the
/// normal of a face it is above.
pub fn supporting_planes_above_point(q: Vec3, b: &Aabb) -> Vec<Plane> {
    let mut res = Vec::new();
    for i in 0..3 {
        for sign in [-1.0_f32, 1.0] {
            let mut normal = Vec3::ZERO;
            normal[i] = sign;
            let plane = Plane {
                normal,
                d: normal.dot(b.center) + b.half_extents[i],
            };
            if point_plane_distance(q, &plane) >= 0.0 {
                res.push(plane);
            }
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::ZERO, Vec3::ONE)
    }

    #[test]
    fn test_sphere_sphere() {
        let a = Sphere::new(Vec3::ZERO, 1.0);
        assert!(sphere_sphere(&a, &Sphere::new(Vec3::new(1.5, 0.0, 0.0), 1.0)));
        // Touching
        assert!(sphere_sphere(&a, &Sphere::new(Vec3::new(2.0, 0.0, 0.0), 1.0)));
        assert!(!sphere_sphere(&a, &Sphere::new(Vec3::new(2.1, 0.0, 0.0), 1.0)));
    }

    #[test]
    fn test_closest_point_on_box() {
        let b = unit_box();
        assert_eq!(
            closest_point_on_box(Vec3::new(3.0, 0.5, -4.0), &b),
            Vec3::new(1.0, 0.5, -1.0)
        );
        // Inside stays put
        let p = Vec3::new(0.2, -0.3, 0.9);
        assert_eq!(closest_point_on_box(p, &b), p);
    }

    #[test]
    fn test_squared_distance_point_box() {
        let b = unit_box();
        assert_eq!(squared_distance_point_box(Vec3::ZERO, &b), 0.0);
        assert!((squared_distance_point_box(Vec3::new(3.0, 0.0, 0.0), &b) - 4.0).abs() < 1e-6);
        assert!((squared_distance_point_box(Vec3::new(2.0, 2.0, 0.0), &b) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_box() {
        let b = unit_box();
        assert!(sphere_box(&Sphere::new(Vec3::new(1.5, 0.0, 0.0), 0.5), &b));
        assert!(!sphere_box(&Sphere::new(Vec3::new(1.6, 0.0, 0.0), 0.5), &b));

        let (hit, closest) = sphere_box_closest(&Sphere::new(Vec3::new(0.0, 1.4, 0.0), 0.5), &b);
        assert!(hit);
        assert_eq!(closest, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_ray_sphere_hit() {
        let s = Sphere::new(Vec3::new(0.0, 0.0, 10.0), 2.0);
        let hit = ray_sphere(Vec3::ZERO, Vec3::Z, &s).expect("ray should hit");
        assert!((hit.t - 8.0).abs() < 1e-5);
        assert!((hit.point - Vec3::new(0.0, 0.0, 8.0)).length() < 1e-5);
        assert!(ray_sphere_test(Vec3::ZERO, Vec3::Z, &s));
    }

    #[test]
    fn test_ray_sphere_miss() {
        let s = Sphere::new(Vec3::new(0.0, 0.0, 10.0), 2.0);
        // Pointing away
        assert!(ray_sphere(Vec3::ZERO, -Vec3::Z, &s).is_none());
        assert!(!ray_sphere_test(Vec3::ZERO, -Vec3::Z, &s));
        // Passing beside
        assert!(ray_sphere(Vec3::new(3.0, 0.0, 0.0), Vec3::Z, &s).is_none());
    }

    #[test]
    fn test_ray_sphere_origin_inside() {
        let s = Sphere::new(Vec3::ZERO, 5.0);
        let p = Vec3::new(1.0, 0.0, 0.0);
        let hit = ray_sphere(p, Vec3::Y, &s).expect("inside is a hit");
        assert_eq!(hit.t, 0.0);
        assert_eq!(hit.point, p);
        assert!(ray_sphere_test(p, -Vec3::Y, &s));
    }

    #[test]
    fn test_segment_sphere() {
        let s = Sphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0);
        let hit = segment_sphere(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), &s).expect("hit");
        assert!((hit.t - 4.0).abs() < 1e-5);

        // Degenerate segment outside the sphere
        assert!(segment_sphere(Vec3::ZERO, Vec3::ZERO, &s).is_none());
    }

    #[test]
    fn test_segment_box() {
        let b = unit_box();
        // Crossing
        assert!(segment_box(Vec3::new(-3.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0), &b));
        // Fully inside
        assert!(segment_box(Vec3::splat(-0.1), Vec3::splat(0.1), &b));
        // Off to the side
        assert!(!segment_box(Vec3::new(-3.0, 2.0, 0.0), Vec3::new(3.0, 2.0, 0.0), &b));
        // Diagonal passing the corner
        assert!(!segment_box(Vec3::new(0.0, 3.0, 0.0), Vec3::new(3.0, 0.0, 0.0), &b));
        // Stops short
        assert!(!segment_box(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(-2.0, 0.0, 0.0), &b));
    }

    #[test]
    fn test_ray_box() {
        let b = unit_box();
        let hit = ray_box(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, &b).expect("hit");
        assert!((hit.t - 4.0).abs() < 1e-5);
        assert!((hit.point - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);

        // Parallel outside slab
        assert!(ray_box(Vec3::new(-5.0, 2.0, 0.0), Vec3::X, &b).is_none());
        // Pointing away
        assert!(ray_box(Vec3::new(-5.0, 0.0, 0.0), -Vec3::X, &b).is_none());
        // Diagonal miss: enters x-slab after leaving y-slab
        let d = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!(ray_box(Vec3::new(-4.0, -1.0, 0.0), d, &b).is_none());
    }

    #[test]
    fn test_ray_box_origin_inside() {
        let hit = ray_box(Vec3::ZERO, Vec3::Y, &unit_box()).expect("inside is a hit");
        assert_eq!(hit.t, 0.0);
        assert_eq!(hit.point, Vec3::ZERO);
    }

    #[test]
    fn test_plane_from_triangle() {
        let plane = plane_from_triangle(
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 1.0),
            Vec3::new(1.0, 2.0, 0.0),
        );
        assert!((plane.normal - Vec3::Y).length() < 1e-6);
        assert!((plane.d - 2.0).abs() < 1e-6);
        assert!((point_plane_distance(Vec3::new(5.0, 5.0, 5.0), &plane) - 3.0).abs() < 1e-6);
        assert!(point_plane_distance(Vec3::ZERO, &plane) < 0.0);
    }

    #[test]
    fn test_plane_degenerate() {
        let plane = plane_from_triangle(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert_eq!(plane.normal, Vec3::ZERO);
        assert_eq!(point_plane_distance(Vec3::ONE, &plane), 0.0);
    }

    #[test]
    fn test_supporting_planes_above_point() {
        let b = Aabb::new(Vec3::new(10.0, 0.0, 0.0), Vec3::ONE);
        // Above the +y face only
        let planes = supporting_planes_above_point(Vec3::new(10.0, 3.0, 0.0), &b);
        assert_eq!(planes.len(), 1);
        assert_eq!(planes[0].normal, Vec3::Y);

        // Outside a corner: +x and +y faces
        let planes = supporting_planes_above_point(Vec3::new(12.0, 3.0, 0.0), &b);
        assert_eq!(planes.len(), 2);

        // Inside: none
        assert!(supporting_planes_above_point(Vec3::new(10.0, 0.0, 0.0), &b).is_empty());
    }

    #[test]
    fn test_box2d_contains_point() {
        let r = Box2D::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 5.0));
        assert!(r.contains_point(Vec2::new(10.0, 5.0)));
        assert!(r.contains_point(Vec2::new(3.0, 2.0)));
        assert!(!r.contains_point(Vec2::new(-0.1, 2.0)));
        assert!(!r.contains_point(Vec2::new(3.0, 5.1)));
    }

    fn vec3() -> impl Strategy<Value = Vec3> {
        (-50.0f32..50.0, -50.0f32..50.0, -50.0f32..50.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn prop_sphere_sphere_symmetric(
            ca in vec3(), cb in vec3(), ra in 0.0f32..20.0, rb in 0.0f32..20.0
        ) {
            let a = Sphere::new(ca, ra);
            let b = Sphere::new(cb, rb);
            prop_assert_eq!(sphere_sphere(&a, &b), sphere_sphere(&b, &a));
        }

        #[test]
        fn prop_closest_point_idempotent(p in vec3(), c in vec3(), h in vec3()) {
            let b = Aabb::new(c, h.abs());
            let once = closest_point_on_box(p, &b);
            prop_assert_eq!(closest_point_on_box(once, &b), once);
        }

        #[test]
        fn prop_ray_sphere_containment(p in vec3(), d in vec3(), c in vec3(), r in 1.0f32..20.0) {
            prop_assume!(d.length() > 1e-3);
            let d = d.normalize();
            let s = Sphere::new(c, r);
            let origin_inside = (p - c).length_squared() <= r * r;
            if let Some(hit) = ray_sphere(p, d, &s) {
                prop_assert!(hit.t >= 0.0);
                prop_assert!((hit.point - (p + d * hit.t)).length() < 1e-3);
                if !origin_inside {
                    let dist = (hit.point - c).length();
                    prop_assert!((dist - r).abs() < 1e-2 * r.max(1.0));
                }
            }
        }
    }
}
