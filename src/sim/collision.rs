//! Ray intersection against target shapes
//!
//! Targets are spheres or vertical capsules ("pills"). The aim ray starts at
//! the camera and only positive hit distances count.

use glam::Vec3;

/// Result of a ray test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the (normalized) ray direction
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
}

/// Intersect a ray with a sphere.
///
/// Returns the nearest positive intersection. A ray starting inside the
/// sphere reports the exit point.
pub fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<RayHit> {
    let dir = dir.normalize_or_zero();
    if dir == Vec3::ZERO || radius <= 0.0 {
        return None;
    }
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let mut t = -b - sqrt_disc;
    if t < 0.0 {
        t = -b + sqrt_disc;
    }
    if t < 0.0 {
        return None;
    }
    Some(RayHit {
        distance: t,
        point: origin + dir * t,
    })
}

/// Intersect a ray with a capsule whose axis runs from `a` to `b`.
pub fn ray_capsule(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, radius: f32) -> Option<RayHit> {
    let dir = dir.normalize_or_zero();
    if dir == Vec3::ZERO || radius <= 0.0 {
        return None;
    }
    let ba = b - a;
    let baba = ba.length_squared();
    if baba < 1e-8 {
        return ray_sphere(origin, dir, a, radius);
    }

    // Infinite cylinder around the axis, then clip against the segment
    let oa = origin - a;
    let bard = ba.dot(dir);
    let baoa = ba.dot(oa);
    let rdoa = dir.dot(oa);
    let oaoa = oa.length_squared();
    let qa = baba - bard * bard;
    let qb = baba * rdoa - baoa * bard;
    let qc = baba * oaoa - baoa * baoa - radius * radius * baba;

    let mut best: Option<f32> = None;
    if qa.abs() > 1e-8 {
        let h = qb * qb - qa * qc;
        if h >= 0.0 {
            let sqrt_h = h.sqrt();
            for t in [(-qb - sqrt_h) / qa, (-qb + sqrt_h) / qa] {
                let y = baoa + t * bard;
                if t >= 0.0 && y > 0.0 && y < baba {
                    best = Some(best.map_or(t, |cur: f32| cur.min(t)));
                }
            }
        }
    }

    for cap in [a, b] {
        if let Some(hit) = ray_sphere(origin, dir, cap, radius) {
            best = Some(best.map_or(hit.distance, |cur| cur.min(hit.distance)));
        }
    }

    best.map(|t| RayHit {
        distance: t,
        point: origin + dir * t,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_sphere_hit_front() {
        let hit = ray_sphere(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 0.0, -10.0), 2.0)
            .expect("should hit");
        assert!((hit.distance - 8.0).abs() < 1e-5);
        assert!((hit.point.z + 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_sphere_miss_behind() {
        assert!(ray_sphere(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 0.0, -10.0), 2.0).is_none());
    }

    #[test]
    fn test_ray_sphere_miss_offset() {
        assert!(ray_sphere(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(3.0, 0.0, -10.0), 2.0).is_none());
    }

    #[test]
    fn test_ray_sphere_from_inside_reports_exit() {
        let hit = ray_sphere(Vec3::ZERO, Vec3::X, Vec3::ZERO, 5.0).expect("should hit");
        assert!((hit.distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_capsule_body_and_caps() {
        let a = Vec3::new(0.0, -3.0, -10.0);
        let b = Vec3::new(0.0, 3.0, -10.0);

        // Through the cylindrical body
        let body = ray_capsule(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Z, a, b, 1.0)
            .expect("body hit");
        assert!((body.distance - 9.0).abs() < 1e-4);

        // Above the top cap but within its sphere
        let cap = ray_capsule(Vec3::new(0.0, 3.5, 0.0), Vec3::NEG_Z, a, b, 1.0)
            .expect("cap hit");
        assert!(cap.distance > 9.0 && cap.distance < 10.0);

        // Clear miss above
        assert!(ray_capsule(Vec3::new(0.0, 4.5, 0.0), Vec3::NEG_Z, a, b, 1.0).is_none());
    }
}
