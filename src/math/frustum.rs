//! View frustum for chunk culling

use crate::core::camera::Camera;
use crate::core::types::Vec3;
use super::aabb::BOUNDS_OFFSETS;

/// A plane defined by normal and distance from origin
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// Plane through `point` facing along `normal` (normalized here).
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    /// Signed distance from point to plane (positive = in front)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// View frustum with 6 planes (Near, Far, Left, Right, Top, Bottom)
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Build the frustum from the camera basis and projection parameters.
    ///
    /// Side planes pass through the camera position; their normals are the
    /// cross product of the far-plane edge vector (`far * forward` offset by the
    /// half extent along right or up) with the up or right axis. All normals
    /// point inward.
    pub fn from_camera(camera: &Camera) -> Self {
        let forward = camera.forward();
        let right = camera.right();
        let up = camera.up();
        let position = camera.position;

        let half_v = camera.far * (camera.fov_y * 0.5).tan();
        let half_h = half_v * camera.aspect;
        let front_far = forward * camera.far;

        let near = Plane::from_point_normal(position + forward * camera.near, forward);
        let far = Plane::from_point_normal(position + front_far, -forward);
        let left = Plane::from_point_normal(position, (front_far - right * half_h).cross(up));
        let right_plane = Plane::from_point_normal(position, up.cross(front_far + right * half_h));
        let top = Plane::from_point_normal(position, (front_far + up * half_v).cross(right));
        let bottom = Plane::from_point_normal(position, right.cross(front_far - up * half_v));

        Self {
            planes: [near, far, left, right_plane, top, bottom],
        }
    }

    /// Coarse box test used by the chunk culler: the box survives when, for
    /// every plane, at least one of its 8 corners lies in front of it.
    ///
    /// Never rejects a box that touches the frustum; may accept boxes that
    /// straddle two planes near a frustum edge.
    pub fn intersects_box(&self, center: Vec3, extents: Vec3) -> bool {
        self.planes.iter().all(|plane| {
            BOUNDS_OFFSETS
                .iter()
                .any(|offset| plane.distance_to_point(center + *offset * extents) >= 0.0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> Camera {
        let mut camera = Camera::look_at(Vec3::new(0.0, 2.0, 10.0), Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
        camera.near = 0.1;
        camera.far = 100.0;
        camera
    }

    #[test]
    fn test_plane_distance() {
        let plane = Plane { normal: Vec3::Y, distance: 0.0 };
        assert_eq!(plane.distance_to_point(Vec3::new(0.0, 5.0, 0.0)), 5.0);
        assert_eq!(plane.distance_to_point(Vec3::new(0.0, -3.0, 0.0)), -3.0);
    }

    #[test]
    fn test_plane_from_point_normal() {
        let plane = Plane::from_point_normal(Vec3::new(0.0, 4.0, 0.0), Vec3::new(0.0, 2.0, 0.0));
        assert!((plane.normal.length() - 1.0).abs() < 1e-6);
        assert!(plane.distance_to_point(Vec3::new(3.0, 4.0, -2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_planes_point_inward() {
        let camera = test_camera();
        let frustum = Frustum::from_camera(&camera);
        let inside = camera.position + camera.forward() * 10.0;
        for (i, plane) in frustum.planes.iter().enumerate() {
            assert!(plane.distance_to_point(inside) > 0.0, "plane {} faces outward", i);
            assert!((plane.normal.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_box_at_look_at_point_visible() {
        let camera = test_camera();
        let frustum = Frustum::from_camera(&camera);
        let target = Vec3::new(0.0, 2.0, 0.0);
        assert!(frustum.intersects_box(target, Vec3::splat(0.01)));
    }

    #[test]
    fn test_box_behind_camera_culled() {
        let camera = test_camera();
        let frustum = Frustum::from_camera(&camera);
        let behind = camera.position - camera.forward() * 20.0;
        assert!(!frustum.intersects_box(behind, Vec3::splat(1.0)));
    }

    #[test]
    fn test_box_beyond_far_plane_culled() {
        let camera = test_camera();
        let frustum = Frustum::from_camera(&camera);
        let beyond = camera.position + camera.forward() * 150.0;
        assert!(!frustum.intersects_box(beyond, Vec3::splat(1.0)));
    }

    #[test]
    fn test_box_straddling_side_plane_kept() {
        let camera = test_camera();
        let frustum = Frustum::from_camera(&camera);
        // Half-extent at depth 10 is 10 * tan(30deg) ~= 5.77 vertically
        let edge = camera.position + camera.forward() * 10.0 + camera.up() * 5.77;
        assert!(frustum.intersects_box(edge, Vec3::splat(0.5)));
    }

    #[test]
    fn test_straight_down_camera_sees_ground() {
        let mut camera = Camera::look_at(Vec3::new(0.0, 30.0, 0.0), Vec3::ZERO, Vec3::Y);
        camera.far = 100.0;
        let frustum = Frustum::from_camera(&camera);
        for plane in &frustum.planes {
            assert!(plane.normal.is_finite());
        }
        assert!(frustum.intersects_box(Vec3::ZERO, Vec3::new(5.0, 0.5, 5.0)));
        assert!(!frustum.intersects_box(Vec3::new(0.0, 60.0, 0.0), Vec3::splat(1.0)));
    }
}
