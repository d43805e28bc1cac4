use crate::error::{GeometryError, Result};
use crate::math::{project_point_to_plane, Point3, Vector3, TOLERANCE};

/// An infinite plane in 3D space.
///
/// Defined by an origin point and a unit normal. Two in-plane directions
/// (`u_dir`, `v_dir`) are derived so that `u_dir × v_dir = normal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane from an origin and a normal vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if !len.is_finite() || len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;

        // Choose a reference vector not parallel to the normal
        let reference = if normal.x.abs() < 0.9 {
            Vector3::new(1.0, 0.0, 0.0)
        } else {
            Vector3::new(0.0, 1.0, 0.0)
        };

        let u_dir = reference.cross(&normal).normalize();
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// The horizontal plane `z = elevation`, as used by floor plans.
    #[must_use]
    pub fn horizontal(elevation: f64) -> Self {
        Self {
            origin: Point3::new(0.0, 0.0, elevation),
            u_dir: Vector3::x(),
            v_dir: Vector3::y(),
            normal: Vector3::z(),
        }
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the U direction vector.
    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    /// Returns the V direction vector.
    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance from the plane, positive on the normal side.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    /// Orthogonal projection of `point` onto the plane.
    #[must_use]
    pub fn project_point(&self, point: &Point3) -> Point3 {
        project_point_to_plane(point, &self.origin, &self.normal)
    }

    /// Coordinates of `point` in the plane's (u, v) frame.
    #[must_use]
    pub fn to_uv(&self, point: &Point3) -> (f64, f64) {
        let diff = point - self.origin;
        (diff.dot(&self.u_dir), diff.dot(&self.v_dir))
    }
}
