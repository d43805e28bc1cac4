use std::cmp::Ordering;

use crate::geometry::Plane;
use crate::math::Point3;

use super::polyhedron::{PolyFace, Polyhedron, PLANE_EPSILON};

/// Clips a convex solid against a half-space, keeping the part on the
/// negative side of `plane` (opposite its normal).
///
/// The cut is closed with a cap face lying on the plane whose outward normal
/// is the plane normal.
pub struct ClipByPlane<'a> {
    solid: &'a Polyhedron,
    plane: &'a Plane,
}

impl<'a> ClipByPlane<'a> {
    /// Creates a new `ClipByPlane` operation.
    #[must_use]
    pub fn new(solid: &'a Polyhedron, plane: &'a Plane) -> Self {
        Self { solid, plane }
    }

    /// Executes the clip. Returns `None` when nothing of the solid remains.
    #[must_use]
    pub fn execute(&self) -> Option<Polyhedron> {
        let mut faces = Vec::with_capacity(self.solid.faces().len() + 1);
        let mut cap_points: Vec<Point3> = Vec::new();
        let mut face_on_plane = false;

        for face in self.solid.faces() {
            let verts = face.vertices();
            let dists: Vec<f64> = verts.iter().map(|p| self.plane.signed_distance(p)).collect();

            if dists.iter().all(|d| d.abs() <= PLANE_EPSILON) {
                face_on_plane = true;
            }

            let n = verts.len();
            let mut kept = Vec::with_capacity(n + 1);
            for i in 0..n {
                let j = (i + 1) % n;
                let (cur, next) = (verts[i], verts[j]);
                let (dc, dn) = (dists[i], dists[j]);

                if dc <= PLANE_EPSILON {
                    kept.push(cur);
                    if dc.abs() <= PLANE_EPSILON {
                        cap_points.push(cur);
                    }
                }
                let crosses = (dc < -PLANE_EPSILON && dn > PLANE_EPSILON)
                    || (dc > PLANE_EPSILON && dn < -PLANE_EPSILON);
                if crosses {
                    let t = dc / (dc - dn);
                    let hit = cur + (next - cur) * t;
                    kept.push(hit);
                    cap_points.push(hit);
                }
            }

            dedup_loop(&mut kept);
            if kept.len() >= 3 {
                faces.push(PolyFace::new(kept));
            }
        }

        if !face_on_plane {
            if let Some(cap) = build_cap(cap_points, self.plane) {
                faces.push(cap);
            }
        }

        let clipped = Polyhedron::from_faces_unchecked(faces).without_slivers();
        (clipped.faces().len() >= 4).then_some(clipped)
    }
}

/// Removes consecutive duplicate points, including across the loop seam.
fn dedup_loop(points: &mut Vec<Point3>) {
    points.dedup_by(|a, b| (*a - *b).norm() <= PLANE_EPSILON);
    while points.len() > 1 {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            break;
        };
        if (first - last).norm() <= PLANE_EPSILON {
            points.pop();
        } else {
            break;
        }
    }
}

/// Orders the cut points into a convex loop counter-clockwise around the
/// plane normal.
fn build_cap(mut points: Vec<Point3>, plane: &Plane) -> Option<PolyFace> {
    let mut unique: Vec<Point3> = Vec::with_capacity(points.len());
    for p in points.drain(..) {
        if !unique.iter().any(|q| (p - q).norm() <= PLANE_EPSILON) {
            unique.push(p);
        }
    }
    if unique.len() < 3 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let centroid = Point3::from(
        unique.iter().fold(crate::math::Vector3::zeros(), |acc, p| acc + p.coords)
            / unique.len() as f64,
    );
    let (cu, cv) = plane.to_uv(&centroid);
    let angle = |p: &Point3| {
        let (u, v) = plane.to_uv(p);
        (v - cv).atan2(u - cu)
    };
    unique.sort_by(|a, b| angle(a).partial_cmp(&angle(b)).unwrap_or(Ordering::Equal));

    Some(PolyFace::new(unique))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::{MakeBox, Volume};
    use crate::math::Vector3;
    use approx::assert_relative_eq;

    fn unit_box() -> Polyhedron {
        MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute()
            .unwrap()
    }

    #[test]
    fn clip_keeps_lower_half() {
        let solid = unit_box();
        let plane = Plane::from_normal(Point3::new(0.0, 0.0, 0.25), Vector3::z()).unwrap();
        let clipped = ClipByPlane::new(&solid, &plane).execute().unwrap();
        assert_eq!(clipped.faces().len(), 6);
        assert_relative_eq!(Volume::new(&clipped).execute(), 0.25, epsilon = 1e-9);
        assert!(clipped.is_convex());
    }

    #[test]
    fn diagonal_clip_makes_wedge() {
        let solid = unit_box();
        let plane = Plane::from_normal(Point3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 0.0))
            .unwrap();
        let clipped = ClipByPlane::new(&solid, &plane).execute().unwrap();
        assert_relative_eq!(Volume::new(&clipped).execute(), 0.5, epsilon = 1e-9);
        assert_eq!(clipped.faces().len(), 5);
    }

    #[test]
    fn plane_below_solid_removes_everything() {
        let solid = unit_box();
        let plane = Plane::from_normal(Point3::new(0.0, 0.0, -1.0), Vector3::z()).unwrap();
        assert!(ClipByPlane::new(&solid, &plane).execute().is_none());
    }

    #[test]
    fn plane_above_solid_keeps_it_whole() {
        let solid = unit_box();
        let plane = Plane::from_normal(Point3::new(0.0, 0.0, 2.0), Vector3::z()).unwrap();
        let clipped = ClipByPlane::new(&solid, &plane).execute().unwrap();
        assert_eq!(clipped.faces().len(), 6);
    }

    #[test]
    fn plane_on_face_keeps_it_whole() {
        let solid = unit_box();
        let plane = Plane::from_normal(Point3::new(0.0, 0.0, 1.0), Vector3::z()).unwrap();
        let clipped = ClipByPlane::new(&solid, &plane).execute().unwrap();
        assert_eq!(clipped.faces().len(), 6);
        assert_relative_eq!(Volume::new(&clipped).execute(), 1.0, epsilon = 1e-9);
    }
}
