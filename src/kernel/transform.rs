use crate::error::KernelError;
use crate::math::{transform_point, Matrix4};

use super::polyhedron::{PolyFace, Polyhedron};

/// Applies an arbitrary 4x4 transformation matrix to a solid.
pub struct Transform<'a> {
    solid: &'a Polyhedron,
    matrix: Matrix4,
}

impl<'a> Transform<'a> {
    /// Creates a new `Transform` operation.
    #[must_use]
    pub fn new(solid: &'a Polyhedron, matrix: Matrix4) -> Self {
        Self { solid, matrix }
    }

    /// Executes the transformation, returning a new solid.
    ///
    /// Mirroring transforms flip every face loop so normals stay outward.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::TransformFailed` if the matrix is singular or
    /// produces non-finite coordinates.
    pub fn execute(&self) -> Result<Polyhedron, KernelError> {
        let det = self.matrix.fixed_view::<3, 3>(0, 0).into_owned().determinant();
        if !det.is_finite() || det.abs() < f64::EPSILON {
            return Err(KernelError::TransformFailed(format!(
                "matrix is singular (det = {det})"
            )));
        }

        let mirrored = det < 0.0;
        let mut faces = Vec::with_capacity(self.solid.faces().len());
        for face in self.solid.faces() {
            let mut verts: Vec<_> = face
                .vertices()
                .iter()
                .map(|p| transform_point(&self.matrix, p))
                .collect();
            if verts.iter().any(|p| p.coords.iter().any(|c| !c.is_finite())) {
                return Err(KernelError::TransformFailed("non-finite vertex".into()));
            }
            if mirrored {
                verts.reverse();
            }
            faces.push(PolyFace::new(verts));
        }
        Ok(Polyhedron::from_faces_unchecked(faces))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::{MakeBox, Volume};
    use crate::math::{Point3, Vector3};
    use approx::assert_relative_eq;

    fn unit_box() -> Polyhedron {
        MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute()
            .unwrap()
    }

    #[test]
    fn translation_keeps_volume() {
        let m = Matrix4::new_translation(&Vector3::new(3.0, -2.0, 1.0));
        let moved = Transform::new(&unit_box(), m).execute().unwrap();
        let bb = moved.bounding_box().unwrap();
        assert_relative_eq!(bb.min, Point3::new(3.0, -2.0, 1.0));
        assert_relative_eq!(Volume::new(&moved).execute(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn mirror_keeps_faces_outward() {
        let m = Matrix4::new_nonuniform_scaling(&Vector3::new(-1.0, 1.0, 1.0));
        let mirrored = Transform::new(&unit_box(), m).execute().unwrap();
        assert!(mirrored.is_convex());
        let center = Point3::new(-0.5, 0.5, 0.5);
        for face in mirrored.faces() {
            assert!(face.plane().unwrap().signed_distance(&center) < 0.0);
        }
    }

    #[test]
    fn singular_matrix_fails() {
        let m = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 0.0, 1.0));
        assert!(Transform::new(&unit_box(), m).execute().is_err());
    }
}
