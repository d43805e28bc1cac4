use crate::error::{GeometryError, Result};
use crate::geometry::Aabb;
use crate::math::{Point3, Vector3, TOLERANCE};

use super::polyhedron::{PolyFace, Polyhedron};

/// Creates an axis-aligned box solid from two corner points.
pub struct MakeBox {
    min_corner: Point3,
    max_corner: Point3,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        Self {
            min_corner,
            max_corner,
        }
    }

    /// Box of the given edge lengths centered on `center`.
    #[must_use]
    pub fn centered(center: Point3, size: Vector3) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half)
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the corners are not strictly
    /// ordered on every axis.
    pub fn execute(&self) -> Result<Polyhedron> {
        let extent = self.max_corner - self.min_corner;
        if extent.iter().any(|&e| !e.is_finite() || e <= TOLERANCE) {
            return Err(GeometryError::Degenerate(format!(
                "box corners {:?} and {:?} do not span a volume",
                self.min_corner, self.max_corner
            ))
            .into());
        }

        let c = Aabb {
            min: self.min_corner,
            max: self.max_corner,
        }
        .corners();
        let face = |idx: [usize; 4]| PolyFace::new(idx.iter().map(|&i| c[i]).collect());

        Ok(Polyhedron::from_faces_unchecked(vec![
            face([0, 3, 2, 1]), // -z
            face([4, 5, 6, 7]), // +z
            face([0, 1, 5, 4]), // -y
            face([3, 7, 6, 2]), // +y
            face([0, 4, 7, 3]), // -x
            face([1, 2, 6, 5]), // +x
        ]))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn box_has_six_faces() {
        let solid = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute()
            .unwrap();
        assert_eq!(solid.faces().len(), 6);
        assert!(solid.validate().is_ok());
    }

    #[test]
    fn inverted_corners_fail() {
        let result = MakeBox::new(Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 1.0)).execute();
        assert!(result.is_err());
    }

    #[test]
    fn flat_box_fails() {
        let result = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 0.0)).execute();
        assert!(result.is_err());
    }
}
