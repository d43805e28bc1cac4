use crate::error::KernelError;
use crate::math::TOLERANCE;
use crate::port::Intersection;

use super::clip::ClipByPlane;
use super::polyhedron::Polyhedron;
use super::volume::Volume;

/// Computes the boolean intersection of two convex solids.
///
/// Clips `solid_a` successively by the supporting half-space of every face
/// of `solid_b`.
pub struct Intersect<'a> {
    solid_a: &'a Polyhedron,
    solid_b: &'a Polyhedron,
}

impl<'a> Intersect<'a> {
    /// Creates a new `Intersect` operation.
    #[must_use]
    pub fn new(solid_a: &'a Polyhedron, solid_b: &'a Polyhedron) -> Self {
        Self { solid_a, solid_b }
    }

    /// Executes the intersection.
    ///
    /// Solids that only touch along a face, edge or vertex give
    /// `Intersection::Empty`.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::InvalidSolid` if either input is malformed or
    /// not convex, and `KernelError::BooleanFailed` if a face of `solid_b`
    /// has no supporting plane.
    pub fn execute(&self) -> Result<Intersection<Polyhedron>, KernelError> {
        for solid in [self.solid_a, self.solid_b] {
            solid.validate()?;
            if !solid.is_convex() {
                return Err(KernelError::InvalidSolid(
                    "boolean intersection requires convex solids".into(),
                ));
            }
        }

        // AABB early-out
        let (Some(bb_a), Some(bb_b)) = (self.solid_a.bounding_box(), self.solid_b.bounding_box())
        else {
            return Ok(Intersection::Empty);
        };
        if !bb_a.overlaps(&bb_b) {
            return Ok(Intersection::Empty);
        }

        let mut result = self.solid_a.clone();
        for face in self.solid_b.faces() {
            let plane = face
                .plane()
                .ok_or_else(|| KernelError::BooleanFailed("degenerate clipping face".into()))?;
            match ClipByPlane::new(&result, &plane).execute() {
                Some(clipped) => result = clipped,
                None => return Ok(Intersection::Empty),
            }
        }

        if Volume::new(&result).execute() <= TOLERANCE {
            return Ok(Intersection::Empty);
        }
        Ok(Intersection::Solid(result))
    }
}
