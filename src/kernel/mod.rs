//! Reference solid modeler for convex polyhedra.
//!
//! Elements are modeled as one or more convex pieces (boxes for rectangular
//! ducts and framing, regular prisms for round pipes). Intersection is exact
//! for convex inputs; a non-convex input is reported as a kernel error.

mod clip;
mod intersect;
mod make_box;
mod make_prism;
mod polyhedron;
mod transform;
mod volume;

pub use clip::ClipByPlane;
pub use intersect::Intersect;
pub use make_box::MakeBox;
pub use make_prism::MakePrism;
pub use polyhedron::{PolyFace, Polyhedron};
pub use transform::Transform;
pub use volume::Volume;

use crate::error::KernelError;
use crate::geometry::{Aabb, EdgeCurve};
use crate::math::Matrix4;
use crate::port::{GeometryKernel, Intersection};

/// [`GeometryKernel`] over [`Polyhedron`] solids.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolyhedralKernel;

impl GeometryKernel for PolyhedralKernel {
    type Solid = Polyhedron;
    type Face = PolyFace;

    fn volume(&self, solid: &Polyhedron) -> f64 {
        Volume::new(solid).execute()
    }

    fn bounding_box(&self, solid: &Polyhedron) -> Option<Aabb> {
        solid.bounding_box()
    }

    fn transformed(&self, solid: &Polyhedron, matrix: &Matrix4) -> Result<Polyhedron, KernelError> {
        Transform::new(solid, *matrix).execute()
    }

    fn intersect(
        &self,
        a: &Polyhedron,
        b: &Polyhedron,
    ) -> Result<Intersection<Polyhedron>, KernelError> {
        Intersect::new(a, b).execute()
    }

    fn faces(&self, solid: &Polyhedron) -> Vec<PolyFace> {
        solid.faces().to_vec()
    }

    fn boundary_edges(&self, face: &PolyFace) -> Vec<EdgeCurve> {
        face.edges().collect()
    }
}
