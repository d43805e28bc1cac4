use crate::error::KernelError;
use crate::geometry::{Aabb, EdgeCurve, Plane};
use crate::math::{Point3, Vector3, TOLERANCE};

/// Distance below which a point is considered to lie on a clipping plane.
pub(crate) const PLANE_EPSILON: f64 = 1e-9;

/// A planar polygonal face.
///
/// Vertices wind counter-clockwise when seen from outside the solid, so the
/// right-hand normal points outward.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyFace {
    vertices: Vec<Point3>,
}

impl PolyFace {
    /// Creates a face from its vertex loop.
    #[must_use]
    pub fn new(vertices: Vec<Point3>) -> Self {
        Self { vertices }
    }

    /// The vertex loop.
    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Area-weighted normal by Newell's method. Its length is twice the
    /// polygon area.
    #[must_use]
    pub fn newell_normal(&self) -> Vector3 {
        let n = self.vertices.len();
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let a = &self.vertices[i];
            let b = &self.vertices[(i + 1) % n];
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }
        normal
    }

    /// Polygon area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.newell_normal().norm() * 0.5
    }

    /// Supporting plane with outward normal, or `None` for a degenerate face.
    #[must_use]
    pub fn plane(&self) -> Option<Plane> {
        let origin = *self.vertices.first()?;
        Plane::from_normal(origin, self.newell_normal()).ok()
    }

    /// Boundary edges in loop order, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = EdgeCurve> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| EdgeCurve::new(self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Same face with reversed winding.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        Self { vertices }
    }
}

/// A closed polyhedral solid bounded by planar faces.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyhedron {
    faces: Vec<PolyFace>,
}

impl Polyhedron {
    /// Builds a solid from face loops.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::InvalidSolid` if the loops cannot bound a volume.
    pub fn from_faces(faces: Vec<PolyFace>) -> Result<Self, KernelError> {
        let solid = Self { faces };
        solid.validate()?;
        Ok(solid)
    }

    pub(crate) fn from_faces_unchecked(faces: Vec<PolyFace>) -> Self {
        Self { faces }
    }

    /// The bounding faces.
    #[must_use]
    pub fn faces(&self) -> &[PolyFace] {
        &self.faces
    }

    /// Every face vertex. Shared corners appear once per face.
    pub fn vertices(&self) -> impl Iterator<Item = &Point3> {
        self.faces.iter().flat_map(|f| f.vertices.iter())
    }

    /// Axis-aligned bounds of all vertices.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices())
    }

    /// Checks that the faces can bound a volume.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::InvalidSolid` for fewer than four faces, faces
    /// with fewer than three vertices, or non-finite coordinates.
    pub fn validate(&self) -> Result<(), KernelError> {
        if self.faces.len() < 4 {
            return Err(KernelError::InvalidSolid(format!(
                "{} faces cannot enclose a volume",
                self.faces.len()
            )));
        }
        if self.faces.iter().any(|f| f.vertices.len() < 3) {
            return Err(KernelError::InvalidSolid("face with fewer than 3 vertices".into()));
        }
        if !self.vertices().all(|p| p.coords.iter().all(|c| c.is_finite())) {
            return Err(KernelError::InvalidSolid("non-finite vertex".into()));
        }
        Ok(())
    }

    /// `true` if every vertex lies on the inner side of every face plane.
    #[must_use]
    pub fn is_convex(&self) -> bool {
        let scale = self
            .bounding_box()
            .map_or(1.0, |bb| (bb.max - bb.min).norm().max(1.0));
        self.faces.iter().all(|face| {
            face.plane().is_some_and(|plane| {
                self.vertices()
                    .all(|p| plane.signed_distance(p) <= PLANE_EPSILON * scale)
            })
        })
    }

    /// Drops faces whose area vanished, e.g. after clipping.
    pub(crate) fn without_slivers(mut self) -> Self {
        self.faces.retain(|f| f.area() > TOLERANCE);
        self
    }
}
