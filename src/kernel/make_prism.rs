use std::f64::consts::TAU;

use crate::error::{GeometryError, Result};
use crate::geometry::Plane;
use crate::math::{Point3, Vector3, TOLERANCE};

use super::polyhedron::{PolyFace, Polyhedron};

/// Extrudes a convex planar profile along a direction vector.
///
/// Round ducts and pipes are approximated by a regular polygon profile
/// via [`MakePrism::regular`].
pub struct MakePrism {
    profile: Vec<Point3>,
    direction: Vector3,
}

impl MakePrism {
    /// Creates a new `MakePrism` operation.
    #[must_use]
    pub fn new(profile: Vec<Point3>, direction: Vector3) -> Self {
        Self { profile, direction }
    }

    /// A regular `segments`-gon prism of circumradius `radius` running from
    /// `start` to `end`.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` and `end` coincide.
    pub fn regular(start: Point3, end: Point3, radius: f64, segments: usize) -> Result<Self> {
        let axis = end - start;
        let frame = Plane::from_normal(start, axis)?;
        let segments = segments.max(3);
        #[allow(clippy::cast_precision_loss)]
        let profile = (0..segments)
            .map(|k| {
                let theta = TAU * k as f64 / segments as f64;
                start + (frame.u_dir() * theta.cos() + frame.v_dir() * theta.sin()) * radius
            })
            .collect();
        Ok(Self::new(profile, axis))
    }

    /// Executes the extrusion.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the profile has fewer than three
    /// points, no area, or lies parallel to the direction.
    pub fn execute(&self) -> Result<Polyhedron> {
        if self.profile.len() < 3 {
            return Err(GeometryError::Degenerate("prism profile needs 3 points".into()).into());
        }
        if self.direction.norm() < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }

        let base = PolyFace::new(self.profile.clone());
        let normal = base.newell_normal();
        if normal.norm() < TOLERANCE {
            return Err(GeometryError::Degenerate("prism profile has no area".into()).into());
        }
        let alignment = normal.normalize().dot(&self.direction.normalize());
        if alignment.abs() < TOLERANCE {
            return Err(
                GeometryError::Degenerate("direction lies in the profile plane".into()).into(),
            );
        }

        // Wind the profile counter-clockwise around the extrusion direction.
        let profile = if alignment > 0.0 {
            base
        } else {
            base.reversed()
        };
        let bottom: Vec<Point3> = profile.vertices().to_vec();
        let top: Vec<Point3> = bottom.iter().map(|p| p + self.direction).collect();

        let n = bottom.len();
        let mut faces = Vec::with_capacity(n + 2);
        faces.push(profile.reversed());
        faces.push(PolyFace::new(top.clone()));
        for i in 0..n {
            let j = (i + 1) % n;
            faces.push(PolyFace::new(vec![bottom[i], bottom[j], top[j], top[i]]));
        }

        Ok(Polyhedron::from_faces_unchecked(faces))
    }
}
