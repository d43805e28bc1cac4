use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

/// Endpoints of a boundary edge of a solid face.
///
/// Curved host edges are reduced to their two endpoints; only the straight
/// chord is ever drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCurve {
    /// Start point of the edge.
    pub start: Point3,
    /// End point of the edge.
    pub end: Point3,
}

impl EdgeCurve {
    /// Creates a new edge from its endpoints.
    #[must_use]
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }
}

/// A bounded straight line segment.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    start: Point3,
    end: Point3,
}

impl LineSegment {
    /// Creates a bounded segment between two points.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the points are not finite or
    /// closer than `min_length`.
    pub fn bound(start: Point3, end: Point3, min_length: f64) -> Result<Self> {
        let finite = start.coords.iter().chain(end.coords.iter()).all(|c| c.is_finite());
        if !finite {
            return Err(GeometryError::Degenerate("non-finite segment endpoint".into()).into());
        }
        let length = (end - start).norm();
        if length < min_length.max(TOLERANCE) {
            return Err(GeometryError::Degenerate(format!(
                "segment length {length} is below {min_length}"
            ))
            .into());
        }
        Ok(Self { start, end })
    }

    /// Returns the start point.
    #[must_use]
    pub fn start(&self) -> &Point3 {
        &self.start
    }

    /// Returns the end point.
    #[must_use]
    pub fn end(&self) -> &Point3 {
        &self.end
    }

    /// Returns the segment length.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Returns the unit direction from start to end.
    #[must_use]
    pub fn direction(&self) -> Vector3 {
        (self.end - self.start) / self.length()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bound_segment() {
        let seg = LineSegment::bound(Point3::origin(), Point3::new(3.0, 4.0, 0.0), 0.0).unwrap();
        assert_relative_eq!(seg.length(), 5.0);
        assert_relative_eq!(seg.direction(), Vector3::new(0.6, 0.8, 0.0));
    }

    #[test]
    fn zero_length_is_degenerate() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert!(LineSegment::bound(p, p, 0.0).is_err());
    }

    #[test]
    fn shorter_than_minimum_is_degenerate() {
        let result = LineSegment::bound(Point3::origin(), Point3::new(0.001, 0.0, 0.0), 0.0026);
        assert!(result.is_err());
    }

    #[test]
    fn nan_is_degenerate() {
        let result = LineSegment::bound(Point3::origin(), Point3::new(f64::NAN, 0.0, 0.0), 0.0);
        assert!(result.is_err());
    }
}
