use super::{Matrix4, Point3, Vector3};

/// Orthogonally projects `point` onto the plane through `origin` with unit
/// normal `normal`.
///
/// `projected = point - ((point - origin) . normal) * normal`
#[must_use]
pub fn project_point_to_plane(point: &Point3, origin: &Point3, normal: &Vector3) -> Point3 {
    let distance = (point - origin).dot(normal);
    point - normal * distance
}

/// Applies a homogeneous 4x4 transform to a point.
#[must_use]
pub fn transform_point(matrix: &Matrix4, point: &Point3) -> Point3 {
    matrix.transform_point(point)
}
