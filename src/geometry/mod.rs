mod aabb;
mod color;
mod plane;
mod segment;

pub use aabb::Aabb;
pub use color::Color;
pub use plane::Plane;
pub use segment::{EdgeCurve, LineSegment};
