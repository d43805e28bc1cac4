use super::polyhedron::Polyhedron;

/// Computes the volume of a polyhedral solid.
///
/// Fans every face into triangles and sums the signed volume of the
/// tetrahedra they form with the origin: `(1/6) * v0 . (v1 x v2)`.
pub struct Volume<'a> {
    solid: &'a Polyhedron,
}

impl<'a> Volume<'a> {
    /// Creates a new `Volume` query.
    #[must_use]
    pub fn new(solid: &'a Polyhedron) -> Self {
        Self { solid }
    }

    /// Executes the query, returning the volume (absolute value).
    #[must_use]
    pub fn execute(&self) -> f64 {
        let mut signed_volume = 0.0;
        for face in self.solid.faces() {
            let verts = face.vertices();
            let Some(v0) = verts.first() else {
                continue;
            };
            for pair in verts[1..].windows(2) {
                let (v1, v2) = (pair[0], pair[1]);
                signed_volume += v0.coords.dot(&v1.coords.cross(&v2.coords));
            }
        }
        signed_volume.abs() / 6.0
    }
}
