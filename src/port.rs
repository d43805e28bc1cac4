//! Host capability traits.
//!
//! The detector never touches concrete host types. A host plugs in by
//! implementing [`GeometryKernel`] for its solid modeler and
//! [`ModelDocument`] for its element database.

use std::fmt::Debug;
use std::hash::Hash;

use crate::category::Category;
use crate::error::{DocumentError, KernelError};
use crate::geometry::{Aabb, Color, EdgeCurve, LineSegment, Plane};
use crate::math::Matrix4;

/// Result of an exact boolean intersection that the kernel could evaluate.
#[derive(Debug, Clone)]
pub enum Intersection<S> {
    /// The solids do not share any volume.
    Empty,
    /// The common volume of both solids.
    Solid(S),
}

/// Geometry attached to an element, possibly nested in transformed instances.
#[derive(Debug, Clone)]
pub enum GeometryNode<S> {
    /// A solid in the coordinate system of its parent.
    Solid(S),
    /// A transformed group of child geometry.
    Instance {
        transform: Matrix4,
        children: Vec<GeometryNode<S>>,
    },
}

/// Solid-modeling operations supplied by the host.
pub trait GeometryKernel {
    /// A closed volume with a face/edge boundary.
    type Solid: Clone + Debug;
    /// A bounded face of a solid.
    type Face;

    /// Enclosed volume of the solid.
    fn volume(&self, solid: &Self::Solid) -> f64;

    /// Axis-aligned bounds of the solid, or `None` if it has no extent.
    fn bounding_box(&self, solid: &Self::Solid) -> Option<Aabb>;

    /// Returns a copy of the solid mapped through `matrix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel cannot transform the solid.
    fn transformed(&self, solid: &Self::Solid, matrix: &Matrix4) -> Result<Self::Solid, KernelError>;

    /// Exact boolean intersection of two solids.
    ///
    /// # Errors
    ///
    /// Returns an error when the kernel fails to evaluate the operation. An
    /// evaluated but empty result is `Ok(Intersection::Empty)`.
    fn intersect(
        &self,
        a: &Self::Solid,
        b: &Self::Solid,
    ) -> Result<Intersection<Self::Solid>, KernelError>;

    /// Faces bounding the solid.
    fn faces(&self, solid: &Self::Solid) -> Vec<Self::Face>;

    /// Boundary edges of a face, in loop order.
    fn boundary_edges(&self, face: &Self::Face) -> Vec<EdgeCurve>;
}

/// A view together with its drawing plane.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewContext<V> {
    pub view: V,
    pub plane: Plane,
}

/// Filter for listing elements from a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementQuery<V> {
    /// Categories to list. Empty lists nothing.
    pub categories: Vec<Category>,
    /// Only elements visible in this view.
    pub view: Option<V>,
    /// Also list elements from linked models.
    pub include_linked: bool,
    /// Only elements whose system type name is listed. Empty accepts any.
    pub system_types: Vec<String>,
    /// Drop pipes and pipe fittings narrower than this diameter.
    pub min_pipe_diameter: Option<f64>,
}

impl<V> ElementQuery<V> {
    /// Query for every element of the given categories.
    #[must_use]
    pub fn of_categories(categories: impl Into<Vec<Category>>) -> Self {
        Self {
            categories: categories.into(),
            view: None,
            include_linked: false,
            system_types: Vec::new(),
            min_pipe_diameter: None,
        }
    }
}

/// Element database and mutation API supplied by the host.
pub trait ModelDocument {
    /// Stable identity of an element.
    type ElementId: Copy + Eq + Hash + Debug;
    /// Identity of a view.
    type ViewId: Copy + Eq + Debug;
    /// Identity of a created annotation curve.
    type AnnotationId: Copy + Debug;
    /// Solid modeler used for this document's geometry.
    type Kernel: GeometryKernel;

    /// The geometry kernel for this document's solids.
    fn kernel(&self) -> &Self::Kernel;

    /// Lists elements matching `query`.
    fn enumerate(&self, query: &ElementQuery<Self::ViewId>) -> Vec<Self::ElementId>;

    /// Category of an element, if known.
    fn category(&self, element: Self::ElementId) -> Option<Category>;

    /// Model-space bounds of an element, in its own document's coordinates.
    fn bounding_box(&self, element: Self::ElementId) -> Option<Aabb>;

    /// Raw geometry tree of an element, in its own document's coordinates.
    fn geometry(
        &self,
        element: Self::ElementId,
    ) -> Vec<GeometryNode<<Self::Kernel as GeometryKernel>::Solid>>;

    /// Transform into host coordinates for elements from a linked model.
    fn link_transform(&self, element: Self::ElementId) -> Option<Matrix4>;

    /// The active view and its drawing plane, if it has one.
    fn active_view(&self) -> Option<ViewContext<Self::ViewId>>;

    /// Opens a transaction. Mutations are only allowed while one is open.
    ///
    /// # Errors
    ///
    /// Returns an error if a transaction is already open.
    fn begin_transaction(&mut self, name: &str) -> Result<(), DocumentError>;

    /// Publishes every mutation made since [`begin_transaction`](Self::begin_transaction).
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is open or the host refuses it.
    fn commit_transaction(&mut self) -> Result<(), DocumentError>;

    /// Discards every mutation of the open transaction.
    fn rollback_transaction(&mut self);

    /// Draws a detail curve in `view`.
    ///
    /// # Errors
    ///
    /// Returns an error if the view is unknown or no transaction is open.
    fn create_annotation(
        &mut self,
        view: Self::ViewId,
        line: &LineSegment,
    ) -> Result<Self::AnnotationId, DocumentError>;

    /// Overrides the projection line color of an annotation in `view`.
    ///
    /// # Errors
    ///
    /// Returns an error if the annotation is unknown or no transaction is open.
    fn set_color_override(
        &mut self,
        view: Self::ViewId,
        annotation: Self::AnnotationId,
        color: Color,
    ) -> Result<(), DocumentError>;
}

/// Solid type of a document's kernel.
pub type SolidOf<D> = <<D as ModelDocument>::Kernel as GeometryKernel>::Solid;
