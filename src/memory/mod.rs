//! In-memory host document.
//!
//! Stands in for a CAD host: elements, views, linked models and detail
//! annotations live in slotmap arenas, and annotation writes are staged in a
//! transaction that can be committed or rolled back.

mod scene;

pub use scene::{Scene, SceneElement, SceneGeometry, SceneLink, ScenePlane, SceneView};

use slotmap::SlotMap;
use tracing::debug;

use crate::category::{Category, CategoryFamily};
use crate::detect::flatten_solids;
use crate::error::DocumentError;
use crate::geometry::{Aabb, Color, LineSegment, Plane};
use crate::kernel::{PolyhedralKernel, Polyhedron};
use crate::math::Matrix4;
use crate::port::{ElementQuery, GeometryKernel, GeometryNode, ModelDocument, ViewContext};

slotmap::new_key_type! {
    /// Unique identifier for an element in the model.
    pub struct ElementId;
    /// Unique identifier for a view in the model.
    pub struct ViewId;
    /// Unique identifier for a linked model.
    pub struct LinkId;
    /// Unique identifier for an annotation curve.
    pub struct AnnotationId;
}

/// Data associated with a building element.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub name: String,
    pub category: Category,
    /// Duct or pipe system type name.
    pub system_type: Option<String>,
    /// Nominal diameter of round elements.
    pub diameter: Option<f64>,
    pub geometry: Vec<GeometryNode<Polyhedron>>,
    /// Linked model the element belongs to, if not the host model.
    pub link: Option<LinkId>,
    /// Views showing the element. `None` means every view.
    pub visible_in: Option<Vec<ViewId>>,
}

impl ElementData {
    /// Creates an element with no geometry, visible in every view.
    #[must_use]
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            system_type: None,
            diameter: None,
            geometry: Vec::new(),
            link: None,
            visible_in: None,
        }
    }

    /// Adds a solid in element coordinates.
    #[must_use]
    pub fn with_solid(mut self, solid: Polyhedron) -> Self {
        self.geometry.push(GeometryNode::Solid(solid));
        self
    }

    /// Adds a transformed group of geometry.
    #[must_use]
    pub fn with_instance(mut self, transform: Matrix4, children: Vec<GeometryNode<Polyhedron>>) -> Self {
        self.geometry.push(GeometryNode::Instance { transform, children });
        self
    }

    /// Sets the duct or pipe system type name.
    #[must_use]
    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = Some(system_type.into());
        self
    }

    /// Sets the nominal diameter.
    #[must_use]
    pub fn with_diameter(mut self, diameter: f64) -> Self {
        self.diameter = Some(diameter);
        self
    }

    /// Places the element in a linked model.
    #[must_use]
    pub fn in_link(mut self, link: LinkId) -> Self {
        self.link = Some(link);
        self
    }

    /// Limits the views showing the element.
    #[must_use]
    pub fn visible_in(mut self, views: Vec<ViewId>) -> Self {
        self.visible_in = Some(views);
        self
    }

    fn matches(&self, query: &ElementQuery<ViewId>) -> bool {
        if !query.categories.contains(&self.category) {
            return false;
        }
        if self.link.is_some() && !query.include_linked {
            return false;
        }
        if let (Some(view), Some(views)) = (query.view, &self.visible_in) {
            if !views.contains(&view) {
                return false;
            }
        }
        if !query.system_types.is_empty()
            && !self
                .system_type
                .as_ref()
                .is_some_and(|st| query.system_types.contains(st))
        {
            return false;
        }
        if let (Some(min), CategoryFamily::Pipe) = (query.min_pipe_diameter, self.category.family()) {
            if self.diameter.is_some_and(|d| d < min) {
                return false;
            }
        }
        true
    }
}

/// A view and its sketch plane. 3D views have none.
#[derive(Debug, Clone)]
pub struct ViewData {
    pub name: String,
    pub plane: Option<Plane>,
}

impl ViewData {
    /// Creates a view. Pass `None` for a 3D view.
    #[must_use]
    pub fn new(name: impl Into<String>, plane: Option<Plane>) -> Self {
        Self {
            name: name.into(),
            plane,
        }
    }
}

/// A linked model placed in the host with a transform.
#[derive(Debug, Clone)]
pub struct LinkData {
    pub name: String,
    pub transform: Matrix4,
}

/// A detail curve drawn in a view.
#[derive(Debug, Clone)]
pub struct AnnotationData {
    pub view: ViewId,
    pub line: LineSegment,
    /// Projection line color override.
    pub color: Option<Color>,
}

#[derive(Debug)]
struct Transaction {
    name: String,
    created: Vec<AnnotationId>,
    overridden: Vec<(AnnotationId, Option<Color>)>,
}

/// In-memory [`ModelDocument`] over the polyhedral kernel.
#[derive(Debug, Default)]
pub struct MemoryModel {
    kernel: PolyhedralKernel,
    elements: SlotMap<ElementId, ElementData>,
    views: SlotMap<ViewId, ViewData>,
    links: SlotMap<LinkId, LinkData>,
    annotations: SlotMap<AnnotationId, AnnotationData>,
    active_view: Option<ViewId>,
    transaction: Option<Transaction>,
    fail_after: Option<usize>,
    created_in_transaction: usize,
}

impl MemoryModel {
    /// Creates a new, empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Element operations ---

    /// Inserts an element and returns its ID.
    pub fn add_element(&mut self, data: ElementData) -> ElementId {
        self.elements.insert(data)
    }

    /// Returns the element data, if present.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&ElementData> {
        self.elements.get(id)
    }

    // --- View operations ---

    /// Inserts a view and returns its ID.
    pub fn add_view(&mut self, data: ViewData) -> ViewId {
        self.views.insert(data)
    }

    /// Returns the view data, if present.
    #[must_use]
    pub fn view(&self, id: ViewId) -> Option<&ViewData> {
        self.views.get(id)
    }

    /// Makes `view` the active view.
    pub fn set_active_view(&mut self, view: ViewId) {
        self.active_view = Some(view);
    }

    // --- Link operations ---

    /// Inserts a linked model and returns its ID.
    pub fn add_link(&mut self, name: impl Into<String>, transform: Matrix4) -> LinkId {
        self.links.insert(LinkData {
            name: name.into(),
            transform,
        })
    }

    // --- Annotation operations ---

    /// Annotation curves currently in the model.
    pub fn annotations(&self) -> impl Iterator<Item = &AnnotationData> {
        self.annotations.values()
    }

    /// Makes `create_annotation` reject every call after the first `count`
    /// in a transaction.
    pub fn fail_annotations_after(&mut self, count: usize) {
        self.fail_after = Some(count);
    }

    /// Whether a transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    fn open_transaction(&mut self) -> Result<&mut Transaction, DocumentError> {
        self.transaction.as_mut().ok_or(DocumentError::NoTransaction)
    }
}

impl ModelDocument for MemoryModel {
    type ElementId = ElementId;
    type ViewId = ViewId;
    type AnnotationId = AnnotationId;
    type Kernel = PolyhedralKernel;

    fn kernel(&self) -> &PolyhedralKernel {
        &self.kernel
    }

    fn enumerate(&self, query: &ElementQuery<ViewId>) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|(_, data)| data.matches(query))
            .map(|(id, _)| id)
            .collect()
    }

    fn category(&self, element: ElementId) -> Option<Category> {
        self.elements.get(element).map(|e| e.category)
    }

    fn bounding_box(&self, element: ElementId) -> Option<Aabb> {
        let data = self.elements.get(element)?;
        flatten_solids(&self.kernel, &data.geometry, None)
            .iter()
            .filter_map(|s| self.kernel.bounding_box(s))
            .reduce(|acc, bb| acc.union(&bb))
    }

    fn geometry(&self, element: ElementId) -> Vec<GeometryNode<Polyhedron>> {
        self.elements
            .get(element)
            .map(|e| e.geometry.clone())
            .unwrap_or_default()
    }

    fn link_transform(&self, element: ElementId) -> Option<Matrix4> {
        let link = self.elements.get(element)?.link?;
        self.links.get(link).map(|l| l.transform)
    }

    fn active_view(&self) -> Option<ViewContext<ViewId>> {
        let view = self.active_view?;
        let plane = self.views.get(view)?.plane.clone()?;
        Some(ViewContext { view, plane })
    }

    fn begin_transaction(&mut self, name: &str) -> Result<(), DocumentError> {
        if let Some(open) = &self.transaction {
            return Err(DocumentError::TransactionOpen(open.name.clone()));
        }
        debug!(name, "transaction started");
        self.transaction = Some(Transaction {
            name: name.to_owned(),
            created: Vec::new(),
            overridden: Vec::new(),
        });
        self.created_in_transaction = 0;
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), DocumentError> {
        let transaction = self.transaction.take().ok_or(DocumentError::NoTransaction)?;
        debug!(
            name = transaction.name,
            created = transaction.created.len(),
            "transaction committed"
        );
        Ok(())
    }

    fn rollback_transaction(&mut self) {
        let Some(transaction) = self.transaction.take() else {
            return;
        };
        for (id, previous) in transaction.overridden.into_iter().rev() {
            if let Some(annotation) = self.annotations.get_mut(id) {
                annotation.color = previous;
            }
        }
        for id in transaction.created {
            self.annotations.remove(id);
        }
        debug!(name = transaction.name, "transaction rolled back");
    }

    fn create_annotation(&mut self, view: ViewId, line: &LineSegment) -> Result<AnnotationId, DocumentError> {
        if !self.views.contains_key(view) {
            return Err(DocumentError::ViewNotFound(format!("{view:?}")));
        }
        self.open_transaction()?;
        if self.fail_after.is_some_and(|n| self.created_in_transaction >= n) {
            return Err(DocumentError::Rejected("detail curve creation failed".into()));
        }

        let id = self.annotations.insert(AnnotationData {
            view,
            line: line.clone(),
            color: None,
        });
        self.created_in_transaction += 1;
        self.open_transaction()?.created.push(id);
        Ok(id)
    }

    fn set_color_override(
        &mut self,
        view: ViewId,
        annotation: AnnotationId,
        color: Color,
    ) -> Result<(), DocumentError> {
        self.open_transaction()?;
        let data = self
            .annotations
            .get_mut(annotation)
            .filter(|a| a.view == view)
            .ok_or_else(|| DocumentError::AnnotationNotFound(format!("{annotation:?}")))?;
        let previous = data.color.replace(color);
        self.open_transaction()?.overridden.push((annotation, previous));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::MakeBox;
    use crate::math::{Point3, Vector3};
    use approx::assert_relative_eq;

    fn unit_box() -> Polyhedron {
        MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute()
            .unwrap()
    }

    fn segment() -> LineSegment {
        LineSegment::bound(Point3::origin(), Point3::new(1.0, 0.0, 0.0), 0.0).unwrap()
    }

    #[test]
    fn enumerate_filters_by_category_view_and_link() {
        let mut model = MemoryModel::new();
        let plan = model.add_view(ViewData::new("Level 1", Some(Plane::horizontal(0.0))));
        let other = model.add_view(ViewData::new("Level 2", Some(Plane::horizontal(4.0))));
        let link = model.add_link("Structure", Matrix4::identity());

        let duct = model.add_element(ElementData::new("d", Category::Duct).visible_in(vec![plan]));
        let hidden = model.add_element(ElementData::new("h", Category::Duct).visible_in(vec![other]));
        let beam = model.add_element(ElementData::new("b", Category::StructuralFraming).in_link(link));

        let mut query = ElementQuery::of_categories(vec![Category::Duct]);
        assert_eq!(model.enumerate(&query), vec![duct, hidden]);
        query.view = Some(plan);
        assert_eq!(model.enumerate(&query), vec![duct]);

        let mut structural = ElementQuery::<ViewId>::of_categories(vec![Category::StructuralFraming]);
        assert!(model.enumerate(&structural).is_empty());
        structural.include_linked = true;
        assert_eq!(model.enumerate(&structural), vec![beam]);
    }

    #[test]
    fn enumerate_filters_system_type_and_diameter() {
        let mut model = MemoryModel::new();
        let cold = model.add_element(
            ElementData::new("cw", Category::Pipe)
                .with_system_type("Domestic Cold Water")
                .with_diameter(0.1),
        );
        let small = model.add_element(
            ElementData::new("cw-small", Category::Pipe)
                .with_system_type("Domestic Cold Water")
                .with_diameter(0.01),
        );
        model.add_element(ElementData::new("hw", Category::Pipe).with_system_type("Domestic Hot Water"));

        let mut query = ElementQuery::<ViewId>::of_categories(vec![Category::Pipe]);
        query.system_types = vec!["Domestic Cold Water".into()];
        assert_eq!(model.enumerate(&query), vec![cold, small]);
        query.min_pipe_diameter = Some(0.05);
        assert_eq!(model.enumerate(&query), vec![cold]);
    }

    #[test]
    fn linked_elements_expose_transform() {
        let mut model = MemoryModel::new();
        let shift = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 3.0));
        let link = model.add_link("Structure", shift);
        let beam = model.add_element(
            ElementData::new("b", Category::StructuralFraming)
                .with_solid(unit_box())
                .in_link(link),
        );
        assert_eq!(model.link_transform(beam), Some(shift));
        let bb = model.bounding_box(beam).unwrap();
        assert_relative_eq!(bb.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn active_view_needs_a_plane() {
        let mut model = MemoryModel::new();
        let three_d = model.add_view(ViewData::new("{3D}", None));
        model.set_active_view(three_d);
        assert!(model.active_view().is_none());

        let plan = model.add_view(ViewData::new("Level 1", Some(Plane::horizontal(0.0))));
        model.set_active_view(plan);
        assert_eq!(model.active_view().unwrap().view, plan);
    }

    #[test]
    fn mutations_need_a_transaction() {
        let mut model = MemoryModel::new();
        let plan = model.add_view(ViewData::new("Level 1", Some(Plane::horizontal(0.0))));
        assert!(matches!(
            model.create_annotation(plan, &segment()),
            Err(DocumentError::NoTransaction)
        ));
        assert!(model.commit_transaction().is_err());
    }

    #[test]
    fn nested_transactions_are_refused() {
        let mut model = MemoryModel::new();
        model.begin_transaction("outer").unwrap();
        assert!(matches!(
            model.begin_transaction("inner"),
            Err(DocumentError::TransactionOpen(_))
        ));
    }

    #[test]
    fn commit_keeps_and_rollback_discards() {
        let mut model = MemoryModel::new();
        let plan = model.add_view(ViewData::new("Level 1", Some(Plane::horizontal(0.0))));

        model.begin_transaction("first").unwrap();
        let kept = model.create_annotation(plan, &segment()).unwrap();
        model.set_color_override(plan, kept, Color::rgb(1, 2, 3)).unwrap();
        model.commit_transaction().unwrap();

        model.begin_transaction("second").unwrap();
        model.create_annotation(plan, &segment()).unwrap();
        model.set_color_override(plan, kept, Color::rgb(9, 9, 9)).unwrap();
        model.rollback_transaction();

        let all: Vec<_> = model.annotations().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].color, Some(Color::rgb(1, 2, 3)));
    }

    #[test]
    fn unknown_view_is_rejected() {
        let mut model = MemoryModel::new();
        let plan = model.add_view(ViewData::new("Level 1", Some(Plane::horizontal(0.0))));
        let mut other = MemoryModel::new();
        other.add_view(ViewData::new("a", None));
        let foreign = other.add_view(ViewData::new("b", None));

        model.begin_transaction("t").unwrap();
        assert!(model.create_annotation(plan, &segment()).is_ok());
        assert!(matches!(
            model.create_annotation(foreign, &segment()),
            Err(DocumentError::ViewNotFound(_))
        ));
    }
}
