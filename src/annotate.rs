use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::category::{Category, CategoryFamily};
use crate::detect::ClashReport;
use crate::error::{DetectionError, DocumentError, Result};
use crate::geometry::{Color, LineSegment};
use crate::port::{GeometryKernel, ModelDocument};
use crate::session::ClashSession;

/// Name of the transaction wrapping all annotation writes of one run.
pub const TRANSACTION_NAME: &str = "Create Clash Annotations";

/// Line colors keyed by what a clash is against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub duct: Color,
    pub pipe: Color,
    pub conduit: Color,
    pub other: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            duct: Color::rgb(255, 153, 0),
            pipe: Color::rgb(255, 0, 102),
            conduit: Color::rgb(255, 255, 0),
            other: Color::rgb(255, 9, 0),
        }
    }
}

impl Palette {
    /// Color for a clash against an element of `category`.
    #[must_use]
    pub fn color_for(&self, category: Option<Category>) -> Color {
        match category.map(Category::family) {
            Some(CategoryFamily::Duct) => self.duct,
            Some(CategoryFamily::Pipe) => self.pipe,
            Some(CategoryFamily::Conduit) => self.conduit,
            Some(CategoryFamily::Structural | CategoryFamily::Other) | None => self.other,
        }
    }
}

/// Settings for drawing clash outlines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationOptions {
    /// Projected edges shorter than this are skipped.
    pub min_segment_length: f64,
    pub palette: Palette,
}

impl Default for AnnotationOptions {
    fn default() -> Self {
        Self {
            min_segment_length: 0.0,
            palette: Palette::default(),
        }
    }
}

/// Counts from one annotation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    /// Annotation curves committed to the view.
    pub created: usize,
    /// Projected edges skipped because they collapsed.
    pub degenerate_skipped: usize,
}

/// Draws the clash solids of a report as colored outlines on the session's
/// view plane.
pub struct AnnotateClashes<'r, E, S> {
    report: &'r ClashReport<E, S>,
    options: AnnotationOptions,
}

impl<'r, E: Copy + Eq, S> AnnotateClashes<'r, E, S> {
    /// Creates a new annotation pass over `report`.
    #[must_use]
    pub fn new(report: &'r ClashReport<E, S>) -> Self {
        Self {
            report,
            options: AnnotationOptions::default(),
        }
    }

    /// Overrides the annotation options.
    #[must_use]
    pub fn with_options(mut self, options: AnnotationOptions) -> Self {
        self.options = options;
        self
    }

    /// Projects every boundary edge of every clash solid onto the view plane
    /// and commits the resulting curves in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::AnnotationScope` if the session is not scoped
    /// to a view, before anything is written. Returns a `DocumentError` if
    /// the host fails mid-batch; the transaction is then rolled back.
    pub fn execute<D>(&self, session: &mut ClashSession<'_, D>) -> Result<AnnotationSummary>
    where
        D: ModelDocument<ElementId = E>,
        D::Kernel: GeometryKernel<Solid = S>,
    {
        let Some(view) = session.view().cloned() else {
            return Err(DetectionError::AnnotationScope.into());
        };

        let document = session.document();
        let kernel = document.kernel();
        let mut pending = Vec::new();
        let mut summary = AnnotationSummary::default();

        for (_, opponent, solid) in self.report.records() {
            let color = self.options.palette.color_for(document.category(opponent));
            for face in kernel.faces(solid) {
                for edge in kernel.boundary_edges(&face) {
                    let start = view.plane.project_point(&edge.start);
                    let end = view.plane.project_point(&edge.end);
                    match LineSegment::bound(start, end, self.options.min_segment_length) {
                        Ok(line) => pending.push((line, color)),
                        Err(err) => {
                            summary.degenerate_skipped += 1;
                            debug!(%err, "skipping projected edge");
                        }
                    }
                }
            }
        }

        if pending.is_empty() {
            return Ok(summary);
        }

        let document = session.document_mut();
        document.begin_transaction(TRANSACTION_NAME)?;
        let written = draw_all(document, view.view, &pending)
            .and_then(|created| document.commit_transaction().map(|()| created));
        match written {
            Ok(created) => {
                summary.created = created;
                info!(
                    created,
                    skipped = summary.degenerate_skipped,
                    "clash annotations committed"
                );
                Ok(summary)
            }
            Err(err) => {
                warn!(%err, "annotation failed, rolling back");
                document.rollback_transaction();
                Err(err.into())
            }
        }
    }
}

fn draw_all<D: ModelDocument>(
    document: &mut D,
    view: D::ViewId,
    pending: &[(LineSegment, Color)],
) -> std::result::Result<usize, DocumentError> {
    for (line, color) in pending {
        let annotation = document.create_annotation(view, line)?;
        document.set_color_override(view, annotation, *color)?;
    }
    Ok(pending.len())
}
