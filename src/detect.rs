use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DetectionError, Result, SetSide};
use crate::geometry::Aabb;
use crate::math::Matrix4;
use crate::port::{GeometryKernel, GeometryNode, Intersection, ModelDocument, SolidOf};
use crate::session::ClashSession;

/// Tuning for the exact intersection test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionOptions {
    /// Solids and intersections must have a volume strictly greater than this.
    pub volume_epsilon: f64,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            volume_epsilon: 0.0,
        }
    }
}

/// Flattens a geometry tree into solids in the coordinates of `transform`.
///
/// Instance transforms compose from the outside in. A solid the kernel cannot
/// transform is skipped; the rest of the tree is still returned.
pub fn flatten_solids<K: GeometryKernel>(
    kernel: &K,
    nodes: &[GeometryNode<K::Solid>],
    transform: Option<&Matrix4>,
) -> Vec<K::Solid> {
    let mut out = Vec::new();
    flatten_into(kernel, nodes, transform, &mut out);
    out
}

fn flatten_into<K: GeometryKernel>(
    kernel: &K,
    nodes: &[GeometryNode<K::Solid>],
    transform: Option<&Matrix4>,
    out: &mut Vec<K::Solid>,
) {
    for node in nodes {
        match node {
            GeometryNode::Solid(solid) => match transform {
                None => out.push(solid.clone()),
                Some(matrix) => match kernel.transformed(solid, matrix) {
                    Ok(moved) => out.push(moved),
                    Err(err) => debug!(%err, "dropping solid that failed to transform"),
                },
            },
            GeometryNode::Instance {
                transform: local,
                children,
            } => {
                let composed = transform.map_or(*local, |outer| outer * local);
                flatten_into(kernel, children, Some(&composed), out);
            }
        }
    }
}

/// Clashes of one checked element, with opponents and intersection
/// solids indexed in parallel.
#[derive(Debug, Clone)]
pub struct ClashGroup<E, S> {
    pub element: E,
    pub opponents: Vec<E>,
    pub solids: Vec<S>,
}

/// Counters describing one detection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClashSummary {
    /// Checked elements that have usable solids.
    pub checked: usize,
    /// Checked-against elements that have usable solids.
    pub checked_against: usize,
    /// `checked * checked_against`.
    pub pair_tests: usize,
    /// Pairs that passed the bounding box pre-filter.
    pub candidate_pairs: usize,
    /// Solid-vs-solid boolean intersections evaluated.
    pub exact_tests: usize,
    /// Boolean intersections the kernel failed to evaluate.
    pub kernel_failures: usize,
    /// Checked elements with at least one clash.
    pub clashing_elements: usize,
    /// Clashing element pairs.
    pub clashing_pairs: usize,
}

impl fmt::Display for ClashSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Elements Selected to Check: {}", self.checked)?;
        writeln!(f, "Elements to Check Against: {}", self.checked_against)?;
        writeln!(f, "Number of Checks: {}", self.pair_tests)?;
        writeln!(f, "Candidate Pairs: {}", self.candidate_pairs)?;
        if self.kernel_failures > 0 {
            writeln!(f, "Kernel Failures: {}", self.kernel_failures)?;
        }
        writeln!(f, "Intersecting: {}", self.clashing_elements)?;
        write!(f, "Clashing Pairs: {}", self.clashing_pairs)
    }
}

/// Outcome of a detection pass.
#[derive(Debug, Clone)]
pub struct ClashReport<E, S> {
    groups: Vec<ClashGroup<E, S>>,
    summary: ClashSummary,
}

impl<E: Copy + Eq, S> ClashReport<E, S> {
    /// Clashing checked elements in input order.
    #[must_use]
    pub fn groups(&self) -> &[ClashGroup<E, S>] {
        &self.groups
    }

    /// Pass counters.
    #[must_use]
    pub fn summary(&self) -> &ClashSummary {
        &self.summary
    }

    /// Every clashing `(element, opponent)` pair.
    pub fn pairs(&self) -> impl Iterator<Item = (E, E)> + '_ {
        self.groups
            .iter()
            .flat_map(|g| g.opponents.iter().map(move |&b| (g.element, b)))
    }

    /// Every clash record as `(element, opponent, intersection solid)`.
    pub fn records(&self) -> impl Iterator<Item = (E, E, &S)> + '_ {
        self.groups.iter().flat_map(|g| {
            g.opponents
                .iter()
                .zip(&g.solids)
                .map(move |(&b, solid)| (g.element, b, solid))
        })
    }

    /// Whether `a` (checked) clashes with `b` (checked against).
    #[must_use]
    pub fn contains(&self, a: E, b: E) -> bool {
        self.opponents(a).is_some_and(|ops| ops.contains(&b))
    }

    /// Opponents of a checked element, if it clashes at all.
    #[must_use]
    pub fn opponents(&self, a: E) -> Option<&[E]> {
        self.groups
            .iter()
            .find(|g| g.element == a)
            .map(|g| g.opponents.as_slice())
    }

    /// `true` when no clash was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

struct Prepared<E, S> {
    id: E,
    bbox: Aabb,
    solids: Vec<S>,
}

/// Finds element pairs from two sets whose solids share positive volume.
pub struct ClashDetection<'a, E> {
    set_a: &'a [E],
    set_b: &'a [E],
    options: DetectionOptions,
}

impl<'a, E: Copy + Eq + Hash + fmt::Debug> ClashDetection<'a, E> {
    /// Creates a new detection between `set_a` (checked) and `set_b`
    /// (checked against).
    #[must_use]
    pub fn new(set_a: &'a [E], set_b: &'a [E]) -> Self {
        Self {
            set_a,
            set_b,
            options: DetectionOptions::default(),
        }
    }

    /// Overrides the detection options.
    #[must_use]
    pub fn with_options(mut self, options: DetectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes the detection against the session's document.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::InputEmpty` if either set is empty.
    pub fn execute<D>(&self, session: &ClashSession<'_, D>) -> Result<ClashReport<E, SolidOf<D>>>
    where
        D: ModelDocument<ElementId = E>,
    {
        if self.set_a.is_empty() {
            return Err(DetectionError::InputEmpty {
                side: SetSide::Checked,
            }
            .into());
        }
        if self.set_b.is_empty() {
            return Err(DetectionError::InputEmpty {
                side: SetSide::CheckedAgainst,
            }
            .into());
        }

        let document = session.document();
        let kernel = document.kernel();
        let prepared_a = self.prepare_all(document, self.set_a);
        let prepared_b = self.prepare_all(document, self.set_b);

        let mut summary = ClashSummary {
            checked: prepared_a.len(),
            checked_against: prepared_b.len(),
            pair_tests: prepared_a.len() * prepared_b.len(),
            ..ClashSummary::default()
        };

        let mut groups = Vec::new();
        for a in &prepared_a {
            let mut opponents = Vec::new();
            let mut solids = Vec::new();
            for b in &prepared_b {
                if a.id == b.id || !a.bbox.overlaps(&b.bbox) {
                    continue;
                }
                summary.candidate_pairs += 1;
                if let Some(solid) = self.first_clash(kernel, a, b, &mut summary) {
                    opponents.push(b.id);
                    solids.push(solid);
                }
            }
            if !opponents.is_empty() {
                summary.clashing_pairs += opponents.len();
                groups.push(ClashGroup {
                    element: a.id,
                    opponents,
                    solids,
                });
            }
        }
        summary.clashing_elements = groups.len();

        info!(
            checked = summary.checked,
            checked_against = summary.checked_against,
            candidates = summary.candidate_pairs,
            clashes = summary.clashing_pairs,
            "clash detection finished"
        );
        Ok(ClashReport { groups, summary })
    }

    fn prepare_all<D>(&self, document: &D, ids: &[E]) -> Vec<Prepared<E, SolidOf<D>>>
    where
        D: ModelDocument<ElementId = E>,
    {
        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|&id| self.prepare(document, id))
            .collect()
    }

    fn prepare<D>(&self, document: &D, id: E) -> Option<Prepared<E, SolidOf<D>>>
    where
        D: ModelDocument<ElementId = E>,
    {
        let kernel = document.kernel();
        let link = document.link_transform(id);
        let solids: Vec<_> = flatten_solids(kernel, &document.geometry(id), link.as_ref())
            .into_iter()
            .filter(|s| kernel.volume(s) > self.options.volume_epsilon)
            .collect();
        if solids.is_empty() {
            debug!(element = ?id, "no positive-volume solid, skipping element");
            return None;
        }

        let from_solids = solids
            .iter()
            .filter_map(|s| kernel.bounding_box(s))
            .reduce(|acc, bb| acc.union(&bb));
        let from_document = || {
            document
                .bounding_box(id)
                .map(|bb| link.map_or(bb, |m| bb.transformed(&m)))
        };
        let Some(bbox) = from_solids.or_else(from_document) else {
            debug!(element = ?id, "no bounding box, skipping element");
            return None;
        };

        Some(Prepared { id, bbox, solids })
    }

    fn first_clash<K: GeometryKernel>(
        &self,
        kernel: &K,
        a: &Prepared<E, K::Solid>,
        b: &Prepared<E, K::Solid>,
        summary: &mut ClashSummary,
    ) -> Option<K::Solid> {
        for sa in &a.solids {
            for sb in &b.solids {
                summary.exact_tests += 1;
                match kernel.intersect(sa, sb) {
                    Ok(Intersection::Solid(common))
                        if kernel.volume(&common) > self.options.volume_epsilon =>
                    {
                        return Some(common);
                    }
                    Ok(_) => {}
                    Err(err) => {
                        summary.kernel_failures += 1;
                        warn!(element = ?a.id, opponent = ?b.id, %err, "boolean intersection failed, treating sub-pair as clear");
                    }
                }
            }
        }
        None
    }
}
