use tracing::{info, info_span};

use crate::annotate::{AnnotateClashes, AnnotationSummary};
use crate::config::ClashConfig;
use crate::detect::{ClashDetection, ClashReport};
use crate::error::{DetectionError, Result, SetSide};
use crate::port::{ModelDocument, SolidOf};
use crate::selection::collect_elements;
use crate::session::ClashSession;

/// Result of a full clash check.
#[derive(Debug, Clone)]
pub struct ClashOutcome<E, S> {
    pub report: ClashReport<E, S>,
    /// Present when annotations were requested.
    pub annotations: Option<AnnotationSummary>,
}

/// Selects both element sets, detects clashes between them and optionally
/// draws the clash outlines in the active view.
///
/// The checked set is limited to the active view when
/// `config.active_view_only` is set. The checked-against set always spans
/// the whole model, linked models included for structural categories.
///
/// # Errors
///
/// Aborts before touching the document with
/// `DetectionError::AnnotationScope` when drawing is requested without view
/// scoping, `DetectionError::NoActiveView` when scoping is requested but no
/// plan view is active, and `DetectionError::InputEmpty` when either set is
/// empty. Annotation failures are returned after the transaction is rolled
/// back.
pub fn run_clash_check<D: ModelDocument>(
    session: ClashSession<'_, D>,
    config: &ClashConfig,
) -> Result<ClashOutcome<D::ElementId, SolidOf<D>>> {
    let _span = info_span!("clash_check").entered();
    config.validate()?;

    if config.draw_annotations && !config.active_view_only {
        return Err(DetectionError::AnnotationScope.into());
    }
    let mut session = if config.active_view_only {
        session.scoped_to_active_view()?
    } else {
        session
    };

    let view = session.view().map(|v| v.view);
    let set_a = collect_elements(session.document(), &config.check, view);
    if set_a.is_empty() {
        return Err(DetectionError::InputEmpty {
            side: SetSide::Checked,
        }
        .into());
    }
    let set_b = collect_elements(session.document(), &config.against, None);
    if set_b.is_empty() {
        return Err(DetectionError::InputEmpty {
            side: SetSide::CheckedAgainst,
        }
        .into());
    }
    info!(checked = set_a.len(), checked_against = set_b.len(), "elements selected");

    let report = ClashDetection::new(&set_a, &set_b)
        .with_options(config.detection)
        .execute(&session)?;

    let annotations = if config.draw_annotations {
        Some(
            AnnotateClashes::new(&report)
                .with_options(config.annotation)
                .execute(&mut session)?,
        )
    } else {
        None
    };

    Ok(ClashOutcome {
        report,
        annotations,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::category::{Category, CategoryGroup};
    use crate::error::ClashError;
    use crate::geometry::Plane;
    use crate::kernel::{MakeBox, MakePrism, Polyhedron};
    use crate::math::{Matrix4, Point3, Vector3};
    use crate::memory::{ElementData, ElementId, MemoryModel, ViewData};
    use crate::selection::SelectionRequest;

    fn block(min: [f64; 3], max: [f64; 3]) -> Polyhedron {
        MakeBox::new(Point3::from(min), Point3::from(max))
            .execute()
            .unwrap()
    }

    struct Fixture {
        model: MemoryModel,
        duct: ElementId,
        hidden_duct: ElementId,
        pipe: ElementId,
        beam: ElementId,
    }

    /// A duct and a pipe on level 1, a second duct only on level 2, and a
    /// linked beam crossing all three.
    fn fixture() -> Fixture {
        let mut model = MemoryModel::new();
        let level_1 = model.add_view(ViewData::new("Level 1", Some(Plane::horizontal(0.0))));
        let level_2 = model.add_view(ViewData::new("Level 2", Some(Plane::horizontal(4.0))));
        model.set_active_view(level_1);

        let link = model.add_link("Structure", Matrix4::new_translation(&Vector3::new(0.0, 0.0, 3.0)));
        let beam = model.add_element(
            ElementData::new("B-1", Category::StructuralFraming)
                .with_solid(block([-1.0, 0.0, -0.3], [10.0, 0.2, 0.3]))
                .in_link(link),
        );
        let duct = model.add_element(
            ElementData::new("SA-1", Category::Duct)
                .with_system_type("Supply Air")
                .with_solid(block([0.0, -1.0, 2.8], [0.5, 1.0, 3.2]))
                .visible_in(vec![level_1]),
        );
        let hidden_duct = model.add_element(
            ElementData::new("SA-2", Category::Duct)
                .with_system_type("Supply Air")
                .with_solid(block([5.0, -1.0, 2.8], [5.5, 1.0, 3.2]))
                .visible_in(vec![level_2]),
        );
        let pipe = model.add_element(
            ElementData::new("CW-1", Category::Pipe)
                .with_system_type("Domestic Cold Water")
                .with_diameter(0.1)
                .with_solid(
                    MakePrism::regular(Point3::new(2.0, -1.0, 3.0), Point3::new(2.0, 1.0, 3.0), 0.05, 8)
                        .unwrap()
                        .execute()
                        .unwrap(),
                )
                .visible_in(vec![level_1, level_2]),
        );
        Fixture {
            model,
            duct,
            hidden_duct,
            pipe,
            beam,
        }
    }

    #[test]
    fn whole_model_check_finds_every_crossing() {
        let mut f = fixture();
        let outcome = run_clash_check(ClashSession::new(&mut f.model), &ClashConfig::default()).unwrap();

        let report = &outcome.report;
        assert!(report.contains(f.duct, f.beam));
        assert!(report.contains(f.hidden_duct, f.beam));
        assert!(report.contains(f.pipe, f.beam));
        assert_eq!(report.summary().checked, 3);
        assert_eq!(report.summary().checked_against, 1);
        assert!(outcome.annotations.is_none());
    }

    #[test]
    fn active_view_limits_only_the_checked_set() {
        let mut f = fixture();
        let config = ClashConfig {
            active_view_only: true,
            ..ClashConfig::default()
        };
        let outcome = run_clash_check(ClashSession::new(&mut f.model), &config).unwrap();

        let clashing: Vec<_> = outcome.report.pairs().map(|(a, _)| a).collect();
        assert_eq!(clashing, vec![f.duct, f.pipe]);
        assert!(outcome.report.opponents(f.hidden_duct).is_none());
    }

    #[test]
    fn pipe_filter_leaves_ducts_alone() {
        let mut f = fixture();
        let mut config = ClashConfig::default();
        config.check.pipe_system_types = vec!["Domestic Hot Water".into()];
        let outcome = run_clash_check(ClashSession::new(&mut f.model), &config).unwrap();

        assert_eq!(outcome.report.summary().checked, 2);
        assert!(outcome.report.contains(f.duct, f.beam));
        assert!(outcome.report.opponents(f.pipe).is_none());
    }

    #[test]
    fn duct_filter_keeps_unfiltered_pipes() {
        let mut f = fixture();
        let exhaust = f.model.add_element(
            ElementData::new("EA-1", Category::Duct)
                .with_system_type("Exhaust Air")
                .with_solid(block([7.0, -1.0, 2.8], [7.5, 1.0, 3.2])),
        );
        let config = ClashConfig {
            check: SelectionRequest {
                groups: vec![CategoryGroup::Ducts, CategoryGroup::Pipes],
                duct_system_types: vec!["Supply Air".into()],
                ..SelectionRequest::default()
            },
            ..ClashConfig::default()
        };
        let outcome = run_clash_check(ClashSession::new(&mut f.model), &config).unwrap();

        let report = &outcome.report;
        assert_eq!(report.summary().checked, 3);
        assert!(report.contains(f.duct, f.beam));
        assert!(report.contains(f.hidden_duct, f.beam));
        assert!(report.contains(f.pipe, f.beam));
        assert!(report.opponents(exhaust).is_none());
    }

    #[test]
    fn drawing_without_view_scope_aborts_first() {
        let mut model = MemoryModel::new();
        let config = ClashConfig {
            draw_annotations: true,
            ..ClashConfig::default()
        };
        let err = run_clash_check(ClashSession::new(&mut model), &config).unwrap_err();
        assert!(matches!(err, ClashError::Detection(DetectionError::AnnotationScope)));
        assert_eq!(
            err.to_string(),
            "cannot draw clash geometry: detection must be scoped to the active view"
        );
    }

    #[test]
    fn view_scope_needs_an_active_plan_view() {
        let mut model = MemoryModel::new();
        let three_d = model.add_view(ViewData::new("{3D}", None));
        model.set_active_view(three_d);
        let config = ClashConfig {
            active_view_only: true,
            ..ClashConfig::default()
        };
        let err = run_clash_check(ClashSession::new(&mut model), &config).unwrap_err();
        assert!(matches!(err, ClashError::Detection(DetectionError::NoActiveView)));
    }

    #[test]
    fn empty_against_set_aborts() {
        let mut f = fixture();
        let config = ClashConfig {
            against: SelectionRequest::of_groups(vec![CategoryGroup::Conduit]),
            ..ClashConfig::default()
        };
        let err = run_clash_check(ClashSession::new(&mut f.model), &config).unwrap_err();
        assert!(matches!(
            err,
            ClashError::Detection(DetectionError::InputEmpty {
                side: SetSide::CheckedAgainst
            })
        ));
        assert_eq!(err.to_string(), "no elements to check against");
    }

    #[test]
    fn draws_outlines_in_the_active_view() {
        let mut f = fixture();
        let config = ClashConfig {
            active_view_only: true,
            draw_annotations: true,
            ..ClashConfig::default()
        };
        let outcome = run_clash_check(ClashSession::new(&mut f.model), &config).unwrap();

        let drawn = outcome.annotations.unwrap();
        assert!(drawn.created > 0);
        assert_eq!(f.model.annotations().count(), drawn.created);
        assert!(!f.model.in_transaction());
    }
}
