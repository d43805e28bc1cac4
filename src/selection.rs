use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::category::CategoryGroup;
use crate::port::{ElementQuery, ModelDocument};

/// Which elements make up one side of a clash check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionRequest {
    /// Category groups to collect.
    pub groups: Vec<CategoryGroup>,
    /// Duct system type names to keep. Empty keeps every duct.
    pub duct_system_types: Vec<String>,
    /// Pipe system type names to keep. Empty keeps every pipe.
    pub pipe_system_types: Vec<String>,
    /// Pipes narrower than this are ignored.
    pub min_pipe_diameter: Option<f64>,
}

impl SelectionRequest {
    /// Request for the given groups with no further filtering.
    #[must_use]
    pub fn of_groups(groups: impl Into<Vec<CategoryGroup>>) -> Self {
        Self {
            groups: groups.into(),
            ..Self::default()
        }
    }

    /// Document query for one group of this request.
    #[must_use]
    pub fn query<V>(&self, group: CategoryGroup, view: Option<V>) -> ElementQuery<V> {
        let mut query = ElementQuery::of_categories(group.categories());
        query.view = view;
        query.include_linked = group.searches_links();
        match group {
            CategoryGroup::Ducts => query.system_types.clone_from(&self.duct_system_types),
            CategoryGroup::Pipes => {
                query.system_types.clone_from(&self.pipe_system_types);
                query.min_pipe_diameter = self.min_pipe_diameter;
            }
            CategoryGroup::Conduit | CategoryGroup::Structural => {}
        }
        query
    }
}

/// Lists the elements selected by `request`, optionally limited to those
/// visible in `view`.
///
/// Elements reached through several groups are returned once, in the order
/// first seen.
pub fn collect_elements<D: ModelDocument>(
    document: &D,
    request: &SelectionRequest,
    view: Option<D::ViewId>,
) -> Vec<D::ElementId> {
    let mut seen = HashSet::new();
    let mut elements = Vec::new();
    for &group in &request.groups {
        let found = document.enumerate(&request.query(group, view));
        debug!(?group, count = found.len(), "enumerated category group");
        elements.extend(found.into_iter().filter(|id| seen.insert(*id)));
    }
    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;

    #[test]
    fn structural_query_searches_links_without_system_filter() {
        let request = SelectionRequest {
            groups: vec![CategoryGroup::Structural],
            duct_system_types: vec!["Supply Air".into()],
            pipe_system_types: vec!["Domestic Cold Water".into()],
            min_pipe_diameter: Some(0.1),
        };
        let query = request.query::<u32>(CategoryGroup::Structural, Some(7));
        assert!(query.include_linked);
        assert!(query.system_types.is_empty());
        assert!(query.min_pipe_diameter.is_none());
        assert_eq!(query.view, Some(7));
        assert!(query.categories.contains(&Category::StructuralFraming));
    }

    #[test]
    fn pipe_query_carries_filters() {
        let request = SelectionRequest {
            groups: vec![CategoryGroup::Pipes],
            pipe_system_types: vec!["Domestic Cold Water".into()],
            min_pipe_diameter: Some(0.05),
            ..SelectionRequest::default()
        };
        let query = request.query::<u32>(CategoryGroup::Pipes, None);
        assert_eq!(query.categories, vec![Category::Pipe, Category::PipeFitting]);
        assert_eq!(query.system_types, vec!["Domestic Cold Water".to_owned()]);
        assert_eq!(query.min_pipe_diameter, Some(0.05));
        assert!(!query.include_linked);
    }

    #[test]
    fn system_types_apply_to_their_own_group() {
        let request = SelectionRequest {
            groups: vec![CategoryGroup::Ducts, CategoryGroup::Pipes],
            duct_system_types: vec!["Supply Air".into()],
            ..SelectionRequest::default()
        };
        let ducts = request.query::<u32>(CategoryGroup::Ducts, None);
        let pipes = request.query::<u32>(CategoryGroup::Pipes, None);
        assert_eq!(ducts.system_types, vec!["Supply Air".to_owned()]);
        assert!(pipes.system_types.is_empty());
    }
}
