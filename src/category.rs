use serde::{Deserialize, Serialize};

/// Host category of a building element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Duct,
    DuctFitting,
    Pipe,
    PipeFitting,
    Conduit,
    ConduitFitting,
    StructuralFraming,
    StructuralColumn,
    StructuralFoundation,
    StructuralTruss,
    StructuralStiffener,
    StructuralTendon,
    Column,
    Other,
}

/// Coarse grouping of categories, used to pick annotation colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryFamily {
    Duct,
    Pipe,
    Conduit,
    Structural,
    Other,
}

impl Category {
    /// The family this category belongs to. Fittings share their run's family.
    #[must_use]
    pub fn family(self) -> CategoryFamily {
        match self {
            Self::Duct | Self::DuctFitting => CategoryFamily::Duct,
            Self::Pipe | Self::PipeFitting => CategoryFamily::Pipe,
            Self::Conduit | Self::ConduitFitting => CategoryFamily::Conduit,
            Self::StructuralFraming
            | Self::StructuralColumn
            | Self::StructuralFoundation
            | Self::StructuralTruss
            | Self::StructuralStiffener
            | Self::StructuralTendon
            | Self::Column => CategoryFamily::Structural,
            Self::Other => CategoryFamily::Other,
        }
    }
}

/// A user-facing selection group that expands into several host categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryGroup {
    Ducts,
    Pipes,
    Conduit,
    Structural,
}

impl CategoryGroup {
    /// Host categories covered by this group.
    #[must_use]
    pub fn categories(self) -> &'static [Category] {
        match self {
            Self::Ducts => &[Category::Duct, Category::DuctFitting],
            Self::Pipes => &[Category::Pipe, Category::PipeFitting],
            Self::Conduit => &[Category::Conduit, Category::ConduitFitting],
            Self::Structural => &[
                Category::StructuralFraming,
                Category::StructuralColumn,
                Category::StructuralFoundation,
                Category::StructuralTruss,
                Category::StructuralStiffener,
                Category::StructuralTendon,
                Category::Column,
            ],
        }
    }

    /// Structural models usually live in a linked document.
    #[must_use]
    pub fn searches_links(self) -> bool {
        matches!(self, Self::Structural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fittings_share_family() {
        assert_eq!(Category::DuctFitting.family(), CategoryFamily::Duct);
        assert_eq!(Category::PipeFitting.family(), Category::Pipe.family());
        assert_eq!(Category::Column.family(), CategoryFamily::Structural);
    }

    #[test]
    fn groups_expand() {
        assert_eq!(CategoryGroup::Ducts.categories().len(), 2);
        assert_eq!(CategoryGroup::Structural.categories().len(), 7);
        assert!(CategoryGroup::Structural.searches_links());
        assert!(!CategoryGroup::Pipes.searches_links());
    }
}
