use thiserror::Error;

/// Top-level error type for clash detection runs.
#[derive(Debug, Error)]
pub enum ClashError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to geometric constructions.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors raised by a geometry kernel while evaluating solids.
///
/// These are distinct from an empty intersection: a kernel that returns
/// `Err` could not evaluate the operation at all.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("invalid solid: {0}")]
    InvalidSolid(String),

    #[error("boolean operation failed: {0}")]
    BooleanFailed(String),

    #[error("transform failed: {0}")]
    TransformFailed(String),
}

/// Which of the two element sets an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetSide {
    /// The elements being checked.
    Checked,
    /// The elements checked against.
    CheckedAgainst,
}

impl std::fmt::Display for SetSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checked => f.write_str("check"),
            Self::CheckedAgainst => f.write_str("check against"),
        }
    }
}

/// Set-level and scope-level failures that abort a run before any mutation.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("no elements to {side}")]
    InputEmpty { side: SetSide },

    #[error("cannot draw clash geometry: detection must be scoped to the active view")]
    AnnotationScope,

    #[error("the document has no active view with a drawing plane")]
    NoActiveView,
}

/// Errors reported by a host document while mutating it.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("no transaction is open")]
    NoTransaction,

    #[error("a transaction is already open: {0}")]
    TransactionOpen(String),

    #[error("view not found: {0}")]
    ViewNotFound(String),

    #[error("annotation not found: {0}")]
    AnnotationNotFound(String),

    #[error("host rejected the request: {0}")]
    Rejected(String),
}

/// Errors loading or validating a run configuration or scene.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse scene: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Convenience type alias for results using [`ClashError`].
pub type Result<T> = std::result::Result<T, ClashError>;
