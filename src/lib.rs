pub mod annotate;
pub mod category;
pub mod config;
pub mod detect;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod math;
pub mod memory;
pub mod port;
pub mod run;
pub mod selection;
pub mod session;

pub use annotate::{AnnotateClashes, AnnotationOptions, AnnotationSummary, Palette};
pub use category::{Category, CategoryFamily, CategoryGroup};
pub use config::ClashConfig;
pub use detect::{ClashDetection, ClashGroup, ClashReport, ClashSummary, DetectionOptions};
pub use error::{ClashError, Result};
pub use port::{GeometryKernel, GeometryNode, Intersection, ModelDocument};
pub use run::{run_clash_check, ClashOutcome};
pub use selection::SelectionRequest;
pub use session::ClashSession;
