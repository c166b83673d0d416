mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from livelog for tests
pub use livelog::export::{CanvasSpec, TimeLabels, palette};
pub use livelog::{
    Catalog, CheckState, CollapsePolicy, ExportComposer, ExportError, ExportLayout,
    ExportOptions, Notice, SelectionTree, SessionState, ShowId,
};
