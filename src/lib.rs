pub mod catalog;
pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod selection;
pub mod session;

pub use config::AppConfig;
pub use error::{ConfigError, ExportError, LoadError};
pub use export::{
    ExportArtifact, ExportComposer, ExportLayout, ExportOptions, SnapshotService,
    palette::BackgroundOption,
};
pub use models::{Catalog, CheckState, SelectedShow, Show, ShowId, ShowTime, Tour, Year};
pub use pipeline::{BoundingBox, DebugConfig, Frame, Pipeline, RenderContext, RenderStep};
pub use selection::{CollapsePolicy, SelectionTree};
pub use session::{Notice, SessionState};
