use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::{self, CatalogSource};
use crate::error::ExportError;
use crate::export::{ExportArtifact, ExportComposer, ExportOptions, SnapshotService};
use crate::models::Catalog;
use crate::selection::{CollapsePolicy, SelectionTree};

/// User-facing message produced by a recovered failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    LoadFailed(String),
    NothingSelected,
    NoBackground,
    RenderFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::LoadFailed(reason) => write!(f, "Could not load the tour list: {}", reason),
            Notice::NothingSelected => f.write_str("Select at least one show before exporting."),
            Notice::NoBackground => f.write_str("Choose a background before exporting."),
            Notice::RenderFailed(reason) => write!(f, "Could not create the image: {}", reason),
        }
    }
}

impl From<&ExportError> for Notice {
    fn from(err: &ExportError) -> Self {
        match err {
            ExportError::EmptySelection => Notice::NothingSelected,
            ExportError::MissingBackground => Notice::NoBackground,
            other => Notice::RenderFailed(other.to_string()),
        }
    }
}

/// Everything one session owns: the catalog, its selection, and pending notices
pub struct SessionState {
    catalog: Arc<Catalog>,
    selection: SelectionTree,
    notices: Vec<Notice>,
}

impl SessionState {
    pub fn from_catalog(catalog: Catalog, collapse_policy: CollapsePolicy) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            selection: SelectionTree::new(Arc::clone(&catalog), collapse_policy),
            catalog,
            notices: Vec::new(),
        }
    }

    /// Load the catalog; any load failure leaves an empty catalog and a notice
    pub async fn initialize(source: &CatalogSource, collapse_policy: CollapsePolicy) -> Self {
        match catalog::load(source).await {
            Ok(catalog) => Self::from_catalog(catalog, collapse_policy),
            Err(e) => {
                warn!("Failed to load catalog from {}: {}", source, e);
                let mut session = Self::from_catalog(Catalog::default(), collapse_policy);
                session.notices.push(Notice::LoadFailed(e.to_string()));
                session
            }
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionTree {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionTree {
        &mut self.selection
    }

    /// Check the two export preconditions without rendering anything
    pub fn check_export_ready(&mut self) -> Result<(), ExportError> {
        let result = if self.selection.selected_count() == 0 {
            Err(ExportError::EmptySelection)
        } else if self.selection.background().is_none() {
            Err(ExportError::MissingBackground)
        } else {
            Ok(())
        };
        if let Err(e) = &result {
            self.notices.push(Notice::from(e));
        }
        result
    }

    /// Build options from the current form values and export. Failures become
    /// notices and leave the selection as it was.
    pub fn export<S: SnapshotService>(
        &mut self,
        composer: &ExportComposer<S>,
        display_name: Option<&str>,
        display_handle: Option<&str>,
    ) -> Result<ExportArtifact, ExportError> {
        let options = ExportOptions::new(
            self.selection.background().cloned(),
            display_name,
            display_handle,
        );
        let selected = self.selection.selected_shows();
        match composer.export(&self.catalog, &selected, &options) {
            Ok(artifact) => {
                info!("Exported {} shows", selected.len());
                Ok(artifact)
            }
            Err(e) => {
                warn!("Export failed: {}", e);
                self.notices.push(Notice::from(&e));
                Err(e)
            }
        }
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
