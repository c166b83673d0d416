pub mod palette;

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgba, RgbaImage};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ExportError;
use crate::models::{Catalog, SelectedShow, Show, ShowTime};
use palette::BackgroundOption;

pub const HEADER_MARK: &str = "■";
pub const DEFAULT_FILE_NAME: &str = "pg_live_log.png";

/// Localized tokens for the AM/PM slot of a show
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimeLabels {
    pub daytime: String,
    pub evening: String,
}

impl Default for TimeLabels {
    fn default() -> Self {
        Self {
            daytime: "昼".to_string(),
            evening: "夜".to_string(),
        }
    }
}

impl TimeLabels {
    pub fn label(&self, time: Option<ShowTime>) -> &str {
        match time {
            Some(ShowTime::Am) => self.daytime.as_str(),
            Some(ShowTime::Pm) => self.evening.as_str(),
            None => "",
        }
    }
}

/// Portrait canvas in layout units; the raster is `width * scale` by `height * scale`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CanvasSpec {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
}

impl Default for CanvasSpec {
    fn default() -> Self {
        Self {
            width: 360,
            height: 640,
            scale: 3,
        }
    }
}

/// Longest raster side accepted for an export
pub const MAX_PIXEL_SIDE: u32 = 16384;

impl CanvasSpec {
    /// Raster size, or None when a side is empty or exceeds `MAX_PIXEL_SIDE`
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        let scale = self.scale.max(1);
        let width = self.width.checked_mul(scale)?;
        let height = self.height.checked_mul(scale)?;
        let fits = |side: u32| (1..=MAX_PIXEL_SIDE).contains(&side);
        (fits(width) && fits(height)).then_some((width, height))
    }
}

/// Form values captured at the moment of an export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOptions {
    pub background: Option<BackgroundOption>,
    pub display_name: Option<String>,
    pub display_handle: Option<String>,
}

impl ExportOptions {
    /// Blank fields count as absent; the handle gains a leading `@` when missing
    pub fn new(
        background: Option<BackgroundOption>,
        display_name: Option<&str>,
        display_handle: Option<&str>,
    ) -> Self {
        let display_name = display_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let display_handle = display_handle
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|h| {
                if h.starts_with('@') {
                    h.to_string()
                } else {
                    format!("@{}", h)
                }
            });
        Self {
            background,
            display_name,
            display_handle,
        }
    }

    pub fn identity_line(&self) -> Option<String> {
        match (&self.display_name, &self.display_handle) {
            (Some(name), Some(handle)) => Some(format!("{} {}", name, handle)),
            (Some(name), None) => Some(name.clone()),
            (None, Some(handle)) => Some(handle.clone()),
            (None, None) => None,
        }
    }
}

/// Shows of one tour under a single header
#[derive(Debug, Clone, PartialEq)]
pub struct ListingGroup {
    pub tour: String,
    pub header: String,
    pub tint: Option<Rgba<u8>>,
    pub lines: Vec<String>,
}

/// Everything the snapshot service needs to draw the export image
#[derive(Debug, Clone, PartialEq)]
pub struct ExportLayout {
    pub canvas: CanvasSpec,
    pub background: BackgroundOption,
    pub identity: Option<String>,
    pub groups: Vec<ListingGroup>,
    pub caption: String,
}

impl ExportLayout {
    /// Headers and show lines flattened in drawing order
    pub fn listing(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|g| std::iter::once(g.header.clone()).chain(g.lines.iter().cloned()))
            .collect()
    }
}

/// The opaque raster primitive: turns a layout into pixels at `layout.canvas.scale`
pub trait SnapshotService {
    fn snapshot(&self, layout: &ExportLayout) -> anyhow::Result<RgbaImage>;
}

impl<S: SnapshotService + ?Sized> SnapshotService for &S {
    fn snapshot(&self, layout: &ExportLayout) -> anyhow::Result<RgbaImage> {
        (**self).snapshot(layout)
    }
}

/// Encoded result of one export
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl ExportArtifact {
    pub fn from_image(image: &RgbaImage) -> Result<Self, ExportError> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self {
            width: image.width(),
            height: image.height(),
            png,
        })
    }

    /// Write the PNG, replacing whatever a previous export left at `path`
    pub fn save(&self, path: &Path) -> Result<PathBuf, ExportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ExportError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, &self.png).map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Saved {}x{} export to {}", self.width, self.height, path.display());
        Ok(path.to_path_buf())
    }
}

/// `2024/02/11 夜 Tokyo Hall B`; empty parts are skipped so no double spaces appear
pub fn format_show_line(show: &Show, labels: &TimeLabels) -> String {
    let date = format!(
        "{:04}/{:02}/{:02}",
        show.date.year(),
        u8::from(show.date.month()),
        show.date.day()
    );
    [
        date.as_str(),
        labels.label(show.time),
        show.prefecture.as_str(),
        show.venue.as_str(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

pub struct ExportComposer<S> {
    snapshot: S,
    labels: TimeLabels,
    canvas: CanvasSpec,
}

impl<S: SnapshotService> ExportComposer<S> {
    pub fn new(snapshot: S, labels: TimeLabels, canvas: CanvasSpec) -> Self {
        Self {
            snapshot,
            labels,
            canvas,
        }
    }

    pub fn labels(&self) -> &TimeLabels {
        &self.labels
    }

    /// Build the layout. `selected` must be in catalog order; a header is emitted
    /// whenever the tour changes from the previous show.
    pub fn compose(
        &self,
        catalog: &Catalog,
        selected: &[SelectedShow],
        options: &ExportOptions,
    ) -> Result<ExportLayout, ExportError> {
        if selected.is_empty() {
            return Err(ExportError::EmptySelection);
        }
        let background = options
            .background
            .clone()
            .ok_or(ExportError::MissingBackground)?;

        let mut groups: Vec<ListingGroup> = Vec::new();
        for entry in selected {
            let starts_group = groups.last().is_none_or(|g| g.tour != entry.tour);
            if starts_group {
                groups.push(ListingGroup {
                    tour: entry.tour.clone(),
                    header: format!("{} {}", HEADER_MARK, entry.tour),
                    tint: catalog
                        .tour(&entry.tour)
                        .and_then(|t| t.color.as_ref())
                        .map(|c| c.primary()),
                    lines: Vec::new(),
                });
            }
            if let Some(group) = groups.last_mut() {
                group.lines.push(format_show_line(&entry.show, &self.labels));
            }
        }

        debug!(
            "Composed {} groups from {} shows",
            groups.len(),
            selected.len()
        );

        Ok(ExportLayout {
            canvas: self.canvas,
            caption: background.label.clone(),
            background,
            identity: options.identity_line(),
            groups,
        })
    }

    /// Compose, rasterize and encode. Nothing here touches the selection, so a
    /// failed export can simply be retried.
    pub fn export(
        &self,
        catalog: &Catalog,
        selected: &[SelectedShow],
        options: &ExportOptions,
    ) -> Result<ExportArtifact, ExportError> {
        let layout = self.compose(catalog, selected, options)?;
        let image = self
            .snapshot
            .snapshot(&layout)
            .map_err(ExportError::Render)?;
        ExportArtifact::from_image(&image)
    }
}
