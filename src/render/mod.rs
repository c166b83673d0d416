pub mod drawing;
pub mod steps;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use ab_glyph::FontArc;
use anyhow::Context;
use image::RgbaImage;
use tracing::debug;

use crate::export::{ExportLayout, SnapshotService};
use crate::pipeline::Pipeline;

/// Fonts tried when none is configured; CJK coverage first since the listing is usually Japanese
pub const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
    "C:\\Windows\\Fonts\\meiryo.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
];

/// Build the standard export pipeline using the composable pipeline system
pub fn build_standard_pipeline(font: FontArc) -> Pipeline {
    use steps::*;

    Pipeline::new()
        .add_step(Arc::new(BackgroundStep))
        .add_step(Arc::new(IdentityStep { font: font.clone() }))
        .add_step(Arc::new(CardStep))
        .add_step(Arc::new(ListingStep { font: font.clone() }))
        .add_step(Arc::new(CaptionStep { font }))
}

/// Snapshot service that rasterizes layouts with `image` and `imageproc`
pub struct RasterSnapshot {
    font: FontArc,
    debug_dir: Option<PathBuf>,
    attempts: AtomicU32,
}

impl RasterSnapshot {
    pub fn new(font: FontArc) -> Self {
        Self {
            font,
            debug_dir: None,
            attempts: AtomicU32::new(0),
        }
    }

    pub fn from_font_file(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path).with_context(|| format!("Failed to read font {:?}", path))?;
        let font = FontArc::try_from_vec(data)
            .map_err(|e| anyhow::anyhow!("Failed to load font {:?}: {}", path, e))?;
        debug!("Loaded font {:?}", path);
        Ok(Self::new(font))
    }

    /// Use `configured` if given, otherwise the first fallback font present on this machine
    pub fn discover(configured: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = configured {
            return Self::from_font_file(path);
        }
        let path = FALLBACK_FONTS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .ok_or_else(|| anyhow::anyhow!("No font configured and none of the fallback fonts exist; pass --font"))?;
        Self::from_font_file(path)
    }

    /// Save each step's frame under `dir`, one `attempt_NN` subdirectory per snapshot
    pub fn with_debug(mut self, dir: PathBuf) -> Self {
        self.debug_dir = Some(dir);
        self
    }
}

impl SnapshotService for RasterSnapshot {
    fn snapshot(&self, layout: &ExportLayout) -> anyhow::Result<RgbaImage> {
        let mut pipeline = build_standard_pipeline(self.font.clone()).with_scale(layout.canvas.scale);
        if let Some(dir) = &self.debug_dir {
            let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
            pipeline = pipeline.with_debug(dir.join(format!("attempt_{:02}", attempt)))?;
        }
        debug!("Rendering with steps {:?}", pipeline.step_names());
        Ok(pipeline.run(layout)?.canvas)
    }
}
