use anyhow::Result;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::export::{CanvasSpec, ExportLayout};

/// Region of the canvas in raster pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Data that flows through the pipeline
#[derive(Clone)]
pub struct Frame {
    /// The canvas being drawn, already at raster size
    pub canvas: RgbaImage,

    /// Listing card placed by the card step (None until then)
    pub card: Option<BoundingBox>,
}

impl Frame {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::new(width, height),
            card: None,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all render steps
#[derive(Clone)]
pub struct RenderContext {
    /// Raster pixels per layout unit
    pub scale: u32,
    pub debug: Option<DebugConfig>,
}

impl RenderContext {
    /// Convert a layout length to raster pixels
    pub fn px(&self, units: f32) -> f32 {
        units * self.scale as f32
    }
}

/// Trait that all render steps must implement
pub trait RenderStep: Send + Sync {
    /// Draw onto the frame and hand it on
    fn process(&self, frame: Frame, layout: &ExportLayout, context: &RenderContext) -> Result<Frame>;

    /// Human-readable name for this step (used in logs and debug file names)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn RenderStep>>,
    context: RenderContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: RenderContext {
                scale: 1,
                debug: None,
            },
        }
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.context.scale = scale.max(1);
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });

        Ok(self)
    }

    /// Add a render step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn RenderStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order on a blank canvas sized for `layout`
    pub fn run(&self, layout: &ExportLayout) -> Result<Frame> {
        let canvas = CanvasSpec {
            scale: self.context.scale,
            ..layout.canvas
        };
        let (width, height) = canvas.pixel_size().ok_or_else(|| {
            anyhow::anyhow!(
                "canvas {}x{} at scale {} is too large to rasterize",
                canvas.width,
                canvas.height,
                canvas.scale
            )
        })?;
        let mut frame = Frame::blank(width, height);

        for (step_idx, step) in self.steps.iter().enumerate() {
            debug!("Running step: {} ({}x{})", step.name(), width, height);
            frame = step.process(frame, layout, &self.context)?;
            self.save_debug_output(&frame, step_idx, step.name())?;
        }

        Ok(frame)
    }

    fn save_debug_output(&self, frame: &Frame, step_idx: usize, step_name: &str) -> Result<()> {
        let Some(debug_config) = &self.context.debug else {
            return Ok(());
        };

        let filename = format!(
            "{:02}_{}.png",
            step_idx + 1,
            step_name.to_lowercase().replace(' ', "_")
        );
        let output_path = debug_config.output_dir.join(&filename);
        frame
            .canvas
            .save(&output_path)
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
        debug!("Debug: saved {}", filename);
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
