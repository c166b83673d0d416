use std::cell::RefCell;
use std::io::Write;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use livelog::export::{CanvasSpec, ExportComposer, TimeLabels};
use livelog::{Catalog, CollapsePolicy, ExportLayout, SelectionTree, SnapshotService};
use tempfile::NamedTempFile;

/// One tour, one year, two shows: the canonical export scenario
pub const SPRING_TOUR_JSON: &str = r#"[
  {
    "liveName": "Spring Tour",
    "years": [
      {
        "year": 2024,
        "shows": [
          { "date": "2024-02-10", "prefecture": "Saitama", "venue": "Arena A" },
          { "date": "2024-02-11", "time": "PM", "prefecture": "Tokyo", "venue": "Hall B" }
        ]
      }
    ]
  }
]"#;

/// Two tours; TourA spans two years, TourB has one show
pub const TWO_TOURS_JSON: &str = r##"[
  {
    "liveName": "TourA",
    "color": "#d94a7a",
    "years": [
      {
        "year": 2023,
        "shows": [
          { "date": "2023-11-03", "time": "AM", "prefecture": "Osaka", "venue": "Hall C" }
        ]
      },
      {
        "year": 2024,
        "shows": [
          { "date": "2024-05-01", "prefecture": "Tokyo", "venue": "Dome X" },
          { "date": "2024-05-02", "prefecture": "Tokyo", "venue": "Dome Y" }
        ]
      }
    ]
  },
  {
    "liveName": "TourB",
    "years": [
      {
        "year": 2023,
        "shows": [
          { "date": "2023-08-20", "time": "PM", "prefecture": "Aichi", "venue": "Arena Z" }
        ]
      }
    ]
  }
]"##;

pub fn spring_tour_catalog() -> Catalog {
    livelog::catalog::parse(SPRING_TOUR_JSON).expect("Failed to parse spring tour fixture")
}

pub fn two_tours_catalog() -> Catalog {
    livelog::catalog::parse(TWO_TOURS_JSON).expect("Failed to parse two tours fixture")
}

pub fn tree_for(catalog: Catalog) -> SelectionTree {
    SelectionTree::new(Arc::new(catalog), CollapsePolicy::KeepOpen)
}

/// Writes `json` to a temp file that lives as long as the returned handle
pub fn write_catalog_file(json: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("Failed to create temp catalog file");
    file.write_all(json.as_bytes())
        .expect("Failed to write temp catalog file");
    file
}

/// Snapshot stand-in: remembers every layout and returns a flat image of the raster size
#[derive(Default)]
pub struct RecordingSnapshot {
    pub layouts: RefCell<Vec<ExportLayout>>,
}

impl SnapshotService for RecordingSnapshot {
    fn snapshot(&self, layout: &ExportLayout) -> anyhow::Result<RgbaImage> {
        self.layouts.borrow_mut().push(layout.clone());
        let (width, height) = layout
            .canvas
            .pixel_size()
            .ok_or_else(|| anyhow::anyhow!("canvas too large"))?;
        Ok(RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255])))
    }
}

/// Snapshot stand-in that always fails
pub struct FailingSnapshot;

impl SnapshotService for FailingSnapshot {
    fn snapshot(&self, _layout: &ExportLayout) -> anyhow::Result<RgbaImage> {
        anyhow::bail!("canvas unavailable")
    }
}

/// Small canvas keeps encoded test artifacts cheap
pub const TEST_CANVAS: CanvasSpec = CanvasSpec {
    width: 36,
    height: 64,
    scale: 2,
};

pub fn composer<S: SnapshotService>(snapshot: S) -> ExportComposer<S> {
    ExportComposer::new(snapshot, TimeLabels::default(), TEST_CANVAS)
}
