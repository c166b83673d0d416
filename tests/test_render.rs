//! Integration tests for the render pipeline.
//!
//! Tests cover:
//! - Background painting at the configured scale
//! - Card placement and translucency
//! - Debug dumps of each step
//! - Full text rendering with a system font: clipping at the card edge, caption,
//!   identity line, and debug output across repeated snapshots

mod common;

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use livelog::Pipeline;
use livelog::SnapshotService;
use livelog::export::ListingGroup;
use livelog::render::RasterSnapshot;
use livelog::render::steps::{BackgroundStep, CardStep, ListingStep};

use common::*;

fn layout_with(background: &str, identity: Option<&str>) -> ExportLayout {
    let background = palette::find(background).expect("palette entry");
    ExportLayout {
        canvas: CanvasSpec {
            width: 90,
            height: 160,
            scale: 2,
        },
        caption: background.label.clone(),
        background,
        identity: identity.map(str::to_string),
        groups: Vec::new(),
    }
}

#[test]
fn background_fills_scaled_canvas() -> anyhow::Result<()> {
    let layout = layout_with("mint", None);
    let frame = Pipeline::new()
        .with_scale(layout.canvas.scale)
        .add_step(Arc::new(BackgroundStep))
        .run(&layout)?;

    assert_eq!(frame.canvas.dimensions(), (180, 320));
    assert_eq!(frame.canvas.get_pixel(0, 0), &Rgba([0xc3, 0xf0, 0xca, 255]));
    assert_eq!(frame.canvas.get_pixel(179, 319), &Rgba([0xc3, 0xf0, 0xca, 255]));
    assert!(frame.card.is_none());
    Ok(())
}

#[test]
fn gradient_background_changes_along_its_axis() -> anyhow::Result<()> {
    let layout = layout_with("night", None);
    let frame = Pipeline::new()
        .with_scale(layout.canvas.scale)
        .add_step(Arc::new(BackgroundStep))
        .run(&layout)?;

    // 180deg runs top to bottom: rows differ, columns do not
    assert_ne!(frame.canvas.get_pixel(90, 0), frame.canvas.get_pixel(90, 319));
    assert_eq!(frame.canvas.get_pixel(0, 100), frame.canvas.get_pixel(179, 100));
    Ok(())
}

#[test]
fn card_is_inset_and_translucent() -> anyhow::Result<()> {
    let layout = layout_with("mint", None);
    let frame = Pipeline::new()
        .with_scale(layout.canvas.scale)
        .add_step(Arc::new(BackgroundStep))
        .add_step(Arc::new(CardStep))
        .run(&layout)?;

    let card = frame.card.expect("card placed");
    assert_eq!((card.x, card.y), (40, 56));
    assert_eq!(card.width, 180 - 80);
    assert_eq!(card.height, 320 - 56 - 80);

    let bg = Rgba([0xc3, 0xf0, 0xca, 255]);
    let inside = *frame.canvas.get_pixel(card.x + card.width / 2, card.y + card.height / 2);
    assert_ne!(inside, bg);
    assert!(inside[0] > bg[0], "card should lighten the background");
    assert!(
        frame.canvas.pixels().all(|p| p[3] == 255),
        "exported canvas must stay opaque under the card"
    );
    assert_eq!(frame.canvas.get_pixel(5, 5), &bg);
    // Rounded corner leaves the card's bounding-box corner untouched
    assert_eq!(frame.canvas.get_pixel(card.x, card.y), &bg);
    Ok(())
}

#[test]
fn identity_line_pushes_card_down() -> anyhow::Result<()> {
    let layout = layout_with("mint", Some("Alice"));
    let frame = Pipeline::new()
        .with_scale(layout.canvas.scale)
        .add_step(Arc::new(BackgroundStep))
        .add_step(Arc::new(CardStep))
        .run(&layout)?;

    assert_eq!(frame.card.map(|c| c.y), Some(120));
    Ok(())
}

#[test]
fn debug_mode_saves_each_step() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let out = dir.path().join("steps");
    let layout = layout_with("pink", None);

    Pipeline::new()
        .with_scale(1)
        .with_debug(out.clone())?
        .add_step(Arc::new(BackgroundStep))
        .add_step(Arc::new(CardStep))
        .run(&layout)?;

    let mut names: Vec<String> = std::fs::read_dir(&out)?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    names.sort();
    assert_eq!(names, vec!["01_background.png", "02_card.png"]);

    let first = image::open(out.join("01_background.png"))?;
    assert_eq!((first.width(), first.height()), (90, 160));
    Ok(())
}

#[test]
fn debug_mode_refuses_non_empty_directory() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("leftover.png"), b"x")?;

    assert!(Pipeline::new().with_debug(dir.path().to_path_buf()).is_err());
    Ok(())
}

#[test]
fn listing_without_card_is_an_error() {
    let font = livelog::render::FALLBACK_FONTS
        .iter()
        .filter_map(|p| std::fs::read(p).ok())
        .find_map(|bytes| ab_glyph::FontArc::try_from_vec(bytes).ok())
        .expect("no fallback font installed");
    let layout = layout_with("blue", None);
    let result = Pipeline::new()
        .add_step(Arc::new(BackgroundStep))
        .add_step(Arc::new(ListingStep { font }))
        .run(&layout);
    assert!(result.is_err());
}

const PLAIN: Rgba<u8> = Rgba([0xf5, 0xf5, 0xf5, 255]);

/// Default 1080x1920 canvas with far more lines than the card can hold
fn long_listing_layout() -> ExportLayout {
    let background = palette::find("plain").expect("palette entry");
    let lines = (0..200)
        .map(|i| format!("2024/01/{:02} 夜 Tokyo Venue {}", i % 28 + 1, i))
        .collect();
    ExportLayout {
        canvas: CanvasSpec::default(),
        caption: background.label.clone(),
        background,
        identity: Some("Alice @alice".to_string()),
        groups: vec![ListingGroup {
            tour: "Long Tour".to_string(),
            header: "■ Long Tour".to_string(),
            tint: None,
            lines,
        }],
    }
}

fn count_in(
    image: &RgbaImage,
    xs: std::ops::Range<u32>,
    ys: std::ops::Range<u32>,
    pred: impl Fn(&Rgba<u8>) -> bool,
) -> usize {
    ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
        .filter(|&(x, y)| pred(image.get_pixel(x, y)))
        .count()
}

fn differs_in(image: &RgbaImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> usize {
    count_in(image, xs, ys, |p| p != &PLAIN)
}

fn dark_in(image: &RgbaImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> usize {
    count_in(image, xs, ys, |p| p[0] < 128)
}

#[test]
fn long_listing_is_clipped_to_card() -> anyhow::Result<()> {
    let snapshot = RasterSnapshot::discover(None)?;
    let image = snapshot.snapshot(&long_listing_layout())?;
    assert_eq!(image.dimensions(), (1080, 1920));

    // Card spans rows 180..1800 at scale 3 with an identity line; the band below
    // it must stay pure background even though the listing overflows
    assert_eq!(differs_in(&image, 0..1080, 1800..1830), 0);
    assert_eq!(differs_in(&image, 0..60, 180..1800), 0, "nothing drawn left of the card");

    // Listing text inside the card, at its top and down to its last rows
    assert!(dark_in(&image, 60..1020, 200..400) > 0);
    assert!(dark_in(&image, 60..1020, 1600..1800) > 0);
    // Identity line above the card
    assert!(dark_in(&image, 60..1020, 60..170) > 0);
    // Caption in the bottom-right corner
    assert!(dark_in(&image, 540..1080, 1830..1920) > 0);
    assert_eq!(differs_in(&image, 0..300, 1830..1920), 0);
    Ok(())
}

#[test]
fn debug_snapshots_can_be_retried() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let snapshot = RasterSnapshot::discover(None)?.with_debug(dir.path().to_path_buf());
    let mut layout = long_listing_layout();
    layout.canvas = CanvasSpec {
        width: 90,
        height: 160,
        scale: 1,
    };

    snapshot.snapshot(&layout)?;
    snapshot.snapshot(&layout)?;

    for attempt in ["attempt_01", "attempt_02"] {
        let mut names: Vec<String> = std::fs::read_dir(dir.path().join(attempt))?
            .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<Result<_, _>>()?;
        names.sort();
        assert_eq!(
            names,
            vec![
                "01_background.png",
                "02_identity.png",
                "03_card.png",
                "04_listing.png",
                "05_caption.png"
            ]
        );
    }
    Ok(())
}
