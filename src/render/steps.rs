use crate::export::ExportLayout;
use crate::pipeline::{BoundingBox, Frame, RenderContext, RenderStep};
use crate::render::drawing;
use ab_glyph::FontArc;
use anyhow::Result;
use image::Rgba;

// Layout metrics, in layout units
const MARGIN: f32 = 20.0;
const IDENTITY_SIZE: f32 = 18.0;
const IDENTITY_TOP: f32 = 22.0;
const CARD_TOP_WITH_IDENTITY: f32 = 60.0;
const CARD_TOP: f32 = 28.0;
const CARD_BOTTOM_GAP: f32 = 40.0;
const CARD_RADIUS: f32 = 16.0;
const CARD_PADDING: f32 = 14.0;
const HEADER_SIZE: f32 = 15.0;
const LINE_SIZE: f32 = 12.5;
const LINE_HEIGHT: f32 = 1.6;
const GROUP_GAP: f32 = 8.0;
const CAPTION_SIZE: f32 = 10.0;
const CAPTION_INSET: f32 = 14.0;

const CARD_FILL: Rgba<u8> = Rgba([255, 255, 255, 96]);

/// Paint the chosen background across the full canvas
pub struct BackgroundStep;

impl RenderStep for BackgroundStep {
    fn process(&self, mut frame: Frame, layout: &ExportLayout, _context: &RenderContext) -> Result<Frame> {
        let (width, height) = frame.canvas.dimensions();
        frame.canvas = drawing::paint_background(width, height, &layout.background.spec);
        Ok(frame)
    }

    fn name(&self) -> &str {
        "Background"
    }
}

/// Display name and handle above the card
pub struct IdentityStep {
    pub font: FontArc,
}

impl RenderStep for IdentityStep {
    fn process(&self, mut frame: Frame, layout: &ExportLayout, context: &RenderContext) -> Result<Frame> {
        let Some(identity) = &layout.identity else {
            return Ok(frame);
        };
        let color = drawing::contrast_text(layout.background.spec.primary());
        drawing::draw_text(
            &mut frame.canvas,
            &self.font,
            context.px(MARGIN) as i32,
            context.px(IDENTITY_TOP) as i32,
            context.px(IDENTITY_SIZE),
            color,
            identity,
        );
        Ok(frame)
    }

    fn name(&self) -> &str {
        "Identity"
    }
}

/// Semi-transparent rounded card that holds the listing
pub struct CardStep;

impl RenderStep for CardStep {
    fn process(&self, mut frame: Frame, layout: &ExportLayout, context: &RenderContext) -> Result<Frame> {
        let (width, height) = frame.canvas.dimensions();
        let top = if layout.identity.is_some() {
            CARD_TOP_WITH_IDENTITY
        } else {
            CARD_TOP
        };
        let x = context.px(MARGIN) as u32;
        let y = context.px(top) as u32;
        let card = BoundingBox {
            x,
            y,
            width: width.saturating_sub(2 * x),
            height: height.saturating_sub(y + context.px(CARD_BOTTOM_GAP) as u32),
        };
        if card.width == 0 || card.height == 0 {
            anyhow::bail!("canvas {}x{} too small for the listing card", width, height);
        }

        drawing::blend_rounded_rect(&mut frame.canvas, card, context.px(CARD_RADIUS) as u32, CARD_FILL);
        frame.card = Some(card);
        Ok(frame)
    }

    fn name(&self) -> &str {
        "Card"
    }
}

/// Grouped show listing, clipped to the card
pub struct ListingStep {
    pub font: FontArc,
}

impl RenderStep for ListingStep {
    fn process(&self, mut frame: Frame, layout: &ExportLayout, context: &RenderContext) -> Result<Frame> {
        let card = frame
            .card
            .ok_or_else(|| anyhow::anyhow!("listing drawn before the card was placed"))?;

        // Draw into a copy of the card area so overflow is cut at the card edge
        let mut region =
            image::imageops::crop_imm(&frame.canvas, card.x, card.y, card.width, card.height).to_image();

        let left = context.px(CARD_PADDING) as i32;
        let mut y = context.px(CARD_PADDING);
        for (i, group) in layout.groups.iter().enumerate() {
            if i > 0 {
                y += context.px(GROUP_GAP);
            }
            if y > card.height as f32 {
                break;
            }
            let tint = group.tint.unwrap_or(drawing::TEXT_DARK);
            drawing::draw_text(&mut region, &self.font, left, y as i32, context.px(HEADER_SIZE), tint, &group.header);
            y += context.px(HEADER_SIZE * LINE_HEIGHT);

            for line in &group.lines {
                if y > card.height as f32 {
                    break;
                }
                drawing::draw_text(
                    &mut region,
                    &self.font,
                    left + context.px(LINE_SIZE * 0.5) as i32,
                    y as i32,
                    context.px(LINE_SIZE),
                    drawing::TEXT_DARK,
                    line,
                );
                y += context.px(LINE_SIZE * LINE_HEIGHT);
            }
        }

        image::imageops::replace(&mut frame.canvas, &region, card.x as i64, card.y as i64);
        Ok(frame)
    }

    fn name(&self) -> &str {
        "Listing"
    }
}

/// Background name in the bottom-right corner
pub struct CaptionStep {
    pub font: FontArc,
}

impl RenderStep for CaptionStep {
    fn process(&self, mut frame: Frame, layout: &ExportLayout, context: &RenderContext) -> Result<Frame> {
        let (width, height) = frame.canvas.dimensions();
        let size = context.px(CAPTION_SIZE);
        let (text_w, _) = drawing::measure_text(&self.font, size, &layout.caption);
        let x = width as i32 - context.px(CAPTION_INSET) as i32 - text_w as i32;
        let y = height as i32 - context.px(CAPTION_INSET) as i32 - size as i32;
        let color = drawing::contrast_text(layout.background.spec.primary());
        drawing::draw_text(&mut frame.canvas, &self.font, x, y, size, color, &layout.caption);
        Ok(frame)
    }

    fn name(&self) -> &str {
        "Caption"
    }
}
