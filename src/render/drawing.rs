use ab_glyph::{FontArc, PxScale};
use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::color::ColorSpec;
use crate::pipeline::BoundingBox;

pub const TEXT_DARK: Rgba<u8> = Rgba([34, 34, 34, 255]);
pub const TEXT_LIGHT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Fill a whole canvas with a solid color or gradient
pub fn paint_background(width: u32, height: u32, spec: &ColorSpec) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| spec.color_at(x, y, width, height))
}

/// Alpha-blend `color` over a rounded rectangle; the canvas keeps its own alpha
pub fn blend_rounded_rect(canvas: &mut RgbaImage, region: BoundingBox, radius: u32, color: Rgba<u8>) {
    let radius = radius.min(region.width / 2).min(region.height / 2) as f32;
    let x_end = (region.x + region.width).min(canvas.width());
    let y_end = (region.y + region.height).min(canvas.height());

    for y in region.y..y_end {
        for x in region.x..x_end {
            let local_x = (x - region.x) as f32 + 0.5;
            let local_y = (y - region.y) as f32 + 0.5;
            if inside_rounded(local_x, local_y, region.width as f32, region.height as f32, radius) {
                let pixel = canvas.get_pixel_mut(x, y);
                let alpha = pixel[3];
                pixel.blend(&color);
                pixel[3] = alpha;
            }
        }
    }
}

fn inside_rounded(x: f32, y: f32, width: f32, height: f32, radius: f32) -> bool {
    let cx = x.clamp(radius, width - radius);
    let cy = y.clamp(radius, height - radius);
    let (dx, dy) = (x - cx, y - cy);
    dx * dx + dy * dy <= radius * radius
}

/// Dark text on light backgrounds, white text on dark ones
pub fn contrast_text(background: Rgba<u8>) -> Rgba<u8> {
    let luma = 0.299 * background[0] as f32 + 0.587 * background[1] as f32 + 0.114 * background[2] as f32;
    if luma < 140.0 { TEXT_LIGHT } else { TEXT_DARK }
}

pub fn draw_text(canvas: &mut RgbaImage, font: &FontArc, x: i32, y: i32, size: f32, color: Rgba<u8>, text: &str) {
    draw_text_mut(canvas, color, x, y, PxScale::from(size), font, text);
}

pub fn measure_text(font: &FontArc, size: f32, text: &str) -> (u32, u32) {
    text_size(PxScale::from(size), font, text)
}
