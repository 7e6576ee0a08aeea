//! Diagnostic rendering of a detection

use gesture_shared::BoundingBox;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;

use crate::geometry::PixelPoint;

pub const COLOR_WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const COLOR_GRAY: Rgb<u8> = Rgb([127, 127, 127]);
pub const COLOR_RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const COLOR_GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const COLOR_BLUE: Rgb<u8> = Rgb([0, 0, 255]);

const FINGERTIP_RADIUS: i32 = 10;
const FINGERTIP_THICKNESS: i32 = 3;
const SPOKE_THICKNESS: i32 = 3;
const BOUNDS_THICKNESS: u32 = 2;
const CENTER_RADIUS: i32 = 10;
const PALM_THICKNESS: i32 = 10;

/// Blank canvas shown when nothing was detected
pub fn blank_overlay(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, COLOR_WHITE)
}

fn draw_thick_circle(
    canvas: &mut RgbImage,
    center: PixelPoint,
    radius: i32,
    thickness: i32,
    color: Rgb<u8>,
) {
    let half = thickness / 2;
    for r in (radius - half)..(radius - half + thickness) {
        if r > 0 {
            draw_hollow_circle_mut(canvas, (center.x, center.y), r, color);
        }
    }
}

fn draw_thick_line(
    canvas: &mut RgbImage,
    from: PixelPoint,
    to: PixelPoint,
    thickness: i32,
    color: Rgb<u8>,
) {
    let half = thickness / 2;
    for dy in -half..=half {
        for dx in -half..=half {
            draw_line_segment_mut(
                canvas,
                ((from.x + dx) as f32, (from.y + dy) as f32),
                ((to.x + dx) as f32, (to.y + dy) as f32),
                color,
            );
        }
    }
}

fn draw_thick_rect(canvas: &mut RgbImage, bounds: &BoundingBox, thickness: u32, color: Rgb<u8>) {
    for inset in 0..thickness {
        if bounds.width <= 2 * inset || bounds.height <= 2 * inset {
            break;
        }
        let rect = Rect::at((bounds.x + inset) as i32, (bounds.y + inset) as i32)
            .of_size(bounds.width - 2 * inset, bounds.height - 2 * inset);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

/// Everything the overlay shows about one detection
pub struct OverlayContent<'a> {
    pub region: &'a GrayImage,
    pub fingertips: &'a [PixelPoint],
    pub center: PixelPoint,
    pub palm_radius: f64,
    pub bounds: BoundingBox,
}

/// Render a detection for human inspection.
///
/// The hand region is gray on white, each fingertip gets a red ring and a
/// blue spoke to the center, the bounding box is green, and the center and
/// palm circle are red.
pub fn render_overlay(content: &OverlayContent<'_>) -> RgbImage {
    let (width, height) = content.region.dimensions();
    let mut canvas = blank_overlay(width, height);

    for (x, y, p) in content.region.enumerate_pixels() {
        if p[0] != 0 {
            canvas.put_pixel(x, y, COLOR_GRAY);
        }
    }

    for tip in content.fingertips {
        draw_thick_circle(
            &mut canvas,
            *tip,
            FINGERTIP_RADIUS,
            FINGERTIP_THICKNESS,
            COLOR_RED,
        );
        draw_thick_line(&mut canvas, *tip, content.center, SPOKE_THICKNESS, COLOR_BLUE);
    }

    draw_thick_rect(&mut canvas, &content.bounds, BOUNDS_THICKNESS, COLOR_GREEN);
    draw_filled_circle_mut(
        &mut canvas,
        (content.center.x, content.center.y),
        CENTER_RADIUS,
        COLOR_RED,
    );
    draw_thick_circle(
        &mut canvas,
        content.center,
        content.palm_radius.round() as i32,
        PALM_THICKNESS,
        COLOR_RED,
    );

    canvas
}
