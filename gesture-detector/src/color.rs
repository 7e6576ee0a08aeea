//! RGB to HSV conversion in the 8-bit units used by the skin color band.

use gesture_shared::HsvColor;
use image::Rgb;

/// Convert an RGB pixel to HSV.
///
/// Hue is halved to fit a byte (0-180), saturation and value are scaled to
/// 0-255.
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> HsvColor {
    let [r, g, b] = pixel.0;
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);

    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    // Calculate hue in degrees
    let h = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * ((gf - bf) / delta)
    } else if max == gf {
        60.0 * ((bf - rf) / delta + 2.0)
    } else {
        60.0 * ((rf - gf) / delta + 4.0)
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    let s = if max == 0.0 { 0.0 } else { delta * 255.0 / max };

    HsvColor {
        h: (h / 2.0).round().min(180.0) as u8,
        s: s.round().min(255.0) as u8,
        v: max as u8,
    }
}
