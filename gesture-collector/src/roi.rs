use anyhow::{bail, Result};
use gesture_shared::RoiSettings;
use image::RgbImage;

/// Region of interest in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    /// Map the percentage bounds onto a frame of the given size
    pub fn from_settings(
        settings: &RoiSettings,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<Self> {
        if settings.end_x > 100 || settings.end_y > 100 {
            bail!("ROI bounds must be percentages, got {:?}", settings);
        }
        if settings.start_x >= settings.end_x || settings.start_y >= settings.end_y {
            bail!("ROI start must be before its end, got {:?}", settings);
        }

        let scale = |length: u32, percent: u8| (length as u64 * percent as u64 / 100) as u32;
        let x = scale(frame_width, settings.start_x);
        let y = scale(frame_height, settings.start_y);
        let width = scale(frame_width, settings.end_x) - x;
        let height = scale(frame_height, settings.end_y) - y;

        if width == 0 || height == 0 {
            bail!(
                "ROI {:?} is empty on a {}x{} frame",
                settings,
                frame_width,
                frame_height
            );
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    pub fn crop(&self, frame: &RgbImage) -> RgbImage {
        image::imageops::crop_imm(frame, self.x, self.y, self.width, self.height).to_image()
    }
}
