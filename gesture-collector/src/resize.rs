//! Square, letterboxed copies of the processed samples

use anyhow::{bail, Context, Result};
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat};
use std::fs;
use std::path::Path;

use crate::sample_store::PROCESSED_FOLDER;

pub const DEFAULT_SIZES: [u32; 3] = [128, 64, 32];

/// Scale `sample` to fit a `size` x `size` square, keeping its aspect ratio,
/// and center it on black
pub fn letterbox(sample: &GrayImage, size: u32) -> GrayImage {
    let (width, height) = sample.dimensions();
    let mut canvas = GrayImage::new(size, size);
    if width == 0 || height == 0 || size == 0 {
        return canvas;
    }

    let scale = size as f64 / width.max(height) as f64;
    let fit = |length: u32| ((length as f64 * scale).round() as u32).clamp(1, size);
    let (new_width, new_height) = (fit(width), fit(height));

    let resized = imageops::resize(sample, new_width, new_height, FilterType::Triangle);
    let x = (size - new_width) / 2;
    let y = (size - new_height) / 2;
    imageops::replace(&mut canvas, &resized, x as i64, y as i64);
    canvas
}

/// Letterbox every processed sample of `label` into `<root>/<label>/<size>/`.
///
/// Hidden files are skipped. Returns the number of samples read.
pub fn resize_label(root: &Path, label: &str, sizes: &[u32]) -> Result<usize> {
    let label_dir = root.join(label);
    let source_dir = label_dir.join(PROCESSED_FOLDER);
    if !source_dir.is_dir() {
        bail!("No processed samples at {}", source_dir.display());
    }

    let mut files: Vec<_> = fs::read_dir(&source_dir)
        .with_context(|| format!("Failed to list {}", source_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| !name.starts_with('.'))
        })
        .collect();
    files.sort();

    for &size in sizes {
        if size == 0 {
            bail!("Target size must be positive");
        }
        let target_dir = label_dir.join(size.to_string());
        fs::create_dir_all(&target_dir)
            .with_context(|| format!("Failed to create {}", target_dir.display()))?;
        log::info!("Target dir: {}", target_dir.display());

        for (i, path) in files.iter().enumerate() {
            let sample = image::open(path)
                .with_context(|| format!("Failed to read {}", path.display()))?
                .to_luma8();
            let Some(file_name) = path.file_name() else {
                continue;
            };
            let target = target_dir.join(file_name);
            letterbox(&sample, size)
                .save_with_format(&target, ImageFormat::Pnm)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            log::debug!("{}/{}: {}", i + 1, files.len(), target.display());
        }
    }

    Ok(files.len())
}
