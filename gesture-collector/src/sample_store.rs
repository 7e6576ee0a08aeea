//! Paired sample storage.
//!
//! A label folder holds two sub folders, `BMP` with the original region and
//! `PGM` with the extracted hand mask. Both files of a sample share a random
//! numeric stem that is unused in either folder.

use anyhow::{bail, Context, Result};
use image::{GrayImage, ImageFormat, RgbImage};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ORIGINAL_FOLDER: &str = "BMP";
pub const PROCESSED_FOLDER: &str = "PGM";
pub const ORIGINAL_EXTENSION: &str = "bmp";
pub const PROCESSED_EXTENSION: &str = "pgm";

pub struct SampleCollector {
    storage_path: PathBuf,
    original_dir: PathBuf,
    processed_dir: PathBuf,
    interval: Duration,
    last_sample: Option<Duration>,
}

impl SampleCollector {
    /// Prepare `<sample_folder>/<label>/{BMP,PGM}`.
    ///
    /// The sample folder itself must already exist; the label folders are
    /// created on demand.
    pub fn open(sample_folder: &Path, label: &str, interval: Duration) -> Result<Self> {
        if label.is_empty() {
            bail!("Gesture label must not be empty");
        }
        if !sample_folder.is_dir() {
            bail!("Sample folder {} does not exist", sample_folder.display());
        }

        let storage_path = sample_folder.join(label);
        let original_dir = storage_path.join(ORIGINAL_FOLDER);
        let processed_dir = storage_path.join(PROCESSED_FOLDER);
        for dir in [&original_dir, &processed_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        log::info!("Storing samples in {}", storage_path.display());
        Ok(Self {
            storage_path,
            original_dir,
            processed_dir,
            interval,
            last_sample: None,
        })
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    pub fn original_dir(&self) -> &Path {
        &self.original_dir
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// Whether a sample at stream time `at` is too close to the previous one
    pub fn deny(&self, at: Duration) -> bool {
        self.last_sample
            .map_or(false, |last| at.saturating_sub(last) < self.interval)
    }

    fn original_path(&self, stem: &str) -> PathBuf {
        self.original_dir.join(format!("{}.{}", stem, ORIGINAL_EXTENSION))
    }

    fn processed_path(&self, stem: &str) -> PathBuf {
        self.processed_dir.join(format!("{}.{}", stem, PROCESSED_EXTENSION))
    }

    fn is_stem_taken(&self, stem: &str) -> bool {
        self.original_path(stem).exists() || self.processed_path(stem).exists()
    }

    fn unused_stem(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let stem = rng.gen::<u32>().to_string();
            if !self.is_stem_taken(&stem) {
                return stem;
            }
        }
    }

    /// Store one sample pair and start the interval; returns the file stem
    pub fn sample(
        &mut self,
        original: &RgbImage,
        processed: &GrayImage,
        at: Duration,
    ) -> Result<String> {
        if original.width() == 0 || original.height() == 0 {
            bail!("Original sample image is empty");
        }
        if processed.width() == 0 || processed.height() == 0 {
            bail!("Processed sample image is empty");
        }

        let stem = self.unused_stem();
        let original_path = self.original_path(&stem);
        original
            .save_with_format(&original_path, ImageFormat::Bmp)
            .with_context(|| format!("Failed to write {}", original_path.display()))?;
        let processed_path = self.processed_path(&stem);
        processed
            .save_with_format(&processed_path, ImageFormat::Pnm)
            .with_context(|| format!("Failed to write {}", processed_path.display()))?;

        self.last_sample = Some(at);
        log::debug!("Stored sample {}", stem);
        Ok(stem)
    }
}

/// What happened to one frame offered to a [`SamplingTask`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Within the minimum interval of the previous sample
    Denied,
    NothingDetected,
    Stored(String),
    /// The task already collected its amount
    Completed,
}

/// Collects a fixed amount of samples for one label
pub struct SamplingTask {
    collector: SampleCollector,
    amount: u32,
    collected: u32,
}

impl SamplingTask {
    pub fn new(collector: SampleCollector, amount: u32) -> Self {
        Self {
            collector,
            amount,
            collected: 0,
        }
    }

    pub fn collector(&self) -> &SampleCollector {
        &self.collector
    }

    pub fn collected(&self) -> u32 {
        self.collected
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn is_complete(&self) -> bool {
        self.collected >= self.amount
    }

    /// Offer the region and, when a hand was found, its extract
    pub fn offer(
        &mut self,
        original: &RgbImage,
        extract: Option<&GrayImage>,
        at: Duration,
    ) -> Result<SampleOutcome> {
        if self.is_complete() {
            return Ok(SampleOutcome::Completed);
        }
        if self.collector.deny(at) {
            return Ok(SampleOutcome::Denied);
        }
        let Some(extract) = extract else {
            log::warn!("Sampling failed. Nothing detected.");
            return Ok(SampleOutcome::NothingDetected);
        };

        let stem = self.collector.sample(original, extract, at)?;
        self.collected += 1;
        log::info!("Collected: {:>3} / {}", self.collected, self.amount);
        Ok(SampleOutcome::Stored(stem))
    }
}
