use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gesture_collector::clean::clean_label;
use gesture_collector::{
    load_settings, resize_label, save_settings, Roi, SampleCollector, SampleOutcome, SamplingTask,
    DEFAULT_SIZES,
};
use gesture_detector::HandDetector;
use gesture_shared::Settings;
use image::{ImageFormat, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Gesture sample collector with hand detection", long_about = None)]
struct Cli {
    /// Settings file (JSON); defaults are used when it does not exist
    #[arg(short, long, global = true, default_value = "gesture-collector.json")]
    settings: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the detector over image files and write its result images
    Detect {
        /// Input frames
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "detections")]
        output: PathBuf,

        #[command(flatten)]
        frames: FrameArgs,
    },
    /// Collect samples of one gesture from a directory of frames
    Collect {
        /// Directory of frames, processed in file name order
        frames_dir: PathBuf,

        /// Gesture label; must be in the configured gesture list
        #[arg(short, long)]
        label: String,

        /// Sample root folder
        #[arg(long, default_value = "samples")]
        samples: PathBuf,

        /// Time between two consecutive frames in ms
        #[arg(long, default_value = "20")]
        frame_interval_ms: u64,

        #[command(flatten)]
        frames: FrameArgs,
    },
    /// Letterbox the processed samples of gesture labels into square images
    Resize {
        /// Labels to resize; every configured gesture when omitted
        #[arg(short, long)]
        label: Vec<String>,

        #[arg(long, default_value = "samples")]
        samples: PathBuf,

        /// Target sizes in pixels
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_SIZES)]
        sizes: Vec<u32>,
    },
    /// Delete samples present in only one of the BMP and PGM folders
    Clean {
        #[arg(short, long)]
        label: String,

        #[arg(long, default_value = "samples")]
        samples: PathBuf,

        /// Only report what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the effective settings
    Settings {
        /// Also write them to the settings file
        #[arg(short, long)]
        write: bool,
    },
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Frame of the empty scene, captured as background first
    #[arg(short, long)]
    background: Option<PathBuf>,

    /// Use the whole frame instead of the configured region of interest
    #[arg(long)]
    full_frame: bool,
}

fn load_frame(path: &Path) -> Result<RgbImage> {
    Ok(image::open(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?
        .to_rgb8())
}

/// Crop frames to the region of interest before detection
struct FrameSource {
    roi: Option<Roi>,
    full_frame: bool,
    settings: gesture_shared::RoiSettings,
}

impl FrameSource {
    fn new(settings: &Settings, full_frame: bool) -> Self {
        Self {
            roi: None,
            full_frame,
            settings: settings.roi.clone(),
        }
    }

    fn region(&mut self, frame: &RgbImage) -> Result<RgbImage> {
        if self.full_frame {
            return Ok(frame.clone());
        }
        let (width, height) = frame.dimensions();
        let roi = match self.roi {
            Some(roi) => roi,
            None => {
                let roi = Roi::from_settings(&self.settings, width, height)?;
                log::info!("Region of interest: {:?}", roi);
                self.roi = Some(roi);
                roi
            }
        };
        if roi.x + roi.width > width || roi.y + roi.height > height {
            bail!("Frame of {}x{} does not contain {:?}", width, height, roi);
        }
        Ok(roi.crop(frame))
    }
}

fn create_detector(
    settings: &Settings,
    frames: &FrameArgs,
    source: &mut FrameSource,
) -> Result<HandDetector> {
    let mut detector = HandDetector::with_settings(settings.detector.clone())?;

    if let Some(path) = &frames.background {
        let background = source.region(&load_frame(path)?)?;
        detector.request_background_capture();
        detector.detect(&background)?;
        log::info!("Background captured from {}", path.display());
    }
    Ok(detector)
}

fn run_detect(
    settings: &Settings,
    inputs: &[PathBuf],
    output: &Path,
    frames: &FrameArgs,
) -> Result<()> {
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut source = FrameSource::new(settings, frames.full_frame);
    let mut detector = create_detector(settings, frames, &mut source)?;

    let mut detected_count = 0;
    for input in inputs {
        let region = source.region(&load_frame(input)?)?;
        let detected = detector.detect(&region)?;
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("frame");

        let result = detector.result();
        result
            .filtered
            .save_with_format(output.join(format!("{}_mask.png", stem)), ImageFormat::Png)?;
        result
            .overlay
            .save_with_format(output.join(format!("{}_overlay.png", stem)), ImageFormat::Png)?;
        if let Some(extract) = result.extract {
            extract.save_with_format(
                output.join(format!("{}_extract.png", stem)),
                ImageFormat::Png,
            )?;
        }
        let summary = serde_json::to_string_pretty(&result.pose)?;
        fs::write(output.join(format!("{}.json", stem)), summary)?;

        match result.pose.filter(|_| detected) {
            Some(pose) => {
                detected_count += 1;
                log::info!(
                    "{}: hand at ({:.0}, {:.0}) with {} fingertip(s)",
                    input.display(),
                    pose.center.x,
                    pose.center.y,
                    pose.finger_count()
                );
            }
            None => log::info!("{}: nothing detected", input.display()),
        }
    }

    log::info!(
        "Detected a hand in {} of {} frame(s)",
        detected_count,
        inputs.len()
    );
    Ok(())
}

fn sorted_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && ImageFormat::from_path(path).is_ok())
        .collect();
    frames.sort();
    Ok(frames)
}

fn run_collect(
    settings: &Settings,
    frames_dir: &Path,
    label: &str,
    samples: &Path,
    frame_interval: Duration,
    frames: &FrameArgs,
) -> Result<()> {
    if !settings.gesture_list.iter().any(|g| g == label) {
        bail!("Illegal gesture label {:?}", label);
    }
    fs::create_dir_all(samples)
        .with_context(|| format!("Failed to create {}", samples.display()))?;

    let interval = Duration::from_millis(settings.sampling.interval_ms);
    let collector = SampleCollector::open(samples, label, interval)?;
    let mut task = SamplingTask::new(collector, settings.sampling.amount_per_time);
    log::info!(
        "Sampling will stop after {} samples, stored to {}",
        task.amount(),
        task.collector().storage_path().display()
    );

    let mut source = FrameSource::new(settings, frames.full_frame);
    let mut detector = create_detector(settings, frames, &mut source)?;

    let paths = sorted_frames(frames_dir)?;
    for (index, path) in paths.iter().enumerate() {
        let region = source.region(&load_frame(path)?)?;
        detector.detect(&region)?;

        let at = frame_interval * index as u32;
        let outcome = task.offer(&region, detector.extracted_image(), at)?;
        if outcome == SampleOutcome::Completed || task.is_complete() {
            break;
        }
    }

    log::info!(
        "Sampling finished: {} / {} collected from {} frame(s)",
        task.collected(),
        task.amount(),
        paths.len()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    if cli.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let settings = load_settings(&cli.settings)?;

    match cli.command {
        Command::Detect {
            inputs,
            output,
            frames,
        } => run_detect(&settings, &inputs, &output, &frames),
        Command::Collect {
            frames_dir,
            label,
            samples,
            frame_interval_ms,
            frames,
        } => run_collect(
            &settings,
            &frames_dir,
            &label,
            &samples,
            Duration::from_millis(frame_interval_ms),
            &frames,
        ),
        Command::Resize {
            label,
            samples,
            sizes,
        } => {
            let labels = if label.is_empty() {
                settings
                    .gesture_list
                    .iter()
                    .filter(|g| samples.join(g.as_str()).is_dir())
                    .cloned()
                    .collect()
            } else {
                label
            };
            for label in &labels {
                let count = resize_label(&samples, label, &sizes)?;
                log::info!("{}: resized {} sample(s) to {:?}", label, count, sizes);
            }
            Ok(())
        }
        Command::Clean {
            label,
            samples,
            dry_run,
        } => {
            let plan = clean_label(&samples, &label, dry_run)?;
            if dry_run {
                log::info!("{} file(s) would be deleted", plan.len());
                for path in plan.original_orphans.iter().chain(&plan.processed_orphans) {
                    println!("{}", path.display());
                }
            }
            Ok(())
        }
        Command::Settings { write } => {
            println!("{}", settings.to_json()?);
            if write {
                save_settings(&cli.settings, &settings)?;
            }
            Ok(())
        }
    }
}
