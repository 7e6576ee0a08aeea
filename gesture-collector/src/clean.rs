//! Keeps the original and processed folders of a label in sync.
//!
//! Samples are removed by hand from one folder while reviewing them; the
//! counterpart in the other folder is then an orphan.

use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sample_store::{ORIGINAL_FOLDER, PROCESSED_FOLDER};

/// Files present in only one of the two folders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub original_orphans: Vec<PathBuf>,
    pub processed_orphans: Vec<PathBuf>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.original_orphans.is_empty() && self.processed_orphans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.original_orphans.len() + self.processed_orphans.len()
    }

    /// Delete every orphan; returns how many files were removed
    pub fn apply(&self) -> Result<usize> {
        for path in self.original_orphans.iter().chain(&self.processed_orphans) {
            fs::remove_file(path)
                .with_context(|| format!("Failed to delete {}", path.display()))?;
            log::info!("Deleted {}", path.display());
        }
        Ok(self.len())
    }
}

fn stems(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        bail!("Invalid sample dir: {}", dir.display());
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            entries.push((stem.to_string(), path.clone()));
        }
    }
    entries.sort();
    Ok(entries)
}

/// Compare two folders by file stem
pub fn plan_sync(original_dir: &Path, processed_dir: &Path) -> Result<SyncPlan> {
    let original = stems(original_dir)?;
    let processed = stems(processed_dir)?;

    let original_stems: BTreeSet<&str> = original.iter().map(|(s, _)| s.as_str()).collect();
    let processed_stems: BTreeSet<&str> = processed.iter().map(|(s, _)| s.as_str()).collect();

    let orphans = |entries: &[(String, PathBuf)], other: &BTreeSet<&str>| -> Vec<PathBuf> {
        entries
            .iter()
            .filter(|(stem, _)| !other.contains(stem.as_str()))
            .map(|(_, path)| path.clone())
            .collect()
    };

    Ok(SyncPlan {
        original_orphans: orphans(&original, &processed_stems),
        processed_orphans: orphans(&processed, &original_stems),
    })
}

/// Plan the sync of `<root>/<label>`, applying it unless `dry_run`
pub fn clean_label(root: &Path, label: &str, dry_run: bool) -> Result<SyncPlan> {
    let label_dir = root.join(label);
    let plan = plan_sync(
        &label_dir.join(ORIGINAL_FOLDER),
        &label_dir.join(PROCESSED_FOLDER),
    )?;

    log::info!(
        "{}: {} original and {} processed file(s) without counterpart",
        label_dir.display(),
        plan.original_orphans.len(),
        plan.processed_orphans.len()
    );
    if !dry_run && !plan.is_empty() {
        plan.apply()?;
    }
    Ok(plan)
}
