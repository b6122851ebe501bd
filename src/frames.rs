//! Compositing the picture onto every background frame

use crate::bitmap;
use crate::composite;
use crate::error::*;
use crate::progress::ProgressReporter;
use crate::Config;
use imgref::*;
use rgb::*;
use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Background frames, in file name order
#[derive(Debug, Clone)]
pub struct FrameSet {
    paths: Vec<PathBuf>,
}

impl FrameSet {
    /// Regular files in `dir`, sorted naturally by name (`2.png` before `10.png`).
    /// Symlinks to files count. Hidden files are ignored.
    pub fn list(dir: &Path) -> ParrotResult<Self> {
        let list_err = |err: io::Error| Error::DirectoryList(dir.to_owned(), err);

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            // follows symlinks, unlike `entry.file_type()`
            if !path.is_file() {
                continue;
            }
            paths.push(path);
        }
        paths.sort_by(|a, b| compare_file_names(a, b));
        Ok(Self { paths })
    }

    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Every frame needs exactly one position, so the counts have to match
    pub fn check_positions(&self, positions: usize) -> ParrotResult<()> {
        if self.paths.len() != positions {
            return Err(Error::FrameCountMismatch(self.paths.len(), positions));
        }
        Ok(())
    }
}

fn compare_file_names(a: &Path, b: &Path) -> Ordering {
    let a = a.file_name().unwrap_or_default().to_string_lossy();
    let b = b.file_name().unwrap_or_default().to_string_lossy();
    natord::compare(&a, &b)
}

/// A frame that was skipped, and why
#[derive(Debug)]
pub struct FrameFailure {
    pub index: usize,
    pub error: Error,
    /// Checkpoint from an earlier run that couldn't be deleted
    pub leftover: Option<PathBuf>,
}

/// Outcome of processing frames one by one, where a bad frame doesn't stop the rest
#[derive(Debug)]
pub struct Batch<T> {
    pub done: Vec<T>,
    pub failures: Vec<FrameFailure>,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self { done: Vec::new(), failures: Vec::new() }
    }
}

impl<T> Batch<T> {
    /// Record one result. Failures are logged.
    pub fn record(self, index: usize, res: ParrotResult<T>) -> Self {
        match res {
            Ok(item) => self.record_done(item),
            Err(error) => self.record_failure(FrameFailure { index, error, leftover: None }),
        }
    }

    fn record_done(mut self, item: T) -> Self {
        self.done.push(item);
        self
    }

    fn record_failure(mut self, failure: FrameFailure) -> Self {
        warn!(index = failure.index, error = %failure.error, "skipping frame");
        self.failures.push(failure);
        self
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }
}

/// Composite `overlay` onto each frame and save the results as `<index>.png` checkpoints.
///
/// Frames that can't be read or written are skipped. Any stale checkpoint left at a skipped
/// index from an earlier run is removed, so it can't sneak into the animation.
pub fn composite_all(frames: &FrameSet, overlay: ImgRef<'_, RGBA8>, config: &Config, reporter: &mut dyn ProgressReporter) -> ParrotResult<Batch<PathBuf>> {
    frames.paths().iter().zip(&config.positions).enumerate()
        .try_fold(Batch::default(), |batch, (index, (frame_path, &(px, py)))| {
            let (x, y) = (px + config.offset.0, py + config.offset.1);
            let dest = config.intermediate_path(index);
            let batch = match composite_one(frame_path, overlay, x, y, &dest) {
                Ok(path) => batch.record_done(path),
                Err(error) => {
                    let leftover = remove_stale(&dest);
                    batch.record_failure(FrameFailure { index, error, leftover })
                },
            };
            if !reporter.increase() {
                return Err(Error::Aborted);
            }
            Ok(batch)
        })
}

fn composite_one(frame_path: &Path, overlay: ImgRef<'_, RGBA8>, x: i32, y: i32, dest: &Path) -> ParrotResult<PathBuf> {
    let background = bitmap::decode(frame_path)?;
    debug!(frame = %frame_path.display(), x, y, "compositing");
    let out = composite::overlay(background.as_ref(), overlay, x, y);
    bitmap::write_png(dest, out.as_ref())?;
    Ok(dest.to_owned())
}

/// Returns the path if it's still there afterwards
fn remove_stale(path: &Path) -> Option<PathBuf> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => {
            warn!(path = %path.display(), %err, "can't remove stale frame");
            Some(path.to_owned())
        },
        _ => None,
    }
}
