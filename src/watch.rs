//! Directory watching.
//!
//! A [`DirectoryWatcher`] polls an input directory for PAGE-XML files,
//! converts everything it finds in parallel and hands each result to a
//! sink callback. Sources that were converted and sunk successfully are
//! deleted; failures stay in place and are retried only once modified.

use crate::convert::ConvertResult;
use crate::error::{Error, Result};
use crate::Unpage;
use crossbeam_channel::{select, tick, Receiver};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Default poll interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Options for directory watching.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Time between polls
    pub interval: Duration,

    /// Delete sources once converted and written
    pub delete_on_success: bool,

    /// File extensions picked up, without the dot
    pub extensions: Vec<String>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            delete_on_success: true,
            extensions: vec!["xml".to_string()],
        }
    }
}

impl WatchOptions {
    /// Create new watch options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the poll interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Keep source files after a successful conversion.
    pub fn keep_sources(mut self) -> Self {
        self.delete_on_success = false;
        self
    }

    /// Set the file extensions picked up.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }
}

/// What one poll did.
#[derive(Debug, Default)]
pub struct PollReport {
    /// Files converted and sunk
    pub converted: Vec<PathBuf>,

    /// Files that failed, with the reason. A converted file whose removal
    /// failed shows up here as well.
    pub failed: Vec<(PathBuf, String)>,
}

impl PollReport {
    /// Whether the poll found nothing to do.
    pub fn is_empty(&self) -> bool {
        self.converted.is_empty() && self.failed.is_empty()
    }
}

/// Polls a directory and converts new PAGE-XML files.
pub struct DirectoryWatcher {
    dir: PathBuf,
    converter: Unpage,
    options: WatchOptions,
    /// Failed files and their modification time at failure
    failed: HashMap<PathBuf, Option<SystemTime>>,
}

impl DirectoryWatcher {
    /// Create a watcher for `dir`.
    pub fn new(dir: impl Into<PathBuf>, converter: Unpage, options: WatchOptions) -> Self {
        Self {
            dir: dir.into(),
            converter,
            options,
            failed: HashMap::new(),
        }
    }

    /// The watched directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Matching files in the directory, sorted by name.
    ///
    /// Files that failed before and have not changed since are skipped.
    pub fn pending_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || !self.has_extension(&path) {
                continue;
            }
            if let Some(failed_at) = self.failed.get(&path) {
                if *failed_at == modified(&path) {
                    continue;
                }
            }
            files.push(path);
        }
        files.sort();
        Ok(files)
    }

    /// Convert every pending file once.
    ///
    /// Schema load failures abort the poll; any other problem is logged and
    /// the remaining files are still processed.
    pub fn poll_once<F>(&mut self, sink: &mut F) -> Result<PollReport>
    where
        F: FnMut(&Path, &ConvertResult) -> Result<()>,
    {
        self.failed.retain(|path, _| path.exists());
        let files = self.pending_files()?;
        let mut report = PollReport::default();
        if files.is_empty() {
            return Ok(report);
        }

        log::info!("Converting {} files from {}", files.len(), self.dir.display());
        let results = self.converter.convert_many(&files);

        for (path, result) in files.into_iter().zip(results) {
            let outcome = result.and_then(|converted| sink(&path, &converted));
            match outcome {
                Ok(()) => {
                    self.failed.remove(&path);
                    if self.options.delete_on_success {
                        match fs::remove_file(&path) {
                            Ok(()) => log::debug!("Removed {}", path.display()),
                            Err(e) => {
                                // Already sunk; keep it from being converted again
                                log::error!("Converted {} but could not remove it: {}", path.display(), e);
                                self.failed.insert(path.clone(), modified(&path));
                                report
                                    .failed
                                    .push((path.clone(), format!("converted but not removed: {}", e)));
                            }
                        }
                    }
                    report.converted.push(path);
                }
                Err(e @ Error::SchemaLoad { .. }) => return Err(e),
                Err(e) => {
                    log::error!("Failed to convert {}: {}", path.display(), e);
                    self.failed.insert(path.clone(), modified(&path));
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Poll until `stop` receives a message or is disconnected.
    pub fn run<F>(&mut self, stop: &Receiver<()>, mut sink: F) -> Result<()>
    where
        F: FnMut(&Path, &ConvertResult) -> Result<()>,
    {
        log::info!(
            "Watching {} every {:?}",
            self.dir.display(),
            self.options.interval
        );
        let ticker = tick(self.options.interval);

        loop {
            let report = self.poll_once(&mut sink)?;
            if !report.is_empty() {
                log::info!(
                    "{} converted, {} failed",
                    report.converted.len(),
                    report.failed.len()
                );
            }

            select! {
                recv(stop) -> _ => {
                    log::info!("Stopped watching {}", self.dir.display());
                    return Ok(());
                }
                recv(ticker) -> _ => {}
            }
        }
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|e| e.to_string_lossy())
            .is_some_and(|e| self.options.extensions.iter().any(|x| x.eq_ignore_ascii_case(&e)))
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
