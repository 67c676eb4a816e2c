//! Directory walker feeding JSON documents to the extractor.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use jwalk::{Parallelism, WalkDir};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, info_span, trace, warn};

use persondup_core::{Extracted, Extractor, ScanConfig, ScanError, ScanWarning, WarningKind};

use crate::context::{Batch, FileOutcome, RunReport, ScanContext};
use crate::progress::{ProgressTracker, ScanProgress};

/// Result of a whole-tree scan.
#[derive(Debug)]
pub struct TreeScan {
    /// Canonical root that was scanned.
    pub root_path: PathBuf,
    /// Every record found, in traversal order.
    pub batch: Batch,
    pub report: RunReport,
    pub scan_duration: Duration,
}

/// An immediate child directory of the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Directory name (lossy UTF-8).
    pub name: String,
    pub path: PathBuf,
}

/// Result of scanning one partition.
#[derive(Debug)]
pub struct PartitionScan {
    pub partition: Partition,
    pub batch: Batch,
    pub report: RunReport,
    /// False when the directory could not be listed.
    pub listed: bool,
    pub scan_duration: Duration,
}

/// Sequential walker over trees of JSON declaration files.
pub struct TreeWalker {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl TreeWalker {
    /// Create a new walker.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan every `.json` file below the root into a single batch.
    pub fn walk_tree(&self, config: &ScanConfig) -> Result<TreeScan, ScanError> {
        let start = Instant::now();
        let root_path = verify_root(&config.root)?;

        let extractor = Extractor::new(config.extract_config());
        let tracker = ProgressTracker::new(config.progress_every(), None);
        let mut ctx = ScanContext::new(info_span!("tree", root = %root_path.display()));
        let span = ctx.span().clone();
        let _enter = span.enter();

        info!("Scanning JSON files under {}", root_path.display());

        let walker = WalkDir::new(&root_path)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true);

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    warn!(path = %path.display(), error = %err, "Cannot read directory entry");
                    ctx.report.record_warning(ScanWarning::new(
                        path,
                        err.to_string(),
                        WarningKind::ListError,
                    ));
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();
            let is_file = file_type.is_file() || (file_type.is_symlink() && path.is_file());
            if !is_file || !config.accepts_file(&entry.file_name().to_string_lossy()) {
                continue;
            }

            self.scan_file(&mut ctx, &extractor, &path);
            self.report_progress(&tracker, &ctx, &path);
        }

        info!(
            files = ctx.report.files_seen,
            failed = ctx.report.files_failed,
            records = ctx.report.records_extracted,
            "Finished scanning {}",
            root_path.display()
        );

        let (batch, report) = ctx.finish();
        Ok(TreeScan {
            root_path,
            batch,
            report,
            scan_duration: start.elapsed(),
        })
    }

    /// List the immediate child directories of the root, sorted by name.
    pub fn list_partitions(&self, config: &ScanConfig) -> Result<Vec<Partition>, ScanError> {
        let root_path = verify_root(&config.root)?;
        let entries = fs::read_dir(&root_path).map_err(|e| ScanError::io(&root_path, e))?;

        let mut partitions = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    warn!(root = %root_path.display(), error = %err, "Cannot read directory entry");
                    continue;
                }
            };

            let path = entry.path();
            if path.is_dir() {
                partitions.push(Partition {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    path,
                });
            }
        }

        if partitions.is_empty() {
            warn!("No subdirectories found in {}", root_path.display());
            info!("Expected layout: <root>/<entity>/*.json, one directory per entity");
            return Err(ScanError::NoPartitions { path: root_path });
        }

        partitions.sort_by(|a, b| a.name.cmp(&b.name));
        info!(
            "Found {} subdirectories in {}",
            partitions.len(),
            root_path.display()
        );

        Ok(partitions)
    }

    /// Scan the `.json` files directly inside one partition.
    ///
    /// A directory that cannot be listed yields an empty batch and a warning
    /// instead of an error.
    pub fn scan_partition(&self, partition: &Partition, config: &ScanConfig) -> PartitionScan {
        let start = Instant::now();
        let extractor = Extractor::new(config.extract_config());
        let mut ctx = ScanContext::new(info_span!("partition", dir = %partition.name));
        let span = ctx.span().clone();
        let _enter = span.enter();

        let files = match list_json_files(&partition.path, config) {
            Ok(files) => files,
            Err(err) => {
                warn!(error = %err, "Cannot list directory {}", partition.path.display());
                ctx.report
                    .record_warning(ScanWarning::list_error(&partition.path, &err));
                let (batch, report) = ctx.finish();
                return PartitionScan {
                    partition: partition.clone(),
                    batch,
                    report,
                    listed: false,
                    scan_duration: start.elapsed(),
                };
            }
        };

        if files.is_empty() {
            info!("No JSON files found in {}", partition.path.display());
        } else {
            info!(
                "Processing {} JSON files in {}",
                files.len(),
                partition.path.display()
            );
        }

        let tracker = ProgressTracker::new(config.progress_every(), Some(files.len() as u64));
        for path in &files {
            self.scan_file(&mut ctx, &extractor, path);
            self.report_progress(&tracker, &ctx, path);
        }

        let (batch, report) = ctx.finish();
        PartitionScan {
            partition: partition.clone(),
            batch,
            report,
            listed: true,
            scan_duration: start.elapsed(),
        }
    }

    /// Read one file and add its records to the context.
    pub fn scan_file(
        &self,
        ctx: &mut ScanContext,
        extractor: &Extractor,
        path: &Path,
    ) -> FileOutcome {
        ctx.report.files_seen += 1;

        let outcomes = match read_document(path).and_then(|document| {
            extractor
                .extract_document(&document)
                .map_err(|source| ScanError::Document {
                    path: path.to_path_buf(),
                    source,
                })
        }) {
            Ok(outcomes) => outcomes,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Skipping file");
                ctx.report.files_failed += 1;
                ctx.report.record_warning(ScanWarning::from_error(path, &err));
                return FileOutcome::Failed;
            }
        };

        let mut records = 0;
        let mut skipped = 0;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Extracted::Record(record) => {
                    ctx.push_record(record, path);
                    records += 1;
                }
                Extracted::Skipped(reason) => {
                    skipped += 1;
                    ctx.report.record_skip(&reason);
                    if reason.is_malformed() {
                        warn!(path = %path.display(), index, %reason, "Skipping malformed record");
                        ctx.report
                            .record_warning(ScanWarning::malformed_record(path, index, &reason));
                    } else {
                        trace!(path = %path.display(), index, %reason, "No person record");
                    }
                }
            }
        }

        ctx.report.files_processed += 1;
        ctx.batch.files_processed += 1;
        debug!(path = %path.display(), records, skipped, "Parsed file");

        FileOutcome::Parsed { records, skipped }
    }

    fn report_progress(&self, tracker: &ProgressTracker, ctx: &ScanContext, path: &Path) {
        let seen = ctx.report.files_seen;
        if !tracker.is_due(seen) {
            return;
        }

        let progress = tracker.snapshot(
            seen,
            ctx.report.records_extracted,
            ctx.report.warnings.len() as u64,
            path.to_path_buf(),
        );
        let rate = progress.files_per_second();
        match progress.files_total {
            Some(total) => info!("Processed {seen}/{total} JSON files ({rate:.0} files/s)"),
            None => info!("Processed {seen} JSON files ({rate:.0} files/s)..."),
        }

        // No subscribers is fine.
        let _ = self.progress_tx.send(progress);
    }
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::new()
    }
}

/// Read and parse one JSON file.
pub fn read_document(path: &Path) -> Result<Value, ScanError> {
    let bytes = fs::read(path).map_err(|e| ScanError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| ScanError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Canonicalize the root and make sure it is a directory.
fn verify_root(root: &Path) -> Result<PathBuf, ScanError> {
    let root_path = root.canonicalize().map_err(|e| ScanError::io(root, e))?;
    if !root_path.is_dir() {
        return Err(ScanError::NotADirectory { path: root_path });
    }
    Ok(root_path)
}

/// The `.json` files directly inside `dir`, sorted.
fn list_json_files(dir: &Path, config: &ScanConfig) -> io::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)?.map(|entry| entry.map(|e| e.path()));
    Ok(collect_json_paths(dir, entries, config))
}

/// Keep the accepted regular files, skipping entries that cannot be read.
fn collect_json_paths(
    dir: &Path,
    entries: impl IntoIterator<Item = io::Result<PathBuf>>,
    config: &ScanConfig,
) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = entries
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "Cannot read directory entry");
                None
            }
        })
        .filter(|path| {
            let name = path.file_name().map(|n| n.to_string_lossy());
            name.is_some_and(|n| config.accepts_file(&n)) && path.is_file()
        })
        .collect();
    files.sort();
    files
}
