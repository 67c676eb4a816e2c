//! End-to-end runs: scan, analyze, write.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info};

use persondup_analyze::{
    AnalyzeConfig, DirectorySummary, DuplicateAnalyzer, DuplicateReport, RunTotals,
};
use persondup_scan::{RunReport, ScanConfig, TreeWalker};

use crate::destination::{WorkbookName, resolve_workbook_path};
use crate::error::ReportError;
use crate::sink::{SinkOutput, TableSink, WriteOutcome, XlsxSink};
use crate::table::{Columns, DUPLICATES_SHEET, duplicates_table, summary_table};

/// Result of a whole-tree run.
#[derive(Debug, Serialize)]
pub struct TreeOutcome {
    pub root_path: PathBuf,
    pub report: DuplicateReport,
    pub run: RunReport,
    /// Workbook written, if any duplicates were found.
    pub output: Option<PathBuf>,
    pub duration: Duration,
}

/// Scan the whole tree as one batch and write its duplicates to a workbook.
///
/// Nothing is written when no identity repeats.
pub fn run_whole_tree(
    walker: &TreeWalker,
    config: &ScanConfig,
    analyze: AnalyzeConfig,
    destination: &Path,
) -> Result<TreeOutcome, ReportError> {
    let start = Instant::now();
    let scan = walker.walk_tree(config)?;
    let report = DuplicateAnalyzer::with_config(analyze).analyze(&scan.batch.records);

    let output = if report.is_empty() {
        info!("No duplicate records found");
        None
    } else {
        info!(
            rows = report.row_count(),
            identities = report.duplicate_identities,
            "Found duplicate records"
        );
        let path = resolve_workbook_path(destination, &WorkbookName::Fixed);
        let mut sink = XlsxSink::create(path)?;
        sink.write_table(&duplicates_table(
            DUPLICATES_SHEET,
            &report,
            Columns::whole_tree(),
        ))?;
        sink.finish()?.location
    };

    Ok(TreeOutcome {
        root_path: scan.root_path,
        report,
        run: scan.report,
        output,
        duration: start.elapsed(),
    })
}

/// Result of a partitioned run.
#[derive(Debug, Serialize)]
pub struct PartitionedOutcome {
    /// Per-directory summaries, ordered by duplicate rows descending.
    pub summaries: Vec<DirectorySummary>,
    pub totals: RunTotals,
    pub run: RunReport,
    pub output: SinkOutput,
    /// Directories whose table could not be written.
    pub failed_tables: Vec<String>,
    pub duration: Duration,
}

/// Scan each child directory as its own batch and write one table per
/// directory with duplicates, plus a summary table.
pub fn run_partitioned<S: TableSink>(
    walker: &TreeWalker,
    config: &ScanConfig,
    analyze: AnalyzeConfig,
    mut sink: S,
) -> Result<PartitionedOutcome, ReportError> {
    let start = Instant::now();
    let partitions = walker.list_partitions(config)?;
    let analyzer = DuplicateAnalyzer::with_config(analyze);

    let mut summaries = Vec::with_capacity(partitions.len());
    let mut totals = RunTotals::new();
    let mut run = RunReport::new();
    let mut failed_tables = Vec::new();

    for (i, partition) in partitions.iter().enumerate() {
        info!(
            "Processing directory {}/{}: {}",
            i + 1,
            partitions.len(),
            partition.name
        );

        let scan = walker.scan_partition(partition, config);
        let files = scan.batch.files_processed;

        let summary = if scan.batch.is_empty() {
            info!("No valid records found in {}", partition.name);
            DirectorySummary::empty(&partition.name, files)
        } else {
            let report = analyzer.analyze(&scan.batch.records);
            if report.is_empty() {
                info!("No duplicates found in {}", partition.name);
            } else {
                info!(
                    "Found {} duplicate records ({} distinct names) in {}",
                    report.row_count(),
                    report.duplicate_identities,
                    partition.name
                );
                let table = duplicates_table(&partition.name, &report, Columns::partitioned());
                match sink.write_table(&table) {
                    Ok(WriteOutcome::Written { .. }) => {}
                    Ok(WriteOutcome::Skipped { reason }) => {
                        info!(%reason, "Duplicates of {} not written", partition.name);
                        failed_tables.push(partition.name.clone());
                    }
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        error!(error = %err, "Cannot write duplicates of {}", partition.name);
                        failed_tables.push(partition.name.clone());
                    }
                }
            }
            DirectorySummary::new(&partition.name, files, &report)
        };

        totals.record(&summary);
        summaries.push(summary);
        run.merge(scan.report);
    }

    let summary = summary_table(&summaries);
    match sink.write_table(&summary) {
        Ok(WriteOutcome::Written { .. }) => {}
        Ok(WriteOutcome::Skipped { reason }) => {
            error!(%reason, "Summary table not written");
            failed_tables.push(summary.name.clone());
        }
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => {
            error!(error = %err, "Cannot write summary table");
            failed_tables.push(summary.name.clone());
        }
    }
    let output = sink.finish()?;

    info!(
        directories = totals.directories,
        files = totals.files,
        records = totals.records,
        duplicates = totals.duplicate_rows,
        "Processing complete"
    );

    persondup_analyze::sort_summaries(&mut summaries);
    Ok(PartitionedOutcome {
        summaries,
        totals,
        run,
        output,
        failed_tables,
        duration: start.elapsed(),
    })
}
