//! persondup - find persons declared more than once in trees of JSON declarations.
//!
//! Usage:
//!   persondup tree <SOURCE> <DEST>             One workbook for the whole tree
//!   persondup partition <SOURCE> <DEST>        One sheet per directory plus a summary
//!   persondup partition-csv <SOURCE> <DEST>    One CSV per directory plus a summary
//!   persondup --help                           Show help

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing::{Level, debug, info, warn};
use tracing_subscriber::EnvFilter;

use persondup_analyze::AnalyzeConfig;
use persondup_core::{ExtractConfig, NamePolicy, RecordSchema, ScanConfig, ScanMode};
use persondup_report::{
    CsvSink, CsvSinkConfig, FallbackPolicy, PartitionedOutcome, ReportError, TreeOutcome,
    WorkbookName, XlsxSink, resolve_workbook_path, run_partitioned, run_whole_tree,
    timestamp_now,
};
use persondup_scan::{RunReport, TreeWalker};

#[derive(Parser)]
#[command(
    name = "persondup",
    version,
    about = "Find persons declared more than once across JSON declaration files",
    long_about = "persondup reads declaration records from trees of JSON files, groups them \
                  by first name and both surnames, and reports every person that appears \
                  more than once.\n\n\
                  `tree` treats the whole source as one batch; `partition` and \
                  `partition-csv` treat each child directory as its own batch."
)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Less log output (-q warnings only, -qq errors only)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    quiet: u8,

    /// Debug logging plus environment diagnostics
    #[arg(long, global = true)]
    debug: bool,

    /// JSON file overriding the record field names
    #[arg(long, global = true, value_name = "FILE")]
    schema: Option<PathBuf>,

    /// Skip records without a first name or first surname in partitioned modes
    #[arg(long, global = true)]
    require_names: bool,

    /// Report at most N duplicate persons per batch (0 = all)
    #[arg(long, global = true, value_name = "N", default_value_t = 0)]
    max_groups: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the whole tree as one batch and write a single workbook
    Tree {
        /// Root directory of the JSON files
        source: PathBuf,

        /// Workbook path, or a directory to write duplicates.xlsx into
        destination: PathBuf,

        /// Output format of the run summary
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Scan each child directory separately and write one workbook
    Partition {
        /// Directory whose child directories hold the JSON files
        source: PathBuf,

        /// Workbook path, or a directory to write a timestamped workbook into
        destination: PathBuf,
    },

    /// Scan each child directory separately and write CSV files
    PartitionCsv {
        /// Directory whose child directories hold the JSON files
        source: PathBuf,

        /// Directory for the CSV files
        destination: PathBuf,

        /// Write straight to the system temp directory
        #[arg(long)]
        temp: bool,

        /// Fail instead of falling back to the temp directory
        #[arg(long)]
        no_fallback: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet, cli.debug);
    if cli.debug {
        log_environment();
    }

    let schema = match &cli.schema {
        Some(path) => RecordSchema::from_file(path)
            .wrap_err_with(|| format!("Cannot load schema {}", path.display()))?,
        None => RecordSchema::default(),
    };
    let walker = TreeWalker::new();
    let analyze = AnalyzeConfig::builder()
        .max_groups(cli.max_groups)
        .build()
        .wrap_err("Invalid analysis configuration")?;

    match cli.command {
        Command::Tree {
            source,
            destination,
            format,
        } => {
            let config = scan_config(&source, ScanMode::Tree, schema, false);
            let outcome = run_whole_tree(&walker, &config, analyze, &destination)
                .or_else(|err| remediate(err, Output::Workbook))
                .wrap_err("Whole-tree run failed")?;
            print_tree_outcome(&outcome, format)?;
        }
        Command::Partition {
            source,
            destination,
        } => {
            let config = scan_config(&source, ScanMode::Partitioned, schema, cli.require_names);
            let path = resolve_workbook_path(
                &destination,
                &WorkbookName::Timestamped(timestamp_now()),
            );
            info!("Source directory: {}", source.display());
            info!("Destination file: {}", path.display());

            let outcome = XlsxSink::create_replacing(path)
                .and_then(|sink| run_partitioned(&walker, &config, analyze, sink))
                .or_else(|err| remediate(err, Output::Workbook))
                .wrap_err("Partitioned run failed")?;
            print_partitioned_outcome(&outcome);
        }
        Command::PartitionCsv {
            source,
            destination,
            temp,
            no_fallback,
        } => {
            let config = scan_config(&source, ScanMode::Partitioned, schema, cli.require_names);
            let sink_config = CsvSinkConfig::builder()
                .destination(destination)
                .fallback(if no_fallback {
                    FallbackPolicy::Fail
                } else {
                    FallbackPolicy::TempDir
                })
                .force_temp(temp)
                .build()
                .wrap_err("Invalid CSV output configuration")?;

            let outcome = CsvSink::prepare(sink_config)
                .and_then(|sink| run_partitioned(&walker, &config, analyze, sink))
                .or_else(|err| remediate(err, Output::Csv))
                .wrap_err("Partitioned CSV run failed")?;
            print_partitioned_outcome(&outcome);
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` directives add to the
/// level picked from the flags.
fn init_tracing(verbose: u8, quiet: u8, debug: bool) {
    let level = match i16::from(verbose) - i16::from(quiet) {
        i16::MIN..=-2 => Level::ERROR,
        -1 => Level::WARN,
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let level = if debug { level.max(Level::DEBUG) } else { level };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact()
        .try_init();
}

fn log_environment() {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|e| format!("<{e}>"));

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        %user,
        %cwd,
        "Environment"
    );
}

fn scan_config(
    source: &Path,
    mode: ScanMode,
    schema: RecordSchema,
    require_names: bool,
) -> ScanConfig {
    let mut extract = ExtractConfig::for_mode(mode).with_schema(schema);
    if require_names {
        extract = extract.with_name_policy(NamePolicy::RequireNames);
    }
    ScanConfig::for_mode(source, mode).with_extract(extract)
}

fn print_tree_outcome(outcome: &TreeOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Duplicate Person Report");
            println!("{}", "─".repeat(70));
            println!();
            println!(" Source: {}", outcome.root_path.display());
            print_run_counts(&outcome.run);
            println!();

            if outcome.report.is_empty() {
                println!(" No duplicate records found. Nothing written.");
            } else {
                println!(
                    " Found {} duplicate records ({} distinct persons)",
                    outcome.report.row_count(),
                    outcome.report.duplicate_identities
                );
                for group in outcome.report.groups().take(10) {
                    println!("   {:>4}x  {}", group.count(), group.full_name());
                }
                if outcome.report.duplicate_identities > 10 {
                    println!("   ... and {} more", outcome.report.duplicate_identities - 10);
                }
            }
            if let Some(path) = &outcome.output {
                println!();
                println!(" Written to {}", path.display());
            }
            println!(" Finished in {:.2}s", outcome.duration.as_secs_f64());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        }
    }

    Ok(())
}

fn print_partitioned_outcome(outcome: &PartitionedOutcome) {
    let totals = &outcome.totals;

    println!();
    println!("{}", "─".repeat(70));
    println!(" Duplicate Person Report by Directory");
    println!("{}", "─".repeat(70));
    println!();
    println!(
        " {} directories with files, {} files, {} records, {} duplicate records",
        totals.directories, totals.files, totals.records, totals.duplicate_rows
    );
    print_run_counts(&outcome.run);
    println!();

    for summary in outcome.summaries.iter().filter(|s| s.duplicate_rows > 0) {
        println!(
            "   {:<40} {:>6} rows  {:>5} persons",
            truncate(&summary.directory, 40),
            summary.duplicate_rows,
            summary.duplicate_identities
        );
    }

    if !outcome.failed_tables.is_empty() {
        println!();
        println!(" Not written: {}", outcome.failed_tables.join(", "));
    }

    println!();
    match &outcome.output.location {
        Some(location) => println!(" Output: {}", location.display()),
        None => println!(" No output written."),
    }
    if outcome.output.fell_back {
        warn!("Some files were written to the temp directory instead of the destination");
        println!(" Note: the destination was not writable; files went to the temp directory.");
    }
    println!(" Finished in {:.2}s", outcome.duration.as_secs_f64());
}

fn print_run_counts(run: &RunReport) {
    println!(
        " {} JSON files read, {} skipped, {} records",
        run.files_processed, run.files_failed, run.records_extracted
    );
    if run.records_skipped() > 0 {
        println!(
            " {} entries without person data, {} without names, {} malformed",
            run.records_without_data, run.records_without_names, run.records_malformed
        );
    }
    if run.has_warnings() {
        println!(" {} warning(s) during scan", run.warnings.len());
    }
}

/// Which kind of report a failed run was writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Workbook,
    Csv,
}

/// Print hints for an unwritable destination, then pass the error on.
fn remediate<T>(err: ReportError, output: Output) -> Result<T, ReportError> {
    if let ReportError::DestinationUnwritable { path, .. } = &err {
        print_remediation(path, output);
    }
    Err(err)
}

fn print_remediation(path: &Path, output: Output) {
    eprintln!();
    eprintln!("Cannot write reports to {}.", path.display());
    eprintln!("Try one of the following:");
    match output {
        Output::Workbook => {
            eprintln!("  - check that every parent of {} is a directory", path.display());
            eprintln!("  - check the permissions, e.g. `ls -ld {}`", path.display());
            eprintln!("  - pass a workbook path or directory you own");
        }
        Output::Csv => {
            eprintln!("  - check the directory permissions, e.g. `ls -ld {}`", path.display());
            eprintln!("  - pass a destination you own");
            eprintln!("  - rerun with --temp to write into the system temp directory");
            eprintln!("  - drop --no-fallback to let persondup use the temp directory");
        }
    }
    eprintln!();
}

/// Truncate a string to fit in a given width.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
