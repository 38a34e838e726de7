mod config;
mod error;
mod parser;
mod response;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::parser::sections::{split_sections, Section};
use crate::parser::table::extract_table;
use crate::parser::ParsedReport;
use crate::response::ChatResponse;

#[derive(Parser)]
#[command(name = "netquery_report", about = "Split query-answer reports into narrative, rows and explanation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one report and print it as JSON
    Parse {
        /// Report file (default: stdin)
        path: Option<PathBuf>,
        /// Emit the chat response shape instead of the parsed record
        #[arg(long)]
        chat: bool,
    },
    /// Show the table span and section layout of a report
    Sections {
        /// Report file (default: stdin)
        path: Option<PathBuf>,
    },
    /// Parse every report in a directory, writing <stem>.json per report
    Batch {
        dir: PathBuf,
        /// Output directory (default: next to the inputs)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Max reports to parse
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

fn init_tracing(settings: &Settings) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Route caught parser panics through the subscriber instead of raw stderr.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        error!(
            panic = %parser::panic_message(info.payload()),
            location = %location,
            "panic"
        );
    }));
}

fn main() -> Result<()> {
    let (settings, settings_err) = match Settings::load() {
        Ok(s) => (s, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    init_tracing(&settings);
    install_panic_hook();
    if let Some(e) = settings_err {
        warn!(error = %e, "Invalid settings, using defaults");
    }

    let t0 = Instant::now();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { path, chat } => {
            let raw = read_report(path.as_deref())?;
            let report = parser::parse_report(&raw);
            let json = if chat {
                to_json(&ChatResponse::from(report), settings.pretty)?
            } else {
                to_json(&report, settings.pretty)?
            };
            println!("{}", json);
        }
        Commands::Sections { path } => {
            let raw = read_report(path.as_deref())?;
            print_layout(&raw);
        }
        Commands::Batch { dir, out, limit } => {
            let files = list_reports(&dir, &settings, limit)?;
            if files.is_empty() {
                println!("No report files in {}.", dir.display());
                return Ok(());
            }
            let out_dir = out.unwrap_or_else(|| dir.clone());
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            println!("Parsing {} reports...", files.len());
            let counts = parse_files(&files, &out_dir, &settings)?;
            counts.print();
            info!(elapsed_ms = t0.elapsed().as_millis() as u64, "batch finished");
        }
    }

    Ok(())
}

fn read_report(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) => fs::read_to_string(p).with_context(|| format!("Failed to read {}", p.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read report from stdin")?;
            Ok(buf)
        }
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn print_layout(raw: &str) {
    let table = extract_table(raw);
    match table.span {
        Some(span) => {
            let rows = table.rows.as_deref().unwrap_or_default();
            let columns = rows
                .first()
                .map(|r| r.columns().collect::<Vec<_>>().join(", "))
                .unwrap_or_default();
            println!(
                "Table:  lines {}..{} ({} rows, {} columns: {})",
                span.start,
                span.end,
                rows.len(),
                rows.first().map_or(0, |r| r.len()),
                columns
            );
        }
        None => println!("Table:  none"),
    }

    let stripped = match table.span {
        Some(span) => parser::strip::remove_span(raw, span).unwrap_or_else(|_| raw.to_string()),
        None => raw.to_string(),
    };
    let sections = split_sections(&stripped);

    println!("{:>3} | {:<28} | {:<12} | {:>6}", "#", "Section", "Kind", "Chars");
    println!("{}", "-".repeat(58));
    for (i, s) in sections.iter().enumerate() {
        println!(
            "{:>3} | {:<28} | {:<12} | {:>6}",
            i,
            truncate(section_label(s), 28),
            format!("{:?}", s.kind()),
            s.body.chars().count()
        );
    }
}

fn section_label(section: &Section) -> &str {
    if section.is_narrative() {
        "(narrative)"
    } else {
        &section.name
    }
}

fn list_reports(dir: &Path, settings: &Settings, limit: Option<usize>) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && settings.accepts(p))
        .collect();
    files.sort();
    if let Some(n) = limit {
        files.truncate(n);
    }
    Ok(files)
}

struct BatchCounts {
    reports: usize,
    tables: usize,
    rows: usize,
    degraded: usize,
}

impl BatchCounts {
    fn print(&self) {
        println!(
            "Parsed {} reports: {} tables, {} rows, {} passed through unparsed.",
            self.reports, self.tables, self.rows, self.degraded,
        );
    }
}

fn parse_files(files: &[PathBuf], out_dir: &Path, settings: &Settings) -> Result<BatchCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = BatchCounts {
        reports: 0,
        tables: 0,
        rows: 0,
        degraded: 0,
    };

    for chunk in files.chunks(settings.batch_chunk.max(1)) {
        let results: Vec<Result<(PathBuf, ParsedReport)>> = chunk
            .par_iter()
            .map(|path| {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let report = parser::parse_report(&raw);
                Ok((path.clone(), report))
            })
            .collect();

        for result in results {
            let (path, report) = result?;
            counts.reports += 1;
            if report.table_span_removed {
                counts.tables += 1;
            }
            counts.rows += report.results.as_ref().map_or(0, Vec::len);
            if report.degraded {
                counts.degraded += 1;
            }

            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("report");
            let target = out_dir.join(format!("{}.json", stem));
            fs::write(&target, to_json(&report, settings.pretty)?)
                .with_context(|| format!("Failed to write {}", target.display()))?;
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
