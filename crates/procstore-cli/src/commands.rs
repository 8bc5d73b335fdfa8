use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use procstore_hash::ContentHasher;
use procstore_store::{
    DualIndexStore, ProcstoreConfig, RecognizeTargetPolicy, SearchPatternPolicy, StoragePolicy,
};
use procstore_types::Record;
use serde::Serialize;
use tracing::warn;

use crate::cli::*;

/// One record as printed by `list`, `add` and `duplicates`.
#[derive(Debug, Serialize)]
struct RecordSummary {
    path: Option<PathBuf>,
    name: String,
    width: u32,
    height: u32,
    hash: String,
}

impl RecordSummary {
    fn new(path: Option<&Path>, record: &Record) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            name: record.name().to_owned(),
            width: record.width(),
            height: record.height(),
            hash: ContentHasher::hash_record(record).to_string(),
        }
    }

    fn print(&self) {
        let location = self
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            "  {} {}x{} {} {}",
            self.hash.yellow(),
            self.width,
            self.height,
            self.name.bold(),
            location.dimmed()
        );
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ProcstoreConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ProcstoreConfig::default(),
    };

    match cli.kind {
        StoreKind::Search => {
            let policy = SearchPatternPolicy::from_config(&config.search);
            run(DualIndexStore::new(policy, config.storage)?, cli.command, cli.format)
        }
        StoreKind::Recognize => {
            let policy = RecognizeTargetPolicy::from_config(&config.recognize);
            run(DualIndexStore::new(policy, config.storage)?, cli.command, cli.format)
        }
    }
}

fn run<P: StoragePolicy>(
    store: DualIndexStore<P>,
    command: Command,
    format: OutputFormat,
) -> anyhow::Result<()> {
    open(&store);
    match command {
        Command::List(args) => cmd_list(&store, args, format),
        Command::Add(args) => cmd_add(&store, args, format),
        Command::Remove(args) => cmd_remove(&store, args, format),
        Command::Duplicates => cmd_duplicates(&store, format),
        Command::Export(args) => cmd_export(&store, args, format),
    }
}

/// Index the working directory. Files that fail to load are reported and
/// skipped.
fn open<P: StoragePolicy>(store: &DualIndexStore<P>) {
    let dir = store.working_directory();
    if !dir.is_dir() {
        return;
    }
    if let Err(e) = store.add_batch(dir) {
        warn!(count = e.cause_count(), "some records could not be loaded");
        eprintln!("{} {}", "warning:".yellow().bold(), e);
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_list<P: StoragePolicy>(
    store: &DualIndexStore<P>,
    args: ListArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let summaries: Vec<RecordSummary> = if args.unique {
        store
            .unique_elements()?
            .iter()
            .map(|r| RecordSummary::new(None, r))
            .collect()
    } else {
        store
            .snapshot()
            .iter()
            .map(|(path, r)| RecordSummary::new(Some(path), r))
            .collect()
    };

    if format == OutputFormat::Json {
        return print_json(&summaries);
    }
    println!(
        "{} records in {}",
        summaries.len().to_string().bold(),
        store.working_directory().display()
    );
    summaries.iter().for_each(RecordSummary::print);
    Ok(())
}

fn cmd_add<P: StoragePolicy>(
    store: &DualIndexStore<P>,
    args: AddArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let records = store.load(&args.path)?;
    let stored = store.is_working_directory(&args.path);
    let summaries: Vec<RecordSummary> = records
        .iter()
        .map(|r| RecordSummary::new(None, r))
        .collect();

    if format == OutputFormat::Json {
        return print_json(&summaries);
    }
    let verdict = if stored {
        "stored".green()
    } else {
        "read only, outside the working directory".yellow()
    };
    println!("{} Loaded {} records ({})", "✓".green().bold(), records.len(), verdict);
    summaries.iter().for_each(RecordSummary::print);
    Ok(())
}

fn cmd_remove<P: StoragePolicy>(
    store: &DualIndexStore<P>,
    args: RemoveArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let before = store.count();
    let removed = store.remove(&args.path);
    let count = before - store.count();

    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({ "removed": count, "remaining": store.count() }));
    }
    if removed {
        println!("{} Removed {} records; {} remain", "✓".green().bold(), count, store.count());
    } else {
        println!("Nothing to remove at {}", args.path.display().to_string().bold());
    }
    Ok(())
}

fn cmd_duplicates<P: StoragePolicy>(
    store: &DualIndexStore<P>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let groups: Vec<Vec<RecordSummary>> = store
        .duplicate_groups()
        .iter()
        .map(|g| g.iter().map(|(p, r)| RecordSummary::new(Some(p), r)).collect())
        .collect();

    if format == OutputFormat::Json {
        return print_json(&groups);
    }
    if groups.is_empty() {
        println!("No duplicate records.");
    }
    for (i, group) in groups.iter().enumerate() {
        println!("Group {} ({} records)", (i + 1).to_string().bold(), group.len());
        group.iter().for_each(RecordSummary::print);
    }
    Ok(())
}

fn cmd_export<P: StoragePolicy>(
    store: &DualIndexStore<P>,
    args: ExportArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let records: Vec<Record> = store.snapshot().into_iter().map(|(_, r)| r).collect();
    let paths = store
        .save_batch(&args.folder, &records)
        .with_context(|| format!("exporting to {}", args.folder))?;

    if format == OutputFormat::Json {
        return print_json(&paths);
    }
    println!("{} Exported {} records", "✓".green().bold(), paths.len());
    for path in &paths {
        println!("  {}", path.display());
    }
    Ok(())
}
