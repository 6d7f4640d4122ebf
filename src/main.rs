use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use tunefacet::backend::bulk_ndjson;
use tunefacet::batch::{documents, normalize_batch, records_from_json};
use tunefacet::models::NormalizedDocument;
use tunefacet::progress::{create_progress_bar, format_duration, init_tracing, log_progress, set_log_only};
use tunefacet::safety::{validate_bulk_path, validate_output_dir};
use tunefacet::NormalizeError;

#[derive(Parser)]
#[command(name = "tunefacet-normalize")]
#[command(about = "Normalize raw track metadata files into search-ready documents")]
struct Args {
    /// Directory of raw *.json files (one batch per file)
    raw_dir: PathBuf,

    /// Directory for normalized output (same file names)
    out_dir: PathBuf,

    /// Worker threads (0 = rayon default)
    #[arg(long, default_value = "0")]
    workers: usize,

    /// Also write a bulk NDJSON body targeting this index
    #[arg(long, env = "INDEX")]
    bulk_index: Option<String>,

    /// Bulk NDJSON output path (default: <out_dir>/bulk.ndjson)
    #[arg(long)]
    bulk_out: Option<PathBuf>,

    /// Hide progress bars, log progress lines instead
    #[arg(long)]
    log_only: bool,
}

const BULK_FILE_NAME: &str = "bulk.ndjson";

fn bulk_target(out_dir: &Path, bulk_out: Option<&Path>) -> PathBuf {
    bulk_out.map_or_else(|| out_dir.join(BULK_FILE_NAME), Path::to_path_buf)
}

fn raw_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read raw directory {:?}", dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Normalize one raw file. `Ok(None)` when the file holds an empty batch.
fn normalize_file(path: &Path, out_dir: &Path) -> Result<Option<Vec<NormalizedDocument>>> {
    let batch_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Raw file name is not valid UTF-8")?;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    let parsed = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {:?} as JSON", path))?;
    let records = records_from_json(parsed);

    let items = match normalize_batch(batch_name, &records) {
        Ok(items) => items,
        Err(err @ NormalizeError::EmptyBatch(_)) => {
            warn!("{}", err);
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    let docs = documents(items);

    let out_path = out_dir.join(path.file_name().context("Raw file has no name")?);
    let json = serde_json::to_string_pretty(&docs)?;
    std::fs::write(&out_path, json)
        .with_context(|| format!("Failed to write {:?}", out_path))?;

    info!(
        "Normalized {}/{} docs -> {:?}",
        docs.len(),
        records.len(),
        out_path
    );
    Ok(Some(docs))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let start = Instant::now();

    validate_output_dir(&args.out_dir, &args.raw_dir)?;
    let bulk_path = bulk_target(&args.out_dir, args.bulk_out.as_deref());
    if args.bulk_index.is_some() {
        validate_bulk_path(&bulk_path, &args.raw_dir)?;
    }

    let files = raw_files(&args.raw_dir)?;
    if files.is_empty() {
        bail!("No raw JSON files found in {:?}", args.raw_dir);
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", args.out_dir))?;

    let pb = create_progress_bar(files.len() as u64, "Normalizing");
    let mut all_docs: Vec<NormalizedDocument> = Vec::new();
    let mut skipped_batches = 0usize;

    for (i, path) in files.iter().enumerate() {
        match normalize_file(path, &args.out_dir)? {
            Some(docs) => all_docs.extend(docs),
            None => skipped_batches += 1,
        }
        pb.inc(1);
        log_progress("Normalizing", i as u64 + 1, files.len() as u64, 10);
    }
    pb.finish_with_message(format!("Normalized {} files", files.len()));

    if let Some(index) = &args.bulk_index {
        std::fs::write(&bulk_path, bulk_ndjson(index, &all_docs)?)
            .with_context(|| format!("Failed to write {:?}", bulk_path))?;
        println!("Bulk body for index '{}': {:?}", index, bulk_path);
    }

    println!("\n{:=<60}", "");
    println!("Normalization complete!");
    println!("  Files: {}", files.len());
    println!("  Empty batches skipped: {}", skipped_batches);
    println!("  Documents: {}", all_docs.len());
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    Ok(())
}
