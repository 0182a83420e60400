//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::AsyncWrite;
use tracing::{info, warn};

use tscut_media::{
    analyze_video, default_index_path, load_pts_map, save_pts_map, AnalyzeConfig, LocatorStrategy,
    SourceFile, Splitter,
};
use tscut_models::timestamp::format_pts_display;
use tscut_models::{Clip, PtsMap};

use crate::cli::{AnalyzeArgs, ClipsArgs, ExtractArgs, SplitArgs};
use crate::config::TscutConfig;
use crate::progress::{copy_bar, update_copy_bar, AnalyzeBars};

/// Apply command-line overrides to the configured analysis parameters.
pub fn analyze_config(base: &AnalyzeConfig, args: &AnalyzeArgs) -> AnalyzeConfig {
    let mut config = base.clone();
    if let Some(ms) = args.min_silence_ms {
        config = config.with_min_silence_ms(ms);
    }
    if let Some(db) = args.threshold_db {
        config = config.with_silence_thresh_db(db);
    }
    if let Some(shift) = args.split_pos_shift {
        config = config.with_split_pos_shift(shift);
    }
    if args.iterative {
        config = config.with_strategy(LocatorStrategy::iterative());
    }
    config
}

/// Default split directory: the input path without its extension.
pub fn default_output_dir(input: &Path) -> PathBuf {
    input.with_extension("")
}

fn index_path(input: &Path, index: Option<&PathBuf>) -> PathBuf {
    index.cloned().unwrap_or_else(|| default_index_path(input))
}

async fn load_index(path: &Path) -> Result<PtsMap> {
    load_pts_map(path)
        .await
        .with_context(|| format!("Failed to load index {}", path.display()))
}

pub async fn analyze(args: AnalyzeArgs, config: &TscutConfig, quiet: bool) -> Result<()> {
    let index = args
        .output
        .clone()
        .unwrap_or_else(|| default_index_path(&args.input));

    if index.exists() && !args.force {
        warn!(
            index = %index.display(),
            "Index already exists, keeping it (use --force to rebuild)"
        );
        println!("{}", index.display());
        return Ok(());
    }

    let source = SourceFile::open(&args.input)
        .with_context(|| format!("Cannot open {}", args.input.display()))?;
    let analyze_config = analyze_config(&config.analyze, &args);
    info!(input = %args.input.display(), config = ?analyze_config, "Starting analysis");

    let bars = AnalyzeBars::new(quiet);
    let map = analyze_video(&source, &analyze_config, |event| bars.handle(&event))
        .await
        .with_context(|| format!("Analysis of {} failed", args.input.display()))?;

    save_pts_map(&map, &index)
        .await
        .with_context(|| format!("Failed to write index {}", index.display()))?;

    info!(
        index = %index.display(),
        cuts = map.len().saturating_sub(2),
        clips = map.clips().len(),
        "Analysis complete"
    );
    println!("{}", index.display());
    Ok(())
}

pub async fn split(args: SplitArgs, config: &TscutConfig, quiet: bool) -> Result<()> {
    let index = index_path(&args.input, args.index.as_ref());
    let map = load_index(&index).await?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_dir(&args.input));

    let splitter = Splitter::new(&args.input).with_chunk_size(config.chunk_size);
    let pb = copy_bar(map.length(), "splitting", quiet);
    let written = splitter
        .split(&map, &output, |p| update_copy_bar(&pb, p))
        .await
        .with_context(|| format!("Failed to split {}", args.input.display()))?;
    pb.finish_and_clear();

    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

pub async fn extract(args: ExtractArgs, config: &TscutConfig, quiet: bool) -> Result<()> {
    let index = index_path(&args.input, args.index.as_ref());
    let map = load_index(&index).await?;
    let splitter = Splitter::new(&args.input).with_chunk_size(config.chunk_size);

    let mut sink: Box<dyn AsyncWrite + Unpin + Send> = match &args.output {
        Some(path) => Box::new(
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("Cannot create {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdout()),
    };

    let pb = copy_bar(0, "extracting", quiet);
    let copied = match (args.from, args.to) {
        (Some(from), Some(to)) => {
            splitter
                .extract_range_to(&map, from, to, &mut *sink, |p| update_copy_bar(&pb, p))
                .await
        }
        _ => {
            splitter
                .extract_clips_to(&map, &args.clip, &mut *sink, |p| update_copy_bar(&pb, p))
                .await
        }
    }
    .with_context(|| format!("Failed to extract from {}", args.input.display()))?;
    pb.finish_and_clear();

    info!(bytes = copied, "Extraction complete");
    Ok(())
}

#[derive(Debug, Serialize)]
struct ClipRow {
    start: f64,
    end: f64,
    start_display: String,
    duration: f64,
    start_pos: u64,
    end_pos: u64,
    bytes: u64,
}

impl From<&Clip> for ClipRow {
    fn from(clip: &Clip) -> Self {
        Self {
            start: clip.start,
            end: clip.end,
            start_display: format_pts_display(clip.start),
            duration: clip.duration(),
            start_pos: clip.start_pos,
            end_pos: clip.end_pos,
            bytes: clip.byte_len(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClipListing {
    duration: f64,
    length: u64,
    clips: Vec<ClipRow>,
    selected: Vec<ClipRow>,
    selected_duration: f64,
}

fn clip_listing(map: &PtsMap, min_length: f64) -> ClipListing {
    let (selected, selected_duration) = map.select_clips(min_length);
    ClipListing {
        duration: map.duration(),
        length: map.length(),
        clips: map.clips().iter().map(ClipRow::from).collect(),
        selected: selected.iter().map(ClipRow::from).collect(),
        selected_duration,
    }
}

pub async fn clips(args: ClipsArgs) -> Result<()> {
    let index = match (&args.index, &args.input) {
        (Some(index), _) => index.clone(),
        (None, Some(input)) => default_index_path(input),
        (None, None) => anyhow::bail!("either --index or --input is required"),
    };
    let map = load_index(&index).await?;
    let listing = clip_listing(&map, args.min_length);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!(
        "{:>12}  {:>12}  {:>10}  {:>12}  {:>12}",
        "start", "end", "duration", "start_pos", "bytes"
    );
    for row in &listing.clips {
        println!(
            "{:>12.3}  {:>12.3}  {:>10.3}  {:>12}  {:>12}",
            row.start, row.end, row.duration, row.start_pos, row.bytes
        );
    }
    println!();
    println!(
        "{} of {} clips are at least {}s long, covering {:.3}s of {:.3}s",
        listing.selected.len(),
        listing.clips.len(),
        args.min_length,
        listing.selected_duration,
        listing.duration
    );
    for row in &listing.selected {
        println!("  {} ({:.3}s)", row.start_display, row.duration);
    }
    Ok(())
}
