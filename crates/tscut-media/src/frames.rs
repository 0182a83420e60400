//! Frame metadata extraction with FFmpeg's `showinfo` filter.
//!
//! For a time window the decoder writes every frame as a BMP into a scratch
//! directory while `showinfo` logs its timestamp, byte position and picture
//! type. The images are then downsampled and compared pairwise to produce a
//! per-frame difference score.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::{debug, warn};

use tscut_models::timestamp::round_decimals;
use tscut_models::{FrameType, FramesProperty};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Frames are shrunk by this factor on each axis before scoring.
pub const DIFF_DOWNSAMPLE: u32 = 8;

/// Select every frame and log its properties.
const SHOWINFO_FILTER: &str = "select='gte(t,0)',showinfo";

/// One `showinfo` line, before scoring.
#[derive(Debug, Clone, PartialEq)]
struct ShowinfoFrame {
    pts_time: f64,
    pos: i64,
    picture_type: String,
}

/// Decode `[ss, to]` of `input` and return its frames with diff scores.
///
/// Returns an empty list when FFmpeg produced no images or a different
/// number of images than logged frames; the window is then unusable.
pub async fn extract_frame_properties(
    input: &Path,
    ss: f64,
    to: f64,
    duration: Option<f64>,
) -> MediaResult<Vec<FramesProperty>> {
    let ss = round_decimals(ss.max(0.0), 3);
    let to = round_decimals(to, 3);

    let scratch = tempfile::Builder::new().prefix("tscut_frames_").tempdir()?;
    let pattern = scratch.path().join("out%08d.bmp");

    let cmd = FfmpegCommand::new(input, &pattern)
        .seek(ss)
        .until(to)
        .video_filter(SHOWINFO_FILTER)
        .output_args(["-vsync", "0", "-frame_pts", "1"])
        .log_level("info");

    let mut logged = Vec::new();
    FfmpegRunner::new()
        .run_with_lines(&cmd, |line| {
            if let Some(frame) = parse_showinfo_line(line) {
                logged.push(frame);
            }
        })
        .await?;

    let images = list_images(scratch.path()).await?;
    if images.is_empty() {
        warn!(ss, to, "No frames decoded in window");
        return Ok(Vec::new());
    }
    if images.len() != logged.len() {
        warn!(
            ss,
            to,
            images = images.len(),
            frames = logged.len(),
            "Decoded image count does not match logged frames"
        );
        return Ok(Vec::new());
    }

    let scores = tokio::task::spawn_blocking(move || diff_scores(&images))
        .await
        .map_err(|e| MediaError::internal(format!("frame scoring task failed: {}", e)))??;

    let upper = duration.map_or(to, |d| to.min(d));
    let frames: Vec<FramesProperty> = logged
        .into_iter()
        .zip(scores)
        .filter(|(frame, _)| frame.pos >= 0)
        .map(|(frame, score)| {
            FramesProperty::new(
                frame.pts_time + ss,
                frame.pos as u64,
                FrameType::from_picture_type(&frame.picture_type),
                score,
            )
        })
        .filter(|frame| frame.pts >= ss && frame.pts <= upper)
        .collect();

    debug!(ss, to, frames = frames.len(), "Extracted frame properties");
    Ok(frames)
}

/// Parse the fields used from a `showinfo` log line.
fn parse_showinfo_line(line: &str) -> Option<ShowinfoFrame> {
    if !line.contains("pts_time:") {
        return None;
    }
    Some(ShowinfoFrame {
        pts_time: field(line, "pts_time:")?.parse().ok()?,
        pos: field(line, " pos:")?.parse().ok()?,
        picture_type: field(line, " type:")?.to_string(),
    })
}

/// Value following `name` up to the next whitespace.
fn field<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let start = line.find(name)? + name.len();
    line[start..].split_whitespace().next()
}

/// BMP files in `dir`, in name order.
async fn list_images(dir: &Path) -> MediaResult<Vec<PathBuf>> {
    let mut images = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "bmp") {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Score each image against its predecessor; the first scores 0.
fn diff_scores(images: &[PathBuf]) -> MediaResult<Vec<f64>> {
    let mut scores = Vec::with_capacity(images.len());
    let mut previous: Option<RgbImage> = None;
    for path in images {
        let frame = image::open(path)?.to_rgb8();
        let small = downsample(&frame);
        let score = match &previous {
            Some(prev) => mean_abs_diff(prev, &small),
            None => 0.0,
        };
        scores.push(score);
        previous = Some(small);
    }
    Ok(scores)
}

fn downsample(frame: &RgbImage) -> RgbImage {
    let width = (frame.width() as f64 / DIFF_DOWNSAMPLE as f64).round().max(1.0) as u32;
    let height = (frame.height() as f64 / DIFF_DOWNSAMPLE as f64).round().max(1.0) as u32;
    imageops::resize(frame, width, height, FilterType::Nearest)
}

/// Mean absolute difference over all channels, normalised to `[0, 1]`.
///
/// Images of different sizes are maximally different.
pub fn mean_abs_diff(a: &RgbImage, b: &RgbImage) -> f64 {
    if a.dimensions() != b.dimensions() {
        return 1.0;
    }
    let samples = a.as_raw().len();
    if samples == 0 {
        return 0.0;
    }
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| x.abs_diff(*y) as u64)
        .sum();
    total as f64 / (samples as f64 * 255.0)
}
