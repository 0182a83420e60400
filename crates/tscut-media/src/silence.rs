//! Audio silence detection with FFmpeg's `silencedetect` filter.

use std::path::Path;

use tracing::{debug, info};

use tscut_models::SilenceInterval;

use crate::command::{parse_progress_line, FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::progress::FfmpegProgress;

/// Detect silent intervals in the first audio track of `input`.
///
/// A silence still open when the stream ends is closed at `duration`.
pub async fn detect_silence<F>(
    input: &Path,
    min_silence_ms: u64,
    threshold_db: f64,
    duration: f64,
    progress_callback: F,
) -> MediaResult<Vec<SilenceInterval>>
where
    F: Fn(FfmpegProgress),
{
    info!(min_silence_ms, threshold_db, "Detecting silence");

    let cmd = FfmpegCommand::new(input, "-")
        .map("0:a:0")
        .audio_filter(silencedetect_filter(min_silence_ms, threshold_db))
        .null_output()
        .with_progress()
        .log_level("info");

    let mut parser = SilenceParser::default();
    let mut progress = FfmpegProgress::default();
    FfmpegRunner::new()
        .run_with_lines(&cmd, |line| {
            parser.feed(line);
            if let Some(update) = parse_progress_line(line, &mut progress) {
                progress_callback(update);
            }
        })
        .await?;

    let intervals = parser.finish(duration);
    info!(intervals = intervals.len(), "Silence detection done");
    Ok(intervals)
}

/// Filter string for the given length (ms) and threshold (dB).
pub fn silencedetect_filter(min_silence_ms: u64, threshold_db: f64) -> String {
    format!(
        "silencedetect=noise={}dB:d={:.3}",
        threshold_db,
        min_silence_ms as f64 / 1000.0
    )
}

/// Accumulates `silence_start` / `silence_end` log lines into intervals.
#[derive(Debug, Default)]
pub struct SilenceParser {
    open_start: Option<f64>,
    intervals: Vec<SilenceInterval>,
}

impl SilenceParser {
    /// Consume one stderr line; unrelated lines are ignored.
    pub fn feed(&mut self, line: &str) {
        if let Some(start) = value_after(line, "silence_start:") {
            self.open_start = Some(start.max(0.0));
        } else if let Some(end) = value_after(line, "silence_end:") {
            let start = self.open_start.take().unwrap_or(0.0);
            self.push(start, end);
        }
    }

    /// Close a pending silence at `duration` and return all intervals.
    pub fn finish(mut self, duration: f64) -> Vec<SilenceInterval> {
        if let Some(start) = self.open_start.take() {
            debug!(start, duration, "Closing trailing silence at end of stream");
            self.push(start, duration);
        }
        self.intervals
    }

    fn push(&mut self, start: f64, end: f64) {
        let start_ms = (start * 1000.0).round() as u64;
        let end_ms = (end.max(0.0) * 1000.0).round() as u64;
        if end_ms > start_ms {
            self.intervals.push(SilenceInterval::new(start_ms, end_ms));
        }
    }
}

fn value_after(line: &str, name: &str) -> Option<f64> {
    let start = line.find(name)? + name.len();
    line[start..].split_whitespace().next()?.parse().ok()
}
