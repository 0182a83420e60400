//! Cut point analysis.
//!
//! # Pipeline
//!
//! ```text
//! probe ──► silence detection ──► merge ──► locate (per window) ──► build map
//! ```
//!
//! Every stage runs to completion before the next starts. A window the
//! locator cannot resolve only loses its own cut; a missing source, an
//! unparseable stream or a missing FFmpeg binary aborts the run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tscut_media::analyze::{analyze_video, AnalyzeConfig};
//! use tscut_media::SourceFile;
//!
//! let source = SourceFile::open("recording.ts")?;
//! let map = analyze_video(&source, &AnalyzeConfig::default(), |_| {}).await?;
//! ```

mod builder;
mod config;
mod locator;
mod merge;

pub use builder::build_pts_map;
pub use config::{AnalyzeConfig, DedupPolicy, LocatorStrategy};
pub use locator::{select_candidate, SceneChangeLocator};
pub use merge::merge_intervals;

use tracing::{debug, info, warn};

use tscut_models::PtsMap;

use crate::error::MediaResult;
use crate::metrics;
use crate::progress::{AnalyzeEvent, FfmpegProgress};
use crate::provider::{FramePropertyProvider, SilenceDetector, StreamProbe};

/// Analyse a recording and build its PTS map.
pub async fn analyze_video<S, F>(
    source: &S,
    config: &AnalyzeConfig,
    progress_callback: F,
) -> MediaResult<PtsMap>
where
    S: StreamProbe + SilenceDetector + FramePropertyProvider + ?Sized,
    F: Fn(AnalyzeEvent) + Send + Sync,
{
    let info = source.stream_info().await?;
    info!(
        duration = info.duration,
        file_size = info.file_size,
        sound_tracks = info.sound_tracks,
        "Analyzing recording"
    );
    progress_callback(AnalyzeEvent::Probed(info.clone()));

    let on_silence = |p: FfmpegProgress| progress_callback(AnalyzeEvent::DetectingSilence(p));
    let raw = source
        .detect_silence(config.min_silence_ms, config.silence_thresh_db, &on_silence)
        .await?;
    let raw_count = raw.len();
    let windows = merge_intervals(raw);
    info!(intervals = raw_count, merged = windows.len(), "Silence windows ready");
    progress_callback(AnalyzeEvent::SilenceDetected {
        intervals: raw_count,
        merged: windows.len(),
    });

    let locator = SceneChangeLocator::new(source, config.split_pos_shift, config.strategy)
        .with_duration(info.duration);

    let total = windows.len();
    let mut candidates = Vec::with_capacity(total);
    for (i, window) in windows.iter().enumerate() {
        metrics::record_window_analyzed();
        let (ss, to) = (window.start_secs(), window.end_secs());

        let found = match locator.locate(ss, to).await? {
            Some(candidate) => {
                debug!(
                    ss,
                    to,
                    pts = candidate.scene_change.pts,
                    score = candidate.scene_change.diff_score,
                    "Located cut"
                );
                candidates.push(candidate);
                true
            }
            None => {
                warn!(ss, to, "No cut found in silence window");
                false
            }
        };
        progress_callback(AnalyzeEvent::WindowLocated {
            done: i + 1,
            total,
            found,
        });
    }

    info!(
        windows = total,
        candidates = candidates.len(),
        "Scene change localisation done"
    );

    let map = build_pts_map(&candidates, info.duration, info.file_size, config.dedup_policy);
    progress_callback(AnalyzeEvent::Complete { entries: map.len() });
    Ok(map)
}
