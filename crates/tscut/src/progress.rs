//! Terminal progress bars.
//!
//! All bars draw to stderr and are hidden with `--quiet`.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use tscut_media::{AnalyzeEvent, CopyProgress};

const PERCENT_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% ({eta}) {msg}";
const COUNT_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>5}/{len:5} ({eta}) {msg}";
const BYTES_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}";

fn styled_bar(len: u64, template: &str, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏ "),
    );
    pb.set_message(message);
    pb
}

/// Byte-copy bar for `split` and `extract`.
pub fn copy_bar(total: u64, message: &'static str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = styled_bar(total, BYTES_TEMPLATE, message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Move a copy bar to the reported position.
pub fn update_copy_bar(pb: &ProgressBar, progress: CopyProgress) {
    pb.set_length(progress.total);
    pb.set_position(progress.copied);
}

/// Bars for the two long stages of `analyze`.
pub struct AnalyzeBars {
    quiet: bool,
    silence: ProgressBar,
    windows: ProgressBar,
}

impl AnalyzeBars {
    pub fn new(quiet: bool) -> Self {
        if quiet {
            return Self {
                quiet,
                silence: ProgressBar::hidden(),
                windows: ProgressBar::hidden(),
            };
        }

        let silence = styled_bar(0, PERCENT_TEMPLATE, "detecting silence");
        silence.enable_steady_tick(Duration::from_millis(100));
        let windows = styled_bar(0, COUNT_TEMPLATE, "locating scene changes");
        windows.set_draw_target(ProgressDrawTarget::hidden());

        Self {
            quiet,
            silence,
            windows,
        }
    }

    /// Update the bars from a pipeline event.
    pub fn handle(&self, event: &AnalyzeEvent) {
        match event {
            AnalyzeEvent::Probed(info) => {
                self.silence.set_length((info.duration * 1000.0) as u64);
            }
            AnalyzeEvent::DetectingSilence(progress) => {
                self.silence.set_position(progress.out_time_ms.max(0) as u64);
            }
            AnalyzeEvent::SilenceDetected { merged, .. } => {
                self.silence.finish_and_clear();
                self.windows.set_length(*merged as u64);
                if !self.quiet {
                    self.windows.set_draw_target(ProgressDrawTarget::stderr());
                    self.windows.enable_steady_tick(Duration::from_millis(100));
                }
            }
            AnalyzeEvent::WindowLocated { done, .. } => {
                self.windows.set_position(*done as u64);
            }
            AnalyzeEvent::Complete { .. } => {
                self.windows.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tscut_media::FfmpegProgress;

    #[test]
    fn test_quiet_bars_track_events() {
        let bars = AnalyzeBars::new(true);
        bars.handle(&AnalyzeEvent::DetectingSilence(FfmpegProgress {
            out_time_ms: 1500,
            ..Default::default()
        }));
        assert_eq!(bars.silence.position(), 1500);

        bars.handle(&AnalyzeEvent::SilenceDetected {
            intervals: 7,
            merged: 5,
        });
        bars.handle(&AnalyzeEvent::WindowLocated {
            done: 2,
            total: 5,
            found: true,
        });
        assert_eq!(bars.windows.length(), Some(5));
        assert_eq!(bars.windows.position(), 2);
    }

    #[test]
    fn test_copy_bar_follows_progress() {
        let pb = copy_bar(0, "copying", true);
        update_copy_bar(
            &pb,
            CopyProgress {
                copied: 188,
                total: 376,
            },
        );
        assert_eq!(pb.length(), Some(376));
        assert_eq!(pb.position(), 188);
    }
}
