//! FFprobe stream information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Transport stream information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Duration of the video stream in seconds
    pub duration: f64,
    /// File size in bytes
    pub file_size: u64,
    /// Number of audio streams
    pub sound_tracks: usize,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Program (service) id carrying the streams, if any
    pub service_id: Option<u32>,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    programs: Vec<FfprobeProgram>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeProgram {
    program_id: u32,
    #[serde(default)]
    nb_streams: u32,
}

/// Probe a transport stream for information.
pub async fn probe_stream(path: impl AsRef<Path>) -> MediaResult<StreamInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let ffprobe = check_ffprobe()?;

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
            "-show_programs",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::invalid_format(format!(
            "\"{}\" could not be probed: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let file_size = tokio::fs::metadata(path).await?.len();
    let info = parse_probe_output(&output.stdout, file_size)
        .map_err(|e| MediaError::invalid_format(format!("\"{}\": {}", path.display(), e)))?;

    debug!(
        path = %path.display(),
        duration = info.duration,
        file_size = info.file_size,
        sound_tracks = info.sound_tracks,
        "Probed stream"
    );

    Ok(info)
}

/// Turn FFprobe JSON into [`StreamInfo`]; the error is a reason string.
fn parse_probe_output(json: &[u8], file_size: u64) -> Result<StreamInfo, String> {
    let probe: FfprobeOutput =
        serde_json::from_slice(json).map_err(|e| format!("unreadable probe output ({})", e))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| "no video stream found".to_string())?;

    let duration = video
        .duration
        .as_deref()
        .or(probe.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| "video stream has no duration".to_string())?;

    let fps = video
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(0.0);

    Ok(StreamInfo {
        duration,
        file_size,
        sound_tracks: probe.streams.iter().filter(|s| s.codec_type == "audio").count(),
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        fps,
        service_id: probe
            .programs
            .iter()
            .find(|p| p.nb_streams > 0)
            .map(|p| p.program_id),
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROBE_JSON: &str = r#"{
        "programs": [
            {"program_id": 1024, "nb_streams": 0},
            {"program_id": 1032, "nb_streams": 3}
        ],
        "streams": [
            {"codec_type": "video", "width": 1440, "height": 1080,
             "avg_frame_rate": "30000/1001", "duration": "1800.512000"},
            {"codec_type": "audio"},
            {"codec_type": "audio"}
        ],
        "format": {"duration": "1801.000000"}
    }"#;

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
    }

    #[test]
    fn test_parse_probe_output() {
        let info = parse_probe_output(PROBE_JSON.as_bytes(), 400_000).unwrap();
        assert!((info.duration - 1800.512).abs() < 1e-9);
        assert_eq!(info.file_size, 400_000);
        assert_eq!(info.sound_tracks, 2);
        assert_eq!(info.width, 1440);
        assert_eq!(info.service_id, Some(1032));
    }

    #[test]
    fn test_parse_probe_output_falls_back_to_format_duration() {
        let json = r#"{"streams": [{"codec_type": "video"}], "format": {"duration": "12.5"}}"#;
        let info = parse_probe_output(json.as_bytes(), 10).unwrap();
        assert!((info.duration - 12.5).abs() < 1e-9);
        assert_eq!(info.service_id, None);
    }

    #[test]
    fn test_parse_probe_output_rejects_invalid_streams() {
        assert!(parse_probe_output(b"not json", 0).is_err());
        assert!(parse_probe_output(br#"{"streams": [{"codec_type": "audio"}]}"#, 0).is_err());
        assert!(parse_probe_output(br#"{"streams": [{"codec_type": "video"}]}"#, 0).is_err());
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let result = probe_stream("/nonexistent/recording.ts").await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
