//! Analyze → persist → split pipeline tests.
//!
//! Run the tests that need FFmpeg and a real recording:
//!   TSCUT_SAMPLE_TS=/path/to/recording.ts cargo test --test pipeline -- --ignored

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use tscut_media::analyze::{analyze_video, AnalyzeConfig};
use tscut_media::provider::{FramePropertyProvider, ProgressFn, SilenceDetector, StreamProbe};
use tscut_media::{
    load_pts_map, save_pts_map, AnalyzeEvent, MediaError, MediaResult, SourceFile, Splitter,
    StreamInfo,
};
use tscut_models::{FrameType, FramesProperty, PtsMap, SilenceInterval, TS_PACKET_SIZE};

const DURATION: f64 = 900.0;
const SIZE: u64 = 400_000;

/// Canned recording: a fixed frame list and fixed silences.
struct FakeRecording {
    silences: Vec<SilenceInterval>,
    frames: Vec<FramesProperty>,
    windows: Mutex<Vec<(f64, f64)>>,
}

impl FakeRecording {
    fn new(silences: &[(u64, u64)], frames: Vec<FramesProperty>) -> Self {
        Self {
            silences: silences.iter().copied().map(SilenceInterval::from).collect(),
            frames,
            windows: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StreamProbe for FakeRecording {
    async fn stream_info(&self) -> MediaResult<StreamInfo> {
        Ok(StreamInfo {
            duration: DURATION,
            file_size: SIZE,
            sound_tracks: 1,
            width: 1440,
            height: 1080,
            fps: 29.97,
            service_id: Some(1032),
        })
    }
}

#[async_trait]
impl SilenceDetector for FakeRecording {
    async fn detect_silence(
        &self,
        _min_silence_ms: u64,
        _threshold_db: f64,
        _progress: ProgressFn<'_>,
    ) -> MediaResult<Vec<SilenceInterval>> {
        Ok(self.silences.clone())
    }
}

#[async_trait]
impl FramePropertyProvider for FakeRecording {
    async fn frame_properties(&self, ss: f64, to: f64) -> MediaResult<Vec<FramesProperty>> {
        self.windows.lock().unwrap().push((ss, to));
        Ok(self
            .frames
            .iter()
            .filter(|f| f.pts >= ss && f.pts <= to)
            .copied()
            .collect())
    }
}

fn frame(pts: f64, pos: u64, key: bool, score: f64) -> FramesProperty {
    let frame_type = if key { FrameType::Key } else { FrameType::Predicted };
    FramesProperty::new(pts, pos, frame_type, score)
}

/// Frames around a scene change at 120 s.
fn frames_around_120() -> Vec<FramesProperty> {
    vec![
        frame(118.6, 52_640, true, 0.0),
        frame(119.0, 52_828, false, 0.0),
        frame(119.5, 53_016, false, 0.02),
        frame(120.0, 53_204, false, 0.31),
        frame(120.5, 53_392, false, 0.05),
        frame(121.0, 53_580, true, 0.01),
    ]
}

fn write_source(dir: &Path) -> PathBuf {
    let path = dir.join("recording.ts");
    let bytes: Vec<u8> = (0..SIZE).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, bytes).unwrap();
    path
}

#[tokio::test]
async fn test_analyze_builds_expected_map() {
    let recording = FakeRecording::new(&[(119_000, 120_000), (119_900, 120_600)], frames_around_120());
    let events = Mutex::new(Vec::new());

    let map = analyze_video(&recording, &AnalyzeConfig::default(), |event| {
        events.lock().unwrap().push(event);
    })
    .await
    .unwrap();

    assert_eq!(map.keys().collect::<Vec<_>>(), vec![0.0, 120.0, DURATION]);
    assert!(map.validate().is_ok());

    let cut = map.get(120.0).unwrap();
    assert_eq!(cut.prev_end_pos, 52_640);
    assert_eq!(cut.next_start_pos, 53_580);
    assert_eq!(cut.silent_ss, Some(119.0));
    assert_eq!(cut.silent_to, Some(120.6));

    // the two overlapping silences were merged into one window
    assert_eq!(*recording.windows.lock().unwrap(), vec![(118.0, 121.6)]);

    let events = events.into_inner().unwrap();
    assert!(matches!(
        events.iter().find(|e| matches!(e, AnalyzeEvent::SilenceDetected { .. })),
        Some(AnalyzeEvent::SilenceDetected {
            intervals: 2,
            merged: 1
        })
    ));
    assert!(matches!(
        events.last(),
        Some(AnalyzeEvent::Complete { entries: 3 })
    ));
}

#[tokio::test]
async fn test_silence_without_frames_keeps_boundaries() {
    let recording = FakeRecording::new(&[(300_000, 301_000)], frames_around_120());
    let map = analyze_video(&recording, &AnalyzeConfig::default(), |_| {})
        .await
        .unwrap();
    assert_eq!(map, PtsMap::boundaries(DURATION, SIZE));
}

#[tokio::test]
async fn test_persist_split_and_extract() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path());
    let recording = FakeRecording::new(&[(119_000, 120_600)], frames_around_120());

    let map = analyze_video(&recording, &AnalyzeConfig::default(), |_| {})
        .await
        .unwrap();

    let index = dir.path().join("_metadata").join("recording.ptsmap");
    save_pts_map(&map, &index).await.unwrap();
    let first_save = std::fs::read_to_string(&index).unwrap();
    let loaded = load_pts_map(&index).await.unwrap();
    assert_eq!(loaded, map);
    save_pts_map(&loaded, &index).await.unwrap();
    assert_eq!(std::fs::read_to_string(&index).unwrap(), first_save);

    let splitter = Splitter::new(&source);
    let out = dir.path().join("recording");
    let first = splitter.split(&loaded, &out, |_| {}).await.unwrap();
    let names: Vec<_> = first
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["0000.000-0120.000.ts", "0120.000-0900.000.ts"]);
    let first_bytes: Vec<Vec<u8>> = first.iter().map(|p| std::fs::read(p).unwrap()).collect();

    // splitting again reproduces the same files
    let second = splitter.split(&loaded, &out, |_| {}).await.unwrap();
    let second_bytes: Vec<Vec<u8>> = second.iter().map(|p| std::fs::read(p).unwrap()).collect();
    assert_eq!(first, second);
    assert_eq!(first_bytes, second_bytes);

    let all = std::fs::read(&source).unwrap();
    assert_eq!(first_bytes[0], all[..52_640]);
    assert_eq!(first_bytes[1], all[53_580..]);

    let range = tscut_media::range_bytes(&loaded, 58.0, 130.0).unwrap();
    assert_eq!(range.start % TS_PACKET_SIZE, 0);

    let mut sink = Vec::new();
    let copied = splitter
        .extract_range_to(&loaded, 58.0, 130.0, &mut sink, |_| {})
        .await
        .unwrap();
    assert_eq!(copied, range.length);
    let start = range.start as usize;
    assert_eq!(sink, all[start..start + range.length as usize]);
}

#[tokio::test]
async fn test_boundary_map_splits_into_whole_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path());
    let map = PtsMap::boundaries(DURATION, SIZE);

    let out = dir.path().join("whole");
    let paths = Splitter::new(&source).split(&map, &out, |_| {}).await.unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(std::fs::read(&paths[0]).unwrap(), std::fs::read(&source).unwrap());
}

#[tokio::test]
async fn test_missing_source_is_fatal() {
    let result = SourceFile::open("/nonexistent/recording.ts");
    assert!(matches!(result, Err(MediaError::FileNotFound(_))));
}

/// Full run against a real recording.
#[tokio::test]
#[ignore = "requires ffmpeg and TSCUT_SAMPLE_TS"]
async fn test_real_recording() {
    let Ok(sample) = std::env::var("TSCUT_SAMPLE_TS") else {
        return;
    };
    let source = SourceFile::open(&sample).expect("Failed to open sample");
    let map = analyze_video(&source, &AnalyzeConfig::default(), |_| {})
        .await
        .expect("Analysis failed");

    let info = source.info().await.expect("Probe failed");
    assert!(map.validate().is_ok());
    assert_eq!(map.first().map(|(k, _)| k), Some(0.0));
    assert_eq!(map.length(), info.file_size);
}
