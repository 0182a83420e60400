//! Byte-exact splitting and extraction driven by a PTS map.
//!
//! Nothing here understands the transport stream. Clip boundaries come from
//! the byte offsets recorded in the map; sub-range extraction interpolates
//! linearly between the two bracketing keys and aligns the start down to a
//! packet boundary.

use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use tscut_models::timestamp::{clip_file_name, round_pts_key};
use tscut_models::{Clip, PtsMap, TS_PACKET_SIZE};

use crate::error::{MediaError, MediaResult};
use crate::metrics;
use crate::progress::CopyProgress;

/// Default copy chunk (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Round a byte offset down to a transport-stream packet boundary.
pub fn align_to_packet(pos: u64) -> u64 {
    pos - pos % TS_PACKET_SIZE
}

/// Byte window of a sub-range extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub length: u64,
}

/// Interpolate the byte range of `[start, end]` seconds from the map.
pub fn range_bytes(map: &PtsMap, start: f64, end: f64) -> MediaResult<ByteRange> {
    let out_of_bounds = || MediaError::RangeOutOfBounds { start, end };
    if !(start.is_finite() && end.is_finite() && start < end) {
        return Err(out_of_bounds());
    }

    let (lower, upper) = map.bracket(start, end).ok_or_else(out_of_bounds)?;
    let (start_key, start_entry) = map.at(lower).ok_or_else(out_of_bounds)?;
    let (end_key, end_entry) = map.at(upper).ok_or_else(out_of_bounds)?;

    let base = start_entry.next_start_pos as f64;
    let ratio = (end_entry.prev_end_pos as f64 - base) / (end_key - start_key);
    let start_pos = (base + (start - start_key) * ratio).round().max(0.0) as u64;
    let length = ((end - start) * ratio).round().max(0.0) as u64;

    debug!(start_key, end_key, ratio, start_pos, length, "Interpolated byte range");
    Ok(ByteRange {
        start: align_to_packet(start_pos),
        length,
    })
}

/// Copies byte ranges of one source file.
#[derive(Debug, Clone)]
pub struct Splitter {
    source: PathBuf,
    chunk_size: usize,
}

impl Splitter {
    pub fn new(source: impl AsRef<Path>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the copy chunk size; zero falls back to the default.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Copy `length` bytes from `start` into `sink`.
    ///
    /// Stops early at end of file. Returns the number of bytes written.
    pub async fn copy_part<W, F>(
        &self,
        start: u64,
        length: u64,
        sink: &mut W,
        progress: &mut CopyProgress,
        progress_callback: &mut F,
    ) -> MediaResult<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
        F: FnMut(CopyProgress),
    {
        let mut file = File::open(&self.source).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => MediaError::FileNotFound(self.source.clone()),
            _ => MediaError::Io(e),
        })?;
        file.seek(SeekFrom::Start(start)).await?;

        let mut buf = vec![0u8; self.chunk_size];
        let mut remaining = length;
        while remaining > 0 {
            let want = remaining.min(buf.len() as u64) as usize;
            let n = file.read(&mut buf[..want]).await?;
            if n == 0 {
                debug!(start, length, remaining, "Source ended before range end");
                break;
            }
            sink.write_all(&buf[..n]).await?;
            remaining -= n as u64;
            progress.advance(n as u64);
            progress_callback(*progress);
        }

        let copied = length - remaining;
        metrics::record_bytes_copied(copied);
        Ok(copied)
    }

    /// Write every clip of `map` into `output_dir`, one file per clip.
    ///
    /// The directory is removed and recreated first. Returns the written
    /// paths in clip order.
    pub async fn split<F>(
        &self,
        map: &PtsMap,
        output_dir: &Path,
        mut progress_callback: F,
    ) -> MediaResult<Vec<PathBuf>>
    where
        F: FnMut(CopyProgress),
    {
        match tokio::fs::remove_dir_all(output_dir).await {
            Ok(()) => debug!(dir = %output_dir.display(), "Removed previous output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tokio::fs::create_dir_all(output_dir).await?;

        let clips = map.clips();
        let mut progress = CopyProgress::new(clips.iter().map(Clip::byte_len).sum());
        let mut written = Vec::with_capacity(clips.len());

        for clip in &clips {
            let path = output_dir.join(clip_file_name(clip.start, clip.end));
            let mut file = File::create(&path).await?;
            let copied = self
                .copy_part(
                    clip.start_pos,
                    clip.byte_len(),
                    &mut file,
                    &mut progress,
                    &mut progress_callback,
                )
                .await?;
            file.flush().await?;
            debug!(path = %path.display(), bytes = copied, "Wrote clip");
            written.push(path);
        }

        info!(
            dir = %output_dir.display(),
            clips = written.len(),
            bytes = progress.copied,
            "Split complete"
        );
        Ok(written)
    }

    /// Stream the bytes of `[start, end]` seconds into `sink`, then close it.
    ///
    /// A consumer that closes the sink early ends the copy without error.
    pub async fn extract_range_to<W, F>(
        &self,
        map: &PtsMap,
        start: f64,
        end: f64,
        sink: &mut W,
        mut progress_callback: F,
    ) -> MediaResult<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
        F: FnMut(CopyProgress),
    {
        let range = range_bytes(map, start, end)?;
        info!(start, end, byte_start = range.start, bytes = range.length, "Extracting range");

        let mut progress = CopyProgress::new(range.length);
        let result = self
            .copy_part(range.start, range.length, sink, &mut progress, &mut progress_callback)
            .await;
        finish_sink(sink, result.map(|_| ()), progress.copied).await
    }

    /// Concatenate the clips starting at `clip_starts` into `sink`, then close it.
    pub async fn extract_clips_to<W, F>(
        &self,
        map: &PtsMap,
        clip_starts: &[f64],
        sink: &mut W,
        mut progress_callback: F,
    ) -> MediaResult<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
        F: FnMut(CopyProgress),
    {
        let clips = map.clips();
        let selected = clip_starts
            .iter()
            .map(|&key| {
                clips
                    .iter()
                    .find(|c| round_pts_key(c.start) == round_pts_key(key))
                    .copied()
                    .ok_or(MediaError::UnknownClip(key))
            })
            .collect::<MediaResult<Vec<Clip>>>()?;

        let mut progress = CopyProgress::new(selected.iter().map(Clip::byte_len).sum());
        info!(clips = selected.len(), bytes = progress.total, "Extracting clips");

        let mut result = Ok(());
        for clip in &selected {
            result = self
                .copy_part(
                    clip.start_pos,
                    clip.byte_len(),
                    sink,
                    &mut progress,
                    &mut progress_callback,
                )
                .await
                .map(|_| ());
            if result.is_err() {
                break;
            }
        }
        finish_sink(sink, result, progress.copied).await
    }
}

/// Close `sink` after a copy; a broken pipe on either side is a normal end.
///
/// `copied` counts the chunks fully written before the copy stopped.
async fn finish_sink<W>(sink: &mut W, result: MediaResult<()>, copied: u64) -> MediaResult<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    match result {
        Ok(()) => {}
        Err(MediaError::Io(e)) if e.kind() == ErrorKind::BrokenPipe => {
            info!(bytes = copied, "Output closed by reader");
            return Ok(copied);
        }
        Err(e) => return Err(e),
    }

    match sink.shutdown().await {
        Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(copied),
        Err(e) => Err(e.into()),
        Ok(()) => Ok(copied),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tscut_models::PtsMapEntry;

    const SIZE: u64 = 400_000;

    fn entry(pts: f64, prev_end_pos: u64, next_start_pos: u64) -> PtsMapEntry {
        PtsMapEntry {
            prev_end_pts: pts - 0.5,
            prev_end_pos,
            next_start_pts: pts + 0.5,
            next_start_pos,
            ..PtsMapEntry::stream_start()
        }
    }

    fn three_key_map() -> PtsMap {
        PtsMap::from_entries(vec![
            (0.0, PtsMapEntry::stream_start()),
            (120.0, entry(120.0, 53_016, 53_580)),
            (900.0, PtsMapEntry::stream_end(900.0, SIZE)),
        ])
        .unwrap()
    }

    fn source_file(dir: &Path) -> PathBuf {
        let path = dir.join("source.ts");
        let bytes: Vec<u8> = (0..SIZE).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_align_to_packet() {
        assert_eq!(align_to_packet(0), 0);
        assert_eq!(align_to_packet(187), 0);
        assert_eq!(align_to_packet(188), 188);
        assert_eq!(align_to_packet(25_778), 25_756);
    }

    #[test]
    fn test_range_bytes_is_packet_aligned() {
        let range = range_bytes(&three_key_map(), 58.0, 130.0).unwrap();
        assert_eq!(range.start % TS_PACKET_SIZE, 0);
        assert_eq!(range.start, 25_756);
        assert_eq!(range.length, 32_000);
    }

    #[test]
    fn test_range_bytes_out_of_bounds() {
        let map = three_key_map();
        assert!(matches!(
            range_bytes(&map, 100.0, 950.0),
            Err(MediaError::RangeOutOfBounds { .. })
        ));
        assert!(matches!(
            range_bytes(&map, 130.0, 58.0),
            Err(MediaError::RangeOutOfBounds { .. })
        ));
    }

    #[tokio::test]
    async fn test_copy_part_stops_at_eof() {
        let dir = tempfile::tempdir().unwrap();
        let splitter = Splitter::new(source_file(dir.path())).with_chunk_size(4096);

        let mut sink = Vec::new();
        let mut progress = CopyProgress::new(1000);
        let mut updates = 0;
        let copied = splitter
            .copy_part(SIZE - 600, 1000, &mut sink, &mut progress, &mut |_| updates += 1)
            .await
            .unwrap();
        assert_eq!(copied, 600);
        assert_eq!(sink.len(), 600);
        assert_eq!(sink[0], ((SIZE - 600) % 251) as u8);
        assert!(updates >= 1);
    }

    #[tokio::test]
    async fn test_copy_part_missing_source() {
        let splitter = Splitter::new("/nonexistent/source.ts");
        let mut sink = Vec::new();
        let result = splitter
            .copy_part(0, 10, &mut sink, &mut CopyProgress::new(10), &mut |_| {})
            .await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_split_writes_one_file_per_clip() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let out = dir.path().join("source");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("stale.ts"), b"old").unwrap();

        let splitter = Splitter::new(&source).with_chunk_size(10_000);
        let paths = splitter.split(&three_key_map(), &out, |_| {}).await.unwrap();

        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["0000.000-0120.000.ts", "0120.000-0900.000.ts"]);
        assert!(!out.join("stale.ts").exists());

        let all = std::fs::read(&source).unwrap();
        assert_eq!(std::fs::read(&paths[0]).unwrap(), all[..53_016]);
        assert_eq!(std::fs::read(&paths[1]).unwrap(), all[53_580..]);
    }

    #[tokio::test]
    async fn test_extract_range_to_sink() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let splitter = Splitter::new(&source);

        let mut sink = Vec::new();
        let mut last = CopyProgress::default();
        let copied = splitter
            .extract_range_to(&three_key_map(), 58.0, 130.0, &mut sink, |p| last = p)
            .await
            .unwrap();

        let all = std::fs::read(&source).unwrap();
        assert_eq!(copied, 32_000);
        assert_eq!(sink, all[25_756..25_756 + 32_000]);
        assert!(last.is_complete());
    }

    #[tokio::test]
    async fn test_extract_clips_to_sink() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let splitter = Splitter::new(&source);
        let map = three_key_map();

        let mut sink = Vec::new();
        let copied = splitter
            .extract_clips_to(&map, &[120.0, 0.0], &mut sink, |_| {})
            .await
            .unwrap();
        let all = std::fs::read(&source).unwrap();
        assert_eq!(copied, SIZE - 53_580 + 53_016);
        assert_eq!(sink[..SIZE as usize - 53_580], all[53_580..]);

        let result = splitter.extract_clips_to(&map, &[60.0], &mut Vec::new(), |_| {}).await;
        assert!(matches!(result, Err(MediaError::UnknownClip(_))));
    }

    /// Sink that accepts `limit` bytes and then reports a closed pipe.
    struct ClosingSink {
        limit: usize,
        received: usize,
    }

    impl AsyncWrite for ClosingSink {
        fn poll_write(
            mut self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            if self.received >= self.limit {
                return std::task::Poll::Ready(Err(std::io::Error::from(ErrorKind::BrokenPipe)));
            }
            let n = buf.len().min(self.limit - self.received);
            self.received += n;
            std::task::Poll::Ready(Ok(n))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::from(ErrorKind::BrokenPipe)))
        }
    }

    #[tokio::test]
    async fn test_broken_pipe_is_normal_termination() {
        let dir = tempfile::tempdir().unwrap();
        let splitter = Splitter::new(source_file(dir.path())).with_chunk_size(1024);
        let mut sink = ClosingSink {
            limit: 5000,
            received: 0,
        };

        let copied = splitter
            .extract_range_to(&three_key_map(), 58.0, 130.0, &mut sink, |_| {})
            .await
            .unwrap();
        assert_eq!(sink.received, 5000);
        // four whole 1024-byte chunks went through before the pipe closed
        assert_eq!(copied, 4096);
    }
}
