//! FLV tag writer.
//!
//! A writer owns its storage for its whole lifetime. Creating one writes the fixed preamble;
//! every `write_*` call appends exactly one framed tag; [`FlvWriter::finalize`] patches the
//! declared duration in place and flushes to durable storage.
//!
//! ## Example
//!
//! ```no_run
//! use flvfile::FlvWriter;
//!
//! let mut writer = FlvWriter::create("output.flv").unwrap();
//! writer.write_video_tag(&[0x17, 0x01, 0x00, 0x00, 0x00], 1000).unwrap();
//! writer.write_audio_tag(&[0xAF, 0x01], 1023).unwrap();
//! writer.finalize().unwrap();
//! writer.close().unwrap();
//! ```

use crate::error::{FlvError, Result};
use crate::header::{FlvHeader, Preamble, DURATION_OFFSET, HEADER_LEN};
use crate::session::TimestampTracker;
use crate::storage::Storage;
use crate::tag::{write_previous_tag_size, TagHeader, TagType, MAX_TAG_DATA_SIZE};

use byteorder::{BigEndian, WriteBytesExt};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// FLV writer configuration.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Advertise audio in the header flags.
    pub has_audio: bool,
    /// Advertise video in the header flags.
    pub has_video: bool,
    /// Flush the preamble to durable storage before returning from creation.
    pub sync_on_create: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            has_audio: true,
            has_video: true,
            sync_on_create: true,
        }
    }
}

impl WriterConfig {
    /// Create a new writer configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the header advertises audio.
    pub fn with_audio(mut self, has_audio: bool) -> Self {
        self.has_audio = has_audio;
        self
    }

    /// Set whether the header advertises video.
    pub fn with_video(mut self, has_video: bool) -> Self {
        self.has_video = has_video;
        self
    }

    /// Set whether creation waits for the preamble to reach durable storage.
    pub fn with_sync_on_create(mut self, sync: bool) -> Self {
        self.sync_on_create = sync;
        self
    }
}

/// FLV write session.
pub struct FlvWriter<S: Storage> {
    /// Output storage.
    storage: S,
    /// Path the storage was created at, if any.
    path: Option<PathBuf>,
    /// Timestamp baseline, clamping and duration.
    timestamps: TimestampTracker,
    /// Bytes written, preamble included.
    bytes_written: u64,
    /// Tags appended after the preamble.
    tag_count: u64,
}

impl FlvWriter<File> {
    /// Create (or truncate) the file at `path` and write the preamble.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with_config(path, WriterConfig::default())
    }

    /// Create the file at `path` using the given configuration.
    pub fn create_with_config(path: impl AsRef<Path>, config: WriterConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = Self::new(file, config)?;
        writer.path = Some(path.to_path_buf());
        debug!(path = %path.display(), "Created FLV file");
        Ok(writer)
    }
}

impl<S: Storage> FlvWriter<S> {
    /// Start a write session on `storage`, writing the preamble at its current position.
    ///
    /// The storage is expected to be empty; finalize patches the duration at an absolute
    /// offset.
    pub fn new(mut storage: S, config: WriterConfig) -> Result<Self> {
        let header = FlvHeader::new(config.has_audio, config.has_video);
        let preamble = Preamble::new(&header, 0.0)?;
        storage.write_all(preamble.as_bytes())?;

        if config.sync_on_create {
            storage.sync_durable()?;
        }

        Ok(Self {
            storage,
            path: None,
            timestamps: TimestampTracker::new(),
            bytes_written: HEADER_LEN as u64,
            tag_count: 0,
        })
    }

    /// Append an audio tag.
    pub fn write_audio_tag(&mut self, data: &[u8], timestamp_ms: u32) -> Result<()> {
        self.write_tag(data, TagType::Audio, timestamp_ms)
    }

    /// Append a video tag.
    pub fn write_video_tag(&mut self, data: &[u8], timestamp_ms: u32) -> Result<()> {
        self.write_tag(data, TagType::Video, timestamp_ms)
    }

    /// Append a script data tag.
    pub fn write_script_tag(&mut self, data: &[u8], timestamp_ms: u32) -> Result<()> {
        self.write_tag(data, TagType::ScriptData, timestamp_ms)
    }

    /// Append one framed tag.
    ///
    /// The timestamp written is clamped to never go below the previous input and rebased so
    /// the first tag is at zero; callers must not assume it equals `timestamp_ms`.
    /// A payload over 16 MiB - 1 fails with
    /// [`FlvError::TagTooLarge`](crate::FlvError::TagTooLarge) before anything is written.
    /// An I/O failure partway through leaves a truncated tag at the end of the file.
    pub fn write_tag(&mut self, data: &[u8], tag_type: TagType, timestamp_ms: u32) -> Result<()> {
        if data.len() > MAX_TAG_DATA_SIZE as usize {
            return Err(FlvError::TagTooLarge(data.len()));
        }
        let encoded = self.timestamps.advance(timestamp_ms);
        let header = TagHeader::new(tag_type, data.len(), encoded)?;

        header.write(&mut self.storage)?;
        self.storage.write_all(data)?;
        write_previous_tag_size(&mut self.storage, header.previous_tag_size())?;

        self.bytes_written += header.total_size();
        self.tag_count += 1;
        trace!(
            tag_type = header.tag_type.as_u8(),
            size = data.len(),
            timestamp_ms = encoded,
            "Wrote tag"
        );

        Ok(())
    }

    /// Override the tracked duration, in seconds.
    ///
    /// The next [`finalize`](Self::finalize) persists this value.
    pub fn set_duration(&mut self, seconds: f64) {
        self.timestamps.set_duration(seconds);
    }

    /// Patch the duration into the preamble and flush to durable storage.
    ///
    /// Safe to call any number of times; writing continues at the end of the file.
    pub fn finalize(&mut self) -> Result<()> {
        let duration = self.timestamps.duration();
        self.storage.seek(SeekFrom::Start(DURATION_OFFSET))?;
        self.storage.write_f64::<BigEndian>(duration)?;
        self.storage.seek(SeekFrom::End(0))?;
        self.storage.sync_durable()?;

        debug!(duration, tags = self.tag_count, "Finalized FLV duration");
        Ok(())
    }

    /// Alias for [`finalize`](Self::finalize).
    pub fn sync(&mut self) -> Result<()> {
        self.finalize()
    }

    /// Flush and release the storage.
    ///
    /// Does not patch the duration; call [`finalize`](Self::finalize) first for that.
    pub fn close(mut self) -> Result<()> {
        self.storage.flush()?;
        debug!(bytes = self.bytes_written, tags = self.tag_count, "Closed FLV writer");
        Ok(())
    }

    /// Tracked duration in seconds.
    pub fn duration(&self) -> f64 {
        self.timestamps.duration()
    }

    /// Last input timestamp accepted, before rebasing.
    pub fn last_timestamp(&self) -> u32 {
        self.timestamps.last_timestamp()
    }

    /// Path the file was created at, for writers made with [`FlvWriter::create`].
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current file size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes_written
    }

    /// Number of tags written after the preamble.
    pub fn tag_count(&self) -> u64 {
        self.tag_count
    }

    /// Get a reference to the underlying storage.
    pub fn get_ref(&self) -> &S {
        &self.storage
    }

    /// Get the underlying storage.
    pub fn into_inner(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::TAG_HEADER_SIZE;
    use std::io::Cursor;

    fn memory_writer() -> FlvWriter<Cursor<Vec<u8>>> {
        FlvWriter::new(Cursor::new(Vec::new()), WriterConfig::default()).unwrap()
    }

    #[test]
    fn test_writer_config() {
        let config = WriterConfig::new()
            .with_audio(false)
            .with_video(true)
            .with_sync_on_create(false);

        assert!(!config.has_audio);
        assert!(config.has_video);
        assert!(!config.sync_on_create);
    }

    #[test]
    fn test_new_writes_preamble() {
        let writer = memory_writer();
        let buffer = writer.into_inner().into_inner();

        assert_eq!(buffer.len(), HEADER_LEN);
        assert_eq!(&buffer[0..3], b"FLV");
        assert_eq!(buffer[4], 0x05);
    }

    #[test]
    fn test_header_flags_from_config() {
        let config = WriterConfig::new().with_audio(false);
        let writer = FlvWriter::new(Cursor::new(Vec::new()), config).unwrap();
        assert_eq!(writer.into_inner().into_inner()[4], 0x01);
    }

    #[test]
    fn test_tag_bytes() {
        let mut writer = memory_writer();
        writer.write_audio_tag(&[0xAF, 0x01], 2000).unwrap();
        writer.write_audio_tag(&[0xAF, 0x01, 0x21], 2100).unwrap();
        let buffer = writer.into_inner().into_inner();

        let first = &buffer[HEADER_LEN..];
        assert_eq!(&first[..TAG_HEADER_SIZE], &[8, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&first[11..13], &[0xAF, 0x01]);
        assert_eq!(&first[13..17], &[0, 0, 0, 13]);

        let second = &first[17..];
        // 100 ms after the baseline
        assert_eq!(&second[..TAG_HEADER_SIZE], &[8, 0, 0, 3, 0, 0, 100, 0, 0, 0, 0]);
        assert_eq!(&second[14..18], &[0, 0, 0, 14]);
        assert_eq!(second.len(), 18);
    }

    #[test]
    fn test_extended_timestamp_bytes() {
        let mut writer = memory_writer();
        writer.write_video_tag(&[], 0).unwrap();
        writer.write_video_tag(&[], 0x0100_0001).unwrap();
        let buffer = writer.into_inner().into_inner();

        let second = &buffer[HEADER_LEN + TAG_HEADER_SIZE + 4..];
        assert_eq!(&second[4..8], &[0x00, 0x00, 0x01, 0x01]);
    }

    #[test]
    fn test_tracks_size_and_count() {
        let mut writer = memory_writer();
        writer.write_video_tag(&[0u8; 9], 0).unwrap();
        writer.write_script_tag(&[0u8; 4], 0).unwrap();

        assert_eq!(writer.tag_count(), 2);
        assert_eq!(writer.size(), HEADER_LEN as u64 + (11 + 9 + 4) + (11 + 4 + 4));
        assert_eq!(writer.size(), writer.get_ref().get_ref().len() as u64);
        assert_eq!(writer.path(), None);
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let mut writer = memory_writer();
        let data = vec![0u8; MAX_TAG_DATA_SIZE as usize + 1];

        let result = writer.write_video_tag(&data, 5000);
        assert_eq!(result, Err(FlvError::TagTooLarge(data.len())));
        assert_eq!(writer.tag_count(), 0);
        assert_eq!(writer.last_timestamp(), 0);
        assert_eq!(writer.into_inner().into_inner().len(), HEADER_LEN);
    }

    #[test]
    fn test_finalize_patches_duration() {
        let mut writer = memory_writer();
        writer.write_video_tag(&[1], 10_000).unwrap();
        writer.write_video_tag(&[2], 12_500).unwrap();
        writer.finalize().unwrap();
        writer.write_video_tag(&[3], 13_000).unwrap();
        writer.finalize().unwrap();
        assert_eq!(writer.duration(), 3.0);

        let buffer = writer.into_inner().into_inner();
        let start = DURATION_OFFSET as usize;
        assert_eq!(&buffer[start..start + 8], &3.0f64.to_be_bytes());
        // Appends continued after the first finalize
        assert_eq!(buffer.len(), HEADER_LEN + 3 * (11 + 1 + 4));
        assert_eq!(buffer[buffer.len() - 5], 3);
    }

    #[test]
    fn test_set_duration_is_persisted() {
        let mut writer = memory_writer();
        writer.write_audio_tag(&[0xAF], 0).unwrap();
        writer.set_duration(61.5);
        writer.sync().unwrap();

        let buffer = writer.into_inner().into_inner();
        let start = DURATION_OFFSET as usize;
        assert_eq!(&buffer[start..start + 8], &61.5f64.to_be_bytes());
    }
}
