//! FLV tag reader.
//!
//! Reads tags strictly in file order. The preamble is validated on open, after which each
//! [`FlvReader::read_tag`] call consumes exactly one framed tag. End of data is signalled by
//! [`FlvReader::is_finished`], checked against the file size captured at open.
//!
//! ## Example
//!
//! ```no_run
//! use flvfile::FlvReader;
//!
//! let mut reader = FlvReader::open("input.flv").unwrap();
//! println!("duration: {}s", reader.duration());
//!
//! while !reader.is_finished() {
//!     let (header, data) = reader.read_tag().unwrap();
//!     println!("type={} ts={}ms size={}",
//!              header.tag_type.as_u8(), header.timestamp_ms(), data.len());
//! }
//! ```

use crate::amf::AmfValue;
use crate::error::{FlvError, Result};
use crate::header::{FlvHeader, Preamble, HEADER_LEN};
use crate::session::ReadState;
use crate::tag::{read_previous_tag_size, FlvTag, TagHeader, TAG_HEADER_SIZE};

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// FLV reader configuration.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Check every previous-tag-size trailer against the tag it follows.
    pub verify_previous_tag_size: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            verify_previous_tag_size: true,
        }
    }
}

impl ReaderConfig {
    /// Create a new reader configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether trailers are verified.
    pub fn with_verify_previous_tag_size(mut self, verify: bool) -> Self {
        self.verify_previous_tag_size = verify;
        self
    }
}

/// FLV read session.
pub struct FlvReader<R: Read + Seek> {
    reader: R,
    config: ReaderConfig,
    path: Option<PathBuf>,
    preamble: Preamble,
    state: ReadState,
}

impl FlvReader<File> {
    /// Open an existing file read-only and validate its preamble.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, ReaderConfig::default())
    }

    /// Open an existing file using the given configuration.
    pub fn open_with_config(path: impl AsRef<Path>, config: ReaderConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = Self::new(file, config)?;
        reader.path = Some(path.to_path_buf());
        debug!(path = %path.display(), size = reader.size(), "Opened FLV file");
        Ok(reader)
    }
}

impl<R: Read + Seek> FlvReader<R> {
    /// Start a read session on `reader`.
    ///
    /// Captures the total size, then reads the preamble from offset 0. Fails with
    /// [`FlvError::InvalidSignature`] without reading further if the data is not FLV.
    pub fn new(mut reader: R, config: ReaderConfig) -> Result<Self> {
        let size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let preamble = Preamble::read(&mut reader)?;

        Ok(Self {
            reader,
            config,
            path: None,
            preamble,
            state: ReadState {
                size,
                data_start: HEADER_LEN as u64,
            },
        })
    }

    /// Read the next tag header and payload.
    ///
    /// A stream truncated mid-tag fails with [`FlvError::UnexpectedEnd`] carrying the offset
    /// the tag started at.
    pub fn read_tag(&mut self) -> Result<(TagHeader, Vec<u8>)> {
        let offset = self.reader.stream_position()?;
        self.read_tag_at(offset).map_err(|e| e.at_offset(offset))
    }

    fn read_tag_at(&mut self, offset: u64) -> Result<(TagHeader, Vec<u8>)> {
        let header = TagHeader::parse(&mut self.reader)?;

        let mut data = Vec::new();
        let read = (&mut self.reader)
            .take(header.data_size as u64)
            .read_to_end(&mut data)?;
        if read != header.data_size as usize {
            return Err(FlvError::UnexpectedEnd { offset });
        }

        let prev_tag_size = read_previous_tag_size(&mut self.reader)?;
        if self.config.verify_previous_tag_size && prev_tag_size != header.previous_tag_size() {
            let trailer_offset = offset + TAG_HEADER_SIZE as u64 + header.data_size as u64;
            warn!(
                offset = trailer_offset,
                expected = header.previous_tag_size(),
                actual = prev_tag_size,
                "Previous tag size mismatch"
            );
            return Err(FlvError::PreviousTagSizeMismatch {
                offset: trailer_offset,
                expected: header.previous_tag_size(),
                actual: prev_tag_size,
            });
        }

        trace!(
            offset,
            tag_type = header.tag_type.as_u8(),
            size = header.data_size,
            timestamp_ms = header.timestamp_ms(),
            "Read tag"
        );
        Ok((header, data))
    }

    /// Read the next tag, or `None` once the end of the data is reached.
    pub fn next_tag(&mut self) -> Result<Option<FlvTag>> {
        if self.is_finished() {
            return Ok(None);
        }
        let (header, data) = self.read_tag()?;
        Ok(Some(FlvTag { header, data }))
    }

    /// Whether the position is at or past the size captured at open.
    ///
    /// Also true when the position cannot be determined.
    pub fn is_finished(&mut self) -> bool {
        match self.reader.stream_position() {
            Ok(position) => self.state.is_finished_at(position),
            Err(_) => true,
        }
    }

    /// Rewind to the first tag, for replaying the file from the start.
    pub fn loop_back(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(self.state.data_start))?;
        debug!("Looped back to first tag");
        Ok(())
    }

    /// Declared duration in seconds, as patched by the writer.
    pub fn duration(&self) -> f64 {
        self.preamble.duration()
    }

    /// The onMetaData properties stored in the preamble.
    pub fn metadata(&self) -> Result<HashMap<String, AmfValue>> {
        self.preamble.metadata()
    }

    /// The FLV file header.
    pub fn header(&self) -> FlvHeader {
        self.preamble.header()
    }

    /// Total file size captured at open.
    pub fn size(&self) -> u64 {
        self.state.size
    }

    /// Path the file was opened from, for readers made with [`FlvReader::open`].
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Release the underlying storage.
    pub fn close(self) {
        debug!(size = self.state.size, "Closed FLV reader");
    }

    /// Get the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
