//! # flvfile
//!
//! Sequential FLV (Flash Video) tag files: append timestamped audio/video payloads to a
//! growing file while tracking its duration, or read them back tag by tag.
//!
//! Payloads are opaque; this crate only frames them. The parts with invariants are:
//!
//! - **Tag framing**: type, 24-bit size, 24-bit timestamp plus extension byte, zero stream
//!   id, payload, and a trailer equal to `11 + size`.
//! - **Timestamps on write**: never regress (earlier inputs are clamped to the last one
//!   seen) and start at zero (the first input becomes the baseline).
//! - **Duration**: the largest rebased timestamp, in seconds, patched into the preamble's
//!   onMetaData tag by [`FlvWriter::finalize`].
//!
//! ## Example: writing
//!
//! ```no_run
//! use flvfile::FlvWriter;
//!
//! let mut writer = FlvWriter::create("a.flv").unwrap();
//! writer.write_video_tag(&[0x17, 0x01, 0x00, 0x00, 0x00], 1000).unwrap();
//! writer.write_audio_tag(&[0xAF, 0x01], 1020).unwrap();
//! writer.finalize().unwrap();
//! writer.close().unwrap();
//! ```
//!
//! ## Example: reading
//!
//! ```no_run
//! use flvfile::FlvReader;
//!
//! let mut reader = FlvReader::open("a.flv").unwrap();
//! while let Some(tag) = reader.next_tag().unwrap() {
//!     println!("{:?} at {}ms, {} bytes", tag.tag_type(), tag.timestamp_ms(), tag.data.len());
//! }
//! ```
//!
//! ## File Structure
//!
//! ```text
//! FLV File
//! ├── Preamble (68 bytes)
//! │   ├── Header: "FLV", version 1, flags, header size 9
//! │   ├── Previous Tag Size 0
//! │   ├── onMetaData script tag { duration: f64 }   <- duration at byte 53
//! │   └── Previous Tag Size 51
//! └── Tags (repeating)
//!     ├── Tag Header (11 bytes)
//!     │   ├── Tag type (8=audio, 9=video, 18=script)
//!     │   ├── Data size (3 bytes)
//!     │   ├── Timestamp (3 bytes + 1 extended)
//!     │   └── Stream ID (3 bytes, always 0)
//!     ├── Tag Data
//!     └── Previous Tag Size (4 bytes)
//! ```
//!
//! Sessions are single-threaded and blocking. Each one owns its storage exclusively;
//! `close` consumes it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod amf;
pub mod error;
pub mod header;
pub mod reader;
pub mod session;
pub mod storage;
pub mod tag;
pub mod writer;

pub use amf::AmfValue;
pub use error::{ErrorKind, FlvError, Result};
pub use header::{
    is_flv_signature, FlvHeader, Preamble, DURATION_OFFSET, FLV_HEADER_SIZE, FLV_SIGNATURE,
    HEADER_LEN,
};
pub use reader::{FlvReader, ReaderConfig};
pub use session::TimestampTracker;
pub use storage::Storage;
pub use tag::{
    FlvTag, TagHeader, TagType, MAX_TAG_DATA_SIZE, TAG_HEADER_SIZE, TAG_TYPE_AUDIO,
    TAG_TYPE_SCRIPT_DATA, TAG_TYPE_VIDEO,
};
pub use writer::{FlvWriter, WriterConfig};

/// FLV time base (milliseconds).
pub const FLV_TIME_BASE_MS: u32 = 1000;
