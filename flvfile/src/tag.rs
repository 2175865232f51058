//! FLV tag framing.
//!
//! Each tag is an 11-byte header, the payload, and a 4-byte trailer holding the size of the
//! tag just written (`11 + data_size`):
//!
//! ```text
//! [type:1][data size:3][timestamp:3][timestamp ext:1][stream id:3][payload][prev tag size:4]
//! ```
//!
//! All multi-byte fields are big-endian. The timestamp extension byte holds bits 24..32 of
//! the millisecond timestamp and is always present, even when zero.

use crate::error::{FlvError, Result};
use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Audio tag type.
pub const TAG_TYPE_AUDIO: u8 = 8;

/// Video tag type.
pub const TAG_TYPE_VIDEO: u8 = 9;

/// Script data tag type.
pub const TAG_TYPE_SCRIPT_DATA: u8 = 18;

/// FLV tag header size.
pub const TAG_HEADER_SIZE: usize = 11;

/// Size of the previous-tag-size trailer.
pub const PREVIOUS_TAG_SIZE_LEN: usize = 4;

/// Maximum tag data size (16 MB - 1).
pub const MAX_TAG_DATA_SIZE: u32 = 0x00FF_FFFF;

/// FLV tag type.
///
/// Values other than audio, video and script data are reserved by the format but carried
/// through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagType {
    /// Audio data.
    Audio,
    /// Video data.
    Video,
    /// Script data (metadata, etc.).
    ScriptData,
    /// Any other type code.
    Other(u8),
}

impl TagType {
    /// Create a TagType from a raw byte value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            TAG_TYPE_AUDIO => Self::Audio,
            TAG_TYPE_VIDEO => Self::Video,
            TAG_TYPE_SCRIPT_DATA => Self::ScriptData,
            other => Self::Other(other),
        }
    }

    /// Convert to raw byte value.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Audio => TAG_TYPE_AUDIO,
            Self::Video => TAG_TYPE_VIDEO,
            Self::ScriptData => TAG_TYPE_SCRIPT_DATA,
            Self::Other(value) => value,
        }
    }

    /// Check if this is an audio tag.
    pub fn is_audio(self) -> bool {
        self == Self::Audio
    }

    /// Check if this is a video tag.
    pub fn is_video(self) -> bool {
        self == Self::Video
    }
}

impl From<u8> for TagType {
    fn from(value: u8) -> Self {
        Self::from_u8(value)
    }
}

impl From<TagType> for u8 {
    fn from(tag_type: TagType) -> u8 {
        tag_type.as_u8()
    }
}

/// FLV tag header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    /// Tag type.
    pub tag_type: TagType,
    /// Data size (not including header).
    pub data_size: u32,
    /// Timestamp in milliseconds (lower 24 bits).
    pub timestamp: u32,
    /// Timestamp extended (upper 8 bits).
    pub timestamp_extended: u8,
    /// Stream ID (always 0 when written).
    pub stream_id: u32,
}

impl TagHeader {
    /// Create a new tag header.
    ///
    /// Fails with [`FlvError::TagTooLarge`] when `data_size` does not fit in 24 bits.
    pub fn new(tag_type: TagType, data_size: usize, timestamp_ms: u32) -> Result<Self> {
        if data_size > MAX_TAG_DATA_SIZE as usize {
            return Err(FlvError::TagTooLarge(data_size));
        }
        Ok(Self {
            tag_type,
            data_size: data_size as u32,
            timestamp: timestamp_ms & 0x00FF_FFFF,
            timestamp_extended: (timestamp_ms >> 24) as u8,
            stream_id: 0,
        })
    }

    /// Get the full 32-bit timestamp.
    pub fn timestamp_ms(&self) -> u32 {
        ((self.timestamp_extended as u32) << 24) | self.timestamp
    }

    /// Value of the trailer that must follow this tag.
    pub fn previous_tag_size(&self) -> u32 {
        TAG_HEADER_SIZE as u32 + self.data_size
    }

    /// Get the total tag size including header and trailer.
    pub fn total_size(&self) -> u64 {
        (TAG_HEADER_SIZE + PREVIOUS_TAG_SIZE_LEN) as u64 + self.data_size as u64
    }

    /// Encode the header into its 11-byte wire form.
    pub fn encode(&self) -> [u8; TAG_HEADER_SIZE] {
        let mut buf = [0u8; TAG_HEADER_SIZE];
        buf[0] = self.tag_type.as_u8();
        BigEndian::write_u24(&mut buf[1..4], self.data_size & MAX_TAG_DATA_SIZE);
        BigEndian::write_u24(&mut buf[4..7], self.timestamp & 0x00FF_FFFF);
        buf[7] = self.timestamp_extended;
        BigEndian::write_u24(&mut buf[8..11], self.stream_id & 0x00FF_FFFF);
        buf
    }

    /// Parse a tag header from a reader.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let tag_type = TagType::from_u8(reader.read_u8()?);
        let data_size = reader.read_u24::<BigEndian>()?;
        let timestamp = reader.read_u24::<BigEndian>()?;
        let timestamp_extended = reader.read_u8()?;
        let stream_id = reader.read_u24::<BigEndian>()?;

        Ok(Self {
            tag_type,
            data_size,
            timestamp,
            timestamp_extended,
            stream_id,
        })
    }

    /// Write the tag header to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<usize> {
        writer.write_all(&self.encode())?;
        Ok(TAG_HEADER_SIZE)
    }
}

/// A complete FLV tag including header and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlvTag {
    /// Tag header.
    pub header: TagHeader,
    /// Tag data.
    pub data: Vec<u8>,
}

impl FlvTag {
    /// Get the tag type.
    pub fn tag_type(&self) -> TagType {
        self.header.tag_type
    }

    /// Get the timestamp in milliseconds.
    pub fn timestamp_ms(&self) -> u32 {
        self.header.timestamp_ms()
    }

    /// Check if this is an audio tag.
    pub fn is_audio(&self) -> bool {
        self.header.tag_type.is_audio()
    }

    /// Check if this is a video tag.
    pub fn is_video(&self) -> bool {
        self.header.tag_type.is_video()
    }
}

/// Read the previous tag size from a reader.
pub fn read_previous_tag_size<R: Read>(reader: &mut R) -> Result<u32> {
    Ok(reader.read_u32::<BigEndian>()?)
}

/// Write a previous tag size to a writer.
pub fn write_previous_tag_size<W: Write>(writer: &mut W, size: u32) -> Result<()> {
    writer.write_u32::<BigEndian>(size)?;
    Ok(())
}
