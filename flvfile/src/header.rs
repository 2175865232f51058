//! FLV file header and the fixed preamble written at the start of every file.
//!
//! The FLV header is the first 9 bytes of an FLV file:
//! - Signature: "FLV" (3 bytes)
//! - Version: 1 (1 byte)
//! - Flags: audio/video presence (1 byte)
//! - Header size: 9 (4 bytes, big-endian)
//!
//! Files created by this crate follow it with a zero previous-tag-size and an onMetaData
//! script tag holding only `duration`. The whole block is [`HEADER_LEN`] bytes and the
//! duration number always sits at [`DURATION_OFFSET`], so it can be patched in place.
//!
//! ```text
//!  0  "FLV" | version | flags | header size (9)
//!  9  previous tag size (0)
//! 13  script tag header (type 18, size 40)
//! 24  "onMetaData" | ECMA array [ "duration": <f64 @ 53> ]
//! 64  previous tag size (51)
//! 68  first media tag
//! ```

use crate::amf::{parse_on_metadata, write_on_metadata, AmfValue};
use crate::error::{FlvError, Result};
use crate::tag::{write_previous_tag_size, TagHeader, TagType, PREVIOUS_TAG_SIZE_LEN};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use std::collections::HashMap;
use std::io::{Read, Write};

/// FLV file signature.
pub const FLV_SIGNATURE: &[u8; 3] = b"FLV";

/// Current FLV version.
pub const FLV_VERSION: u8 = 1;

/// Standard FLV header size.
pub const FLV_HEADER_SIZE: u32 = 9;

/// Flag indicating audio is present.
pub const FLV_FLAG_AUDIO: u8 = 0x04;

/// Flag indicating video is present.
pub const FLV_FLAG_VIDEO: u8 = 0x01;

/// Offset of the onMetaData tag header inside the preamble.
pub const METADATA_TAG_OFFSET: usize = FLV_HEADER_SIZE as usize + PREVIOUS_TAG_SIZE_LEN;

/// Total preamble length; the first media tag starts here.
pub const HEADER_LEN: usize = 68;

/// Offset of the big-endian f64 duration inside the preamble.
pub const DURATION_OFFSET: u64 = 53;

/// Size of the onMetaData payload in the preamble.
const METADATA_DATA_SIZE: usize = 40;

/// FLV file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlvHeader {
    /// FLV version.
    pub version: u8,
    /// Whether the file contains audio.
    pub has_audio: bool,
    /// Whether the file contains video.
    pub has_video: bool,
    /// Header size field.
    pub header_size: u32,
}

impl Default for FlvHeader {
    fn default() -> Self {
        Self {
            version: FLV_VERSION,
            has_audio: true,
            has_video: true,
            header_size: FLV_HEADER_SIZE,
        }
    }
}

impl FlvHeader {
    /// Create a header advertising the given streams.
    pub fn new(has_audio: bool, has_video: bool) -> Self {
        Self {
            has_audio,
            has_video,
            ..Self::default()
        }
    }

    /// Decode the 9-byte header. The signature is assumed to be checked already.
    fn decode(bytes: &[u8]) -> Self {
        let flags = bytes[4];
        Self {
            version: bytes[3],
            has_audio: (flags & FLV_FLAG_AUDIO) != 0,
            has_video: (flags & FLV_FLAG_VIDEO) != 0,
            header_size: BigEndian::read_u32(&bytes[5..9]),
        }
    }

    /// Write the FLV header to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<usize> {
        writer.write_all(FLV_SIGNATURE)?;
        writer.write_u8(self.version)?;
        writer.write_u8(self.flags())?;
        writer.write_u32::<BigEndian>(self.header_size)?;
        Ok(FLV_HEADER_SIZE as usize)
    }

    /// Get the flags byte.
    pub fn flags(&self) -> u8 {
        let mut flags = 0u8;
        if self.has_audio {
            flags |= FLV_FLAG_AUDIO;
        }
        if self.has_video {
            flags |= FLV_FLAG_VIDEO;
        }
        flags
    }
}

/// Check if data starts with a valid FLV signature.
pub fn is_flv_signature(data: &[u8]) -> bool {
    data.len() >= 3 && &data[0..3] == FLV_SIGNATURE
}

/// The fixed block at the start of a file: FLV header plus the onMetaData tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    bytes: [u8; HEADER_LEN],
}

impl Preamble {
    /// Build a preamble for a new file.
    pub fn new(header: &FlvHeader, duration: f64) -> Result<Self> {
        let mut buf = Vec::with_capacity(HEADER_LEN);
        header.write(&mut buf)?;
        write_previous_tag_size(&mut buf, 0)?;

        let tag = TagHeader::new(TagType::ScriptData, METADATA_DATA_SIZE, 0)?;
        tag.write(&mut buf)?;
        let mut properties = HashMap::with_capacity(1);
        properties.insert("duration".to_string(), AmfValue::Number(duration));
        write_on_metadata(&mut buf, properties)?;
        write_previous_tag_size(&mut buf, tag.previous_tag_size())?;

        let bytes: [u8; HEADER_LEN] = buf.try_into().map_err(|b: Vec<u8>| {
            FlvError::InvalidAmf(format!(
                "preamble encoded to {} bytes, expected {}",
                b.len(),
                HEADER_LEN
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Read and validate a preamble.
    ///
    /// The signature is read on its own first; on mismatch nothing else is read.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bytes = [0u8; HEADER_LEN];
        reader.read_exact(&mut bytes[..3])?;
        if !is_flv_signature(&bytes) {
            return Err(FlvError::InvalidSignature(
                String::from_utf8_lossy(&bytes[..3]).to_string(),
            ));
        }
        reader
            .read_exact(&mut bytes[3..])
            .map_err(|e| FlvError::from(e).at_offset(3))?;
        Ok(Self { bytes })
    }

    /// The parsed 9-byte FLV header.
    pub fn header(&self) -> FlvHeader {
        FlvHeader::decode(&self.bytes)
    }

    /// Duration in seconds stored at [`DURATION_OFFSET`].
    pub fn duration(&self) -> f64 {
        let start = DURATION_OFFSET as usize;
        BigEndian::read_f64(&self.bytes[start..start + 8])
    }

    /// Decode the onMetaData properties carried in the preamble.
    pub fn metadata(&self) -> Result<HashMap<String, AmfValue>> {
        let data_start = METADATA_TAG_OFFSET + crate::tag::TAG_HEADER_SIZE;
        parse_on_metadata(&self.bytes[data_start..HEADER_LEN - PREVIOUS_TAG_SIZE_LEN])
    }

    /// Raw preamble bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
