//! AMF0 encoding for the onMetaData script tag.
//!
//! The file preamble carries a single onMetaData event whose ECMA array holds the
//! `duration` number. Only the AMF0 types that show up in FLV metadata are supported.

use crate::error::{FlvError, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::{Read, Write};

/// Name of the script event holding stream metadata.
pub const ON_METADATA: &str = "onMetaData";

/// AMF0 type markers.
pub mod markers {
    /// Number type (f64).
    pub const NUMBER: u8 = 0x00;
    /// Boolean type.
    pub const BOOLEAN: u8 = 0x01;
    /// String type (short, max 65535 bytes).
    pub const STRING: u8 = 0x02;
    /// Object type.
    pub const OBJECT: u8 = 0x03;
    /// Null type.
    pub const NULL: u8 = 0x05;
    /// Undefined type.
    pub const UNDEFINED: u8 = 0x06;
    /// ECMA Array type (associative array).
    pub const ECMA_ARRAY: u8 = 0x08;
    /// Object end marker.
    pub const OBJECT_END: u8 = 0x09;
    /// Strict Array type.
    pub const STRICT_ARRAY: u8 = 0x0A;
    /// Long String type.
    pub const LONG_STRING: u8 = 0x0C;
}

/// AMF0 value.
#[derive(Debug, Clone, PartialEq)]
pub enum AmfValue {
    /// Number (f64).
    Number(f64),
    /// Boolean.
    Boolean(bool),
    /// String.
    String(String),
    /// Anonymous object.
    Object(HashMap<String, AmfValue>),
    /// Null.
    Null,
    /// Undefined.
    Undefined,
    /// ECMA Array (associative array).
    EcmaArray(HashMap<String, AmfValue>),
    /// Strict Array (indexed array).
    StrictArray(Vec<AmfValue>),
}

impl AmfValue {
    /// Get as a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as a boolean.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the properties of an object or ECMA array.
    pub fn as_object(&self) -> Option<&HashMap<String, AmfValue>> {
        match self {
            Self::Object(o) | Self::EcmaArray(o) => Some(o),
            _ => None,
        }
    }

    /// Parse an AMF0 value from a reader.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let marker = reader.read_u8()?;

        match marker {
            markers::NUMBER => Ok(Self::Number(reader.read_f64::<BigEndian>()?)),
            markers::BOOLEAN => Ok(Self::Boolean(reader.read_u8()? != 0)),
            markers::STRING => {
                let length = reader.read_u16::<BigEndian>()? as usize;
                Ok(Self::String(read_utf8(reader, length)?))
            }
            markers::LONG_STRING => {
                let length = reader.read_u32::<BigEndian>()? as usize;
                Ok(Self::String(read_utf8(reader, length)?))
            }
            markers::OBJECT => Ok(Self::Object(read_properties(reader)?)),
            markers::NULL => Ok(Self::Null),
            markers::UNDEFINED => Ok(Self::Undefined),
            markers::ECMA_ARRAY => {
                // Advisory count; the end marker terminates the array.
                let _count = reader.read_u32::<BigEndian>()?;
                Ok(Self::EcmaArray(read_properties(reader)?))
            }
            markers::STRICT_ARRAY => {
                let count = reader.read_u32::<BigEndian>()? as usize;
                // Each element takes at least one byte, cap the preallocation.
                let mut values = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    values.push(Self::parse(reader)?);
                }
                Ok(Self::StrictArray(values))
            }
            _ => Err(FlvError::InvalidAmfType(marker)),
        }
    }

    /// Write an AMF0 value, returning the number of bytes written.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<usize> {
        match self {
            Self::Number(value) => {
                writer.write_u8(markers::NUMBER)?;
                writer.write_f64::<BigEndian>(*value)?;
                Ok(9)
            }
            Self::Boolean(value) => {
                writer.write_u8(markers::BOOLEAN)?;
                writer.write_u8(u8::from(*value))?;
                Ok(2)
            }
            Self::String(value) if value.len() > u16::MAX as usize => {
                writer.write_u8(markers::LONG_STRING)?;
                writer.write_u32::<BigEndian>(value.len() as u32)?;
                writer.write_all(value.as_bytes())?;
                Ok(5 + value.len())
            }
            Self::String(value) => {
                writer.write_u8(markers::STRING)?;
                Ok(1 + write_key(writer, value)?)
            }
            Self::Object(properties) => {
                writer.write_u8(markers::OBJECT)?;
                Ok(1 + write_properties(writer, properties)?)
            }
            Self::Null => {
                writer.write_u8(markers::NULL)?;
                Ok(1)
            }
            Self::Undefined => {
                writer.write_u8(markers::UNDEFINED)?;
                Ok(1)
            }
            Self::EcmaArray(properties) => {
                writer.write_u8(markers::ECMA_ARRAY)?;
                writer.write_u32::<BigEndian>(properties.len() as u32)?;
                Ok(5 + write_properties(writer, properties)?)
            }
            Self::StrictArray(values) => {
                writer.write_u8(markers::STRICT_ARRAY)?;
                writer.write_u32::<BigEndian>(values.len() as u32)?;
                let mut size = 5;
                for value in values {
                    size += value.write(writer)?;
                }
                Ok(size)
            }
        }
    }
}

fn read_utf8<R: Read>(reader: &mut R, length: usize) -> Result<String> {
    let mut buffer = Vec::new();
    reader.take(length as u64).read_to_end(&mut buffer)?;
    if buffer.len() != length {
        return Err(FlvError::UnexpectedEnd { offset: 0 });
    }
    String::from_utf8(buffer).map_err(|e| FlvError::InvalidAmf(format!("Invalid UTF-8: {}", e)))
}

/// Write a short string body (length prefix, no marker).
fn write_key<W: Write>(writer: &mut W, value: &str) -> Result<usize> {
    if value.len() > u16::MAX as usize {
        return Err(FlvError::AmfStringTooLong(value.len()));
    }
    writer.write_u16::<BigEndian>(value.len() as u16)?;
    writer.write_all(value.as_bytes())?;
    Ok(2 + value.len())
}

fn read_properties<R: Read>(reader: &mut R) -> Result<HashMap<String, AmfValue>> {
    let mut properties = HashMap::new();

    loop {
        let length = reader.read_u16::<BigEndian>()? as usize;
        if length == 0 {
            let end_marker = reader.read_u8()?;
            if end_marker != markers::OBJECT_END {
                return Err(FlvError::InvalidAmf("Expected object end marker".to_string()));
            }
            break;
        }
        let key = read_utf8(reader, length)?;
        let value = AmfValue::parse(reader)?;
        properties.insert(key, value);
    }

    Ok(properties)
}

fn write_properties<W: Write>(
    writer: &mut W,
    properties: &HashMap<String, AmfValue>,
) -> Result<usize> {
    let mut size = 0;

    for (key, value) in properties {
        size += write_key(writer, key)?;
        size += value.write(writer)?;
    }

    writer.write_u16::<BigEndian>(0)?;
    writer.write_u8(markers::OBJECT_END)?;

    Ok(size + 3)
}

/// Encode an onMetaData script payload from a set of properties.
pub fn write_on_metadata<W: Write>(
    writer: &mut W,
    properties: HashMap<String, AmfValue>,
) -> Result<usize> {
    let event = AmfValue::String(ON_METADATA.to_string()).write(writer)?;
    let body = AmfValue::EcmaArray(properties).write(writer)?;
    Ok(event + body)
}

/// Parse onMetaData from script data.
pub fn parse_on_metadata(data: &[u8]) -> Result<HashMap<String, AmfValue>> {
    let mut cursor = std::io::Cursor::new(data);

    let event = AmfValue::parse(&mut cursor)?;
    if event.as_str() != Some(ON_METADATA) {
        return Err(FlvError::InvalidAmf("Expected onMetaData".to_string()));
    }

    match AmfValue::parse(&mut cursor)? {
        AmfValue::Object(props) | AmfValue::EcmaArray(props) => Ok(props),
        _ => Err(FlvError::InvalidAmf("Expected object or ECMA array".to_string())),
    }
}
