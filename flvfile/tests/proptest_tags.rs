//! Property-based tests for tag framing and timestamp bookkeeping.
//!
//! Writes arbitrary tag sequences to memory and checks what comes back.

use byteorder::{BigEndian, ByteOrder};
use flvfile::{
    FlvReader, FlvWriter, ReaderConfig, TagType, TimestampTracker, WriterConfig, DURATION_OFFSET,
    HEADER_LEN, TAG_HEADER_SIZE,
};
use proptest::prelude::*;
use std::io::Cursor;

fn tag_type() -> impl Strategy<Value = TagType> {
    prop_oneof![
        Just(TagType::Audio),
        Just(TagType::Video),
        Just(TagType::ScriptData),
        any::<u8>().prop_map(TagType::from_u8),
    ]
}

fn tag_sequence() -> impl Strategy<Value = Vec<(TagType, Vec<u8>, u32)>> {
    prop::collection::vec(
        (
            tag_type(),
            prop::collection::vec(any::<u8>(), 0..256),
            any::<u32>(),
        ),
        1..32,
    )
}

fn write_all(tags: &[(TagType, Vec<u8>, u32)]) -> (Vec<u8>, f64) {
    let mut writer = FlvWriter::new(Cursor::new(Vec::new()), WriterConfig::default()).unwrap();
    for (tag_type, data, timestamp) in tags {
        writer.write_tag(data, *tag_type, *timestamp).unwrap();
    }
    writer.finalize().unwrap();
    let duration = writer.duration();
    (writer.into_inner().into_inner(), duration)
}

fn read_all(bytes: Vec<u8>) -> Vec<(TagType, Vec<u8>, u32)> {
    let mut reader = FlvReader::new(Cursor::new(bytes), ReaderConfig::default()).unwrap();
    let mut tags = Vec::new();
    while let Some(tag) = reader.next_tag().unwrap() {
        tags.push((tag.tag_type(), tag.data.clone(), tag.timestamp_ms()));
    }
    tags
}

proptest! {
    /// Types and payloads survive a write/read cycle unchanged.
    #[test]
    fn roundtrip_types_and_payloads(tags in tag_sequence()) {
        let (bytes, _) = write_all(&tags);
        let read = read_all(bytes);

        prop_assert_eq!(read.len(), tags.len());
        for ((tag_type, data, _), (read_type, read_data, _)) in tags.iter().zip(read.iter()) {
            prop_assert_eq!(tag_type, read_type);
            prop_assert_eq!(data, read_data);
        }
    }

    /// Timestamps on disk start at zero and never decrease.
    #[test]
    fn timestamps_zero_based_and_monotonic(tags in tag_sequence()) {
        let (bytes, _) = write_all(&tags);
        let read = read_all(bytes);

        prop_assert_eq!(read[0].2, 0);
        for pair in read.windows(2) {
            prop_assert!(pair[1].2 >= pair[0].2);
        }
    }

    /// Encoded timestamps equal the running max of inputs minus the first input.
    #[test]
    fn timestamps_match_clamped_inputs(inputs in prop::collection::vec(any::<u32>(), 1..64)) {
        let mut tracker = TimestampTracker::new();
        let first = inputs[0];
        let mut last = 0u32;
        for input in inputs {
            last = last.max(input);
            prop_assert_eq!(tracker.advance(input), last - first);
        }
    }

    /// Duration persisted at the fixed offset is the largest encoded timestamp in seconds.
    #[test]
    fn duration_is_max_encoded_timestamp(tags in tag_sequence()) {
        let (bytes, tracked) = write_all(&tags);
        let start = DURATION_OFFSET as usize;
        let stored = BigEndian::read_f64(&bytes[start..start + 8]);

        let read = read_all(bytes);
        let max_ms = read.iter().map(|(_, _, ts)| *ts).max().unwrap_or(0);

        prop_assert_eq!(stored, max_ms as f64 / 1000.0);
        prop_assert_eq!(stored, tracked);
    }

    /// Every trailer on disk equals its tag's data size plus 11.
    #[test]
    fn trailer_matches_data_size(tags in tag_sequence()) {
        let (bytes, _) = write_all(&tags);

        let mut pos = HEADER_LEN;
        let mut count = 0;
        while pos < bytes.len() {
            let data_size = BigEndian::read_u24(&bytes[pos + 1..pos + 4]);
            let trailer_at = pos + TAG_HEADER_SIZE + data_size as usize;
            let trailer = BigEndian::read_u32(&bytes[trailer_at..trailer_at + 4]);
            prop_assert_eq!(trailer, data_size + TAG_HEADER_SIZE as u32);
            pos = trailer_at + 4;
            count += 1;
        }
        prop_assert_eq!(pos, bytes.len());
        prop_assert_eq!(count, tags.len());
    }

    /// Arbitrary bytes after a valid preamble never panic the reader.
    #[test]
    fn reader_tolerates_garbage(garbage in prop::collection::vec(any::<u8>(), 0..512)) {
        let writer = FlvWriter::new(Cursor::new(Vec::new()), WriterConfig::default()).unwrap();
        let mut bytes = writer.into_inner().into_inner();
        bytes.extend_from_slice(&garbage);

        let mut reader = FlvReader::new(Cursor::new(bytes), ReaderConfig::default()).unwrap();
        for _ in 0..garbage.len() + 1 {
            match reader.next_tag() {
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }
    }
}
