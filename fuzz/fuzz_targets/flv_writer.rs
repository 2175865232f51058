#![no_main]

//! Fuzz target for the FLV tag writer.
//!
//! Writes arbitrary tag sequences, reads them back, and checks the framing and timestamp
//! invariants hold.

use arbitrary::Arbitrary;
use flvfile::{FlvReader, FlvWriter, ReaderConfig, TagType, WriterConfig, MAX_TAG_DATA_SIZE};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

#[derive(Arbitrary, Debug)]
struct TagInput {
    tag_type: u8,
    timestamp: u32,
    data: Vec<u8>,
}

#[derive(Arbitrary, Debug)]
struct WriterInput {
    tags: Vec<TagInput>,
    duration_override: Option<f64>,
}

fuzz_target!(|input: WriterInput| {
    if input.tags.len() > 256
        || input
            .tags
            .iter()
            .any(|tag| tag.data.len() > MAX_TAG_DATA_SIZE as usize)
    {
        return;
    }

    let mut writer = FlvWriter::new(Cursor::new(Vec::new()), WriterConfig::default()).unwrap();
    for tag in &input.tags {
        writer
            .write_tag(&tag.data, TagType::from_u8(tag.tag_type), tag.timestamp)
            .unwrap();
    }
    if let Some(duration) = input.duration_override {
        writer.set_duration(duration);
    }
    writer.finalize().unwrap();
    let expected_duration = writer.duration();

    let bytes = writer.into_inner().into_inner();
    let mut reader = FlvReader::new(Cursor::new(bytes), ReaderConfig::default()).unwrap();
    assert_eq!(reader.duration().to_bits(), expected_duration.to_bits());

    let mut last = 0u32;
    for (index, expected) in input.tags.iter().enumerate() {
        let tag = reader.next_tag().unwrap().unwrap();
        assert_eq!(tag.tag_type().as_u8(), expected.tag_type);
        assert_eq!(tag.data, expected.data);
        if index == 0 {
            assert_eq!(tag.timestamp_ms(), 0);
        }
        assert!(tag.timestamp_ms() >= last);
        last = tag.timestamp_ms();
    }
    assert!(reader.is_finished());
});
