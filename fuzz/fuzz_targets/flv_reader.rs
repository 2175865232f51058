#![no_main]

//! Fuzz target for the FLV tag reader.
//!
//! Feeds arbitrary bytes to `FlvReader` and walks every tag, with and without trailer
//! verification, looking for panics.

use flvfile::{FlvReader, ReaderConfig};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    for verify in [true, false] {
        let config = ReaderConfig::new().with_verify_previous_tag_size(verify);
        let Ok(mut reader) = FlvReader::new(Cursor::new(data.to_vec()), config) else {
            return;
        };

        let _ = reader.duration();
        let _ = reader.metadata();
        let _ = reader.header();

        while let Ok(Some(tag)) = reader.next_tag() {
            assert_eq!(tag.data.len(), tag.header.data_size as usize);
        }

        if reader.loop_back().is_ok() {
            let _ = reader.next_tag();
        }
    }
});
