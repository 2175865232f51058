//! Per-file session state shared by the writer and reader.

use tracing::debug;

/// Timestamp and duration bookkeeping for a write session.
///
/// Input timestamps are clamped so the stream never goes backwards, then rebased so the
/// first tag sits at zero. `duration` follows the largest rebased time seen, in seconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimestampTracker {
    first_timestamp_set: bool,
    first_timestamp: u32,
    last_timestamp: u32,
    duration: f64,
}

impl TimestampTracker {
    /// Create a tracker with zeroed state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a tag stamped `timestamp_ms` and return the timestamp to encode.
    ///
    /// The encoded value may differ from the input: it is never below the previous input and
    /// is relative to the first tag's timestamp.
    pub fn advance(&mut self, timestamp_ms: u32) -> u32 {
        let effective = if timestamp_ms < self.last_timestamp {
            debug!(
                timestamp_ms,
                last_timestamp = self.last_timestamp,
                "Clamping out-of-order timestamp"
            );
            self.last_timestamp
        } else {
            self.last_timestamp = timestamp_ms;
            timestamp_ms
        };

        if !self.first_timestamp_set {
            self.first_timestamp_set = true;
            self.first_timestamp = effective;
        }

        // effective >= last_timestamp >= first_timestamp
        let encoded = effective - self.first_timestamp;
        let seconds = encoded as f64 / crate::FLV_TIME_BASE_MS as f64;
        if seconds > self.duration {
            self.duration = seconds;
        }
        encoded
    }

    /// Baseline subtracted from every input, once the first tag has been written.
    pub fn first_timestamp(&self) -> Option<u32> {
        self.first_timestamp_set.then_some(self.first_timestamp)
    }

    /// Last (unclamped) input timestamp accepted.
    pub fn last_timestamp(&self) -> u32 {
        self.last_timestamp
    }

    /// Tracked duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Override the tracked duration.
    pub fn set_duration(&mut self, seconds: f64) {
        self.duration = seconds;
    }
}

/// Read session bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadState {
    /// Total file length captured at open.
    pub size: u64,
    /// Offset of the first tag.
    pub data_start: u64,
}

impl ReadState {
    /// Whether `position` is at or past the end of the captured data.
    pub fn is_finished_at(&self, position: u64) -> bool {
        position >= self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tag_is_zero() {
        let mut tracker = TimestampTracker::new();
        assert_eq!(tracker.first_timestamp(), None);
        assert_eq!(tracker.advance(123_456), 0);
        assert_eq!(tracker.first_timestamp(), Some(123_456));
        assert_eq!(tracker.duration(), 0.0);
    }

    #[test]
    fn test_rebases_following_tags() {
        let mut tracker = TimestampTracker::new();
        tracker.advance(5000);
        assert_eq!(tracker.advance(5040), 40);
        assert_eq!(tracker.advance(7500), 2500);
        assert_eq!(tracker.duration(), 2.5);
    }

    #[test]
    fn test_clamps_regressing_timestamps() {
        let mut tracker = TimestampTracker::new();
        assert_eq!(tracker.advance(1000), 0);
        assert_eq!(tracker.advance(500), 0);
        assert_eq!(tracker.last_timestamp(), 1000);
        assert_eq!(tracker.advance(1200), 200);
        assert_eq!(tracker.advance(1100), 200);
        assert_eq!(tracker.last_timestamp(), 1200);
        assert_eq!(tracker.duration(), 0.2);
    }

    #[test]
    fn test_set_duration_then_advance() {
        let mut tracker = TimestampTracker::new();
        tracker.advance(0);
        tracker.set_duration(90.0);
        tracker.advance(1000);
        assert_eq!(tracker.duration(), 90.0);
        tracker.advance(120_000);
        assert_eq!(tracker.duration(), 120.0);
    }

    #[test]
    fn test_read_state() {
        let state = ReadState {
            size: 100,
            data_start: 68,
        };
        assert!(!state.is_finished_at(68));
        assert!(state.is_finished_at(100));
        assert!(state.is_finished_at(101));
    }
}
