//! Tap Input
//!
//! Taps delivered by the input collaborator, plus the recorded tap log
//! used to replay a session.

use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::core::vec2::Vec2;

/// A single tap in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tap {
    /// Tap position
    pub position: Vec2,
    /// Session-clock time of the tap (ms)
    pub timestamp_ms: u64,
}

impl Tap {
    /// Create a tap.
    pub const fn new(x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self {
            position: Vec2 { x, y },
            timestamp_ms,
        }
    }

    /// Reject taps whose coordinates are not finite.
    ///
    /// A NaN or infinite position can never be inside a hit circle and
    /// would poison distance math, so the tap is dropped instead of
    /// becoming a miss.
    pub fn sanitize(self) -> Option<Self> {
        if self.position.is_finite() {
            Some(self)
        } else {
            warn!(x = self.position.x, y = self.position.y, "dropping tap with non-finite position");
            None
        }
    }
}

// =============================================================================
// TAP LOG
// =============================================================================

/// Ordered record of every tap a session received.
///
/// Together with the seed and the config this is everything needed to
/// replay a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TapLog {
    taps: Vec<Tap>,
}

impl TapLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tap. Timestamps earlier than the last entry are raised to it
    /// so the log stays monotonic.
    pub fn record(&mut self, mut tap: Tap) {
        if let Some(last) = self.taps.last() {
            tap.timestamp_ms = tap.timestamp_ms.max(last.timestamp_ms);
        }
        self.taps.push(tap);
    }

    /// Recorded taps in order.
    pub fn taps(&self) -> &[Tap] {
        &self.taps
    }

    /// Number of recorded taps.
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Is the log empty?
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}

impl FromIterator<Tap> for TapLog {
    fn from_iter<T: IntoIterator<Item = Tap>>(iter: T) -> Self {
        let mut log = TapLog::new();
        for tap in iter {
            log.record(tap);
        }
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert!(Tap::new(10.0, 20.0, 5).sanitize().is_some());
        assert!(Tap::new(f32::NAN, 20.0, 5).sanitize().is_none());
        assert!(Tap::new(10.0, f32::INFINITY, 5).sanitize().is_none());
    }

    #[test]
    fn test_log_is_monotonic() {
        let log: TapLog = [Tap::new(0.0, 0.0, 100), Tap::new(1.0, 1.0, 50), Tap::new(2.0, 2.0, 300)]
            .into_iter()
            .collect();
        let times: Vec<u64> = log.taps().iter().map(|t| t.timestamp_ms).collect();
        assert_eq!(times, vec![100, 100, 300]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_log_serde() {
        let mut log = TapLog::new();
        log.record(Tap::new(12.5, 40.0, 1_000));
        let json = serde_json::to_string(&log).unwrap();
        let back: TapLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }
}
