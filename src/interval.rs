//! Half-open resource intervals
//!
//! Frequency-domain allocations are expressed as PRB intervals within a BWP;
//! time-domain allocations as OFDM symbol ranges within a slot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open interval `[start, stop)` of physical resource blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrbInterval {
    start: u32,
    stop: u32,
}

impl PrbInterval {
    pub fn new(start: u32, stop: u32) -> Self {
        assert!(start <= stop, "invalid prb interval [{start}, {stop})");
        Self { start, stop }
    }

    /// Interval starting at `start` spanning `length` PRBs.
    pub fn with_length(start: u32, length: u32) -> Self {
        Self::new(start, start + length)
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn stop(&self) -> u32 {
        self.stop
    }

    pub fn length(&self) -> u32 {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    pub fn contains(&self, prb: u32) -> bool {
        prb >= self.start && prb < self.stop
    }
}

impl fmt::Display for PrbInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.stop)
    }
}

/// Half-open range `[start, stop)` of OFDM symbols within a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfdmSymbolRange {
    start: u8,
    stop: u8,
}

impl OfdmSymbolRange {
    pub fn new(start: u8, stop: u8) -> Self {
        assert!(start <= stop && stop <= 14, "invalid symbol range [{start}, {stop})");
        Self { start, stop }
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn stop(&self) -> u8 {
        self.stop
    }

    pub fn length(&self) -> u8 {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }
}

impl fmt::Display for OfdmSymbolRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prb_interval() {
        let prbs = PrbInterval::new(5, 10);
        assert_eq!(prbs.length(), 5);
        assert!(prbs.contains(5));
        assert!(!prbs.contains(10));
        assert!(!prbs.is_empty());
        assert_eq!(prbs.to_string(), "[5, 10)");
        assert_eq!(PrbInterval::with_length(5, 5), prbs);
    }

    #[test]
    fn test_empty_interval() {
        let prbs = PrbInterval::new(3, 3);
        assert!(prbs.is_empty());
        assert_eq!(prbs.length(), 0);
    }

    #[test]
    fn test_symbol_range() {
        let symbols = OfdmSymbolRange::new(2, 14);
        assert_eq!(symbols.length(), 12);
    }

    #[test]
    #[should_panic]
    fn test_symbol_range_beyond_slot_panics() {
        let _ = OfdmSymbolRange::new(2, 15);
    }
}
