//! Slot-level timing
//!
//! `SlotPoint` is the scheduler's base tick: an absolute, wrapping slot count
//! qualified by a numerology (subcarrier-spacing index). HARQ deadlines and
//! TDD direction lookups are all expressed relative to it.

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Number of system frame numbers before the slot count wraps.
pub const NOF_SFNS: u32 = 1024;

/// Subframes per 10 ms radio frame.
pub const NOF_SUBFRAMES_PER_FRAME: u32 = 10;

/// Highest supported numerology (subcarrier-spacing index).
pub const MAX_NUMEROLOGY: u8 = 4;

/// Absolute slot time, wrapping modulo 1024 frames.
///
/// Immutable value type; a fresh value is produced for each slot tick.
/// Comparison and subtraction are modular, so orderings remain correct
/// across the wrap boundary as long as the compared points are less than
/// half the system-frame period apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotPoint {
    numerology: u8,
    count: u32,
}

impl SlotPoint {
    /// Create a slot point from a numerology, SFN and slot index within the frame.
    pub fn new(numerology: u8, sfn: u32, slot_index: u32) -> Self {
        assert!(numerology <= MAX_NUMEROLOGY, "invalid numerology {numerology}");
        assert!(sfn < NOF_SFNS, "invalid sfn {sfn}");
        let slots_per_frame = NOF_SUBFRAMES_PER_FRAME * (1 << numerology);
        assert!(slot_index < slots_per_frame, "invalid slot index {slot_index}");
        Self {
            numerology,
            count: sfn * slots_per_frame + slot_index,
        }
    }

    /// Subcarrier-spacing index in [0, 4].
    pub fn numerology(&self) -> u8 {
        self.numerology
    }

    /// Slots per 10 ms frame for this numerology.
    pub fn slots_per_frame(&self) -> u32 {
        NOF_SUBFRAMES_PER_FRAME * (1 << self.numerology)
    }

    /// Total slots before the count wraps (1024 frames).
    pub fn nof_slots_per_system_frame(&self) -> u32 {
        NOF_SFNS * self.slots_per_frame()
    }

    /// System frame number in [0, 1024).
    pub fn sfn(&self) -> u32 {
        self.count / self.slots_per_frame()
    }

    /// Slot index within the current frame.
    pub fn slot_index(&self) -> u32 {
        self.count % self.slots_per_frame()
    }

    /// Subframe index within the current frame, in [0, 10).
    pub fn subframe_index(&self) -> u32 {
        self.slot_index() / (1 << self.numerology)
    }

    /// Raw wrapping slot count.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Advance the clock by exactly one slot. Called once per real time slot.
    pub fn advance(&mut self) {
        *self = *self + 1;
    }
}

impl Add<u32> for SlotPoint {
    type Output = SlotPoint;

    fn add(self, rhs: u32) -> SlotPoint {
        let period = self.nof_slots_per_system_frame();
        SlotPoint {
            numerology: self.numerology,
            count: (self.count + rhs % period) % period,
        }
    }
}

impl AddAssign<u32> for SlotPoint {
    fn add_assign(&mut self, rhs: u32) {
        *self = *self + rhs;
    }
}

impl Sub<u32> for SlotPoint {
    type Output = SlotPoint;

    fn sub(self, rhs: u32) -> SlotPoint {
        let period = self.nof_slots_per_system_frame();
        SlotPoint {
            numerology: self.numerology,
            count: (self.count + period - rhs % period) % period,
        }
    }
}

impl SubAssign<u32> for SlotPoint {
    fn sub_assign(&mut self, rhs: u32) {
        *self = *self - rhs;
    }
}

impl Sub<SlotPoint> for SlotPoint {
    type Output = i32;

    /// Signed modular distance in slots. Correct for points less than half
    /// the system-frame period apart.
    fn sub(self, rhs: SlotPoint) -> i32 {
        assert_eq!(self.numerology, rhs.numerology, "numerology mismatch");
        let period = self.nof_slots_per_system_frame() as i32;
        let mut v = self.count as i32 - rhs.count as i32;
        if v >= period / 2 {
            v -= period;
        } else if v < -(period / 2) {
            v += period;
        }
        v
    }
}

impl PartialOrd for SlotPoint {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        if self.numerology != other.numerology {
            return None;
        }
        Some((*self - *other).cmp(&0))
    }
}

impl fmt::Display for SlotPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.sfn(), self.slot_index())
    }
}
