//! Feedback event queue
//!
//! All asynchronous inputs (HARQ feedback, CRC results, buffer state,
//! scheduling requests) are enqueued as events and drained at the top of
//! the next slot tick, so every scheduling decision sees a consistent
//! snapshot and the core stays single-threaded.

use std::collections::VecDeque;

use crate::grant::{Lcid, UeIndex};
use crate::harq::{HarqAck, HarqId};

/// One asynchronous input to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackEvent {
    /// HARQ-ACK report for one DL codeword.
    DlHarqAck {
        ue_index: UeIndex,
        harq_id: HarqId,
        tb_idx: usize,
        ack: HarqAck,
    },
    /// Decode result of a PUSCH transmission.
    UlCrc {
        ue_index: UeIndex,
        harq_id: HarqId,
        ok: bool,
    },
    /// DL buffer state update for one logical channel.
    DlBufferState {
        ue_index: UeIndex,
        lcid: Lcid,
        bytes: u32,
    },
    /// Buffer status report for one logical channel group.
    UlBsr {
        ue_index: UeIndex,
        lcg: usize,
        bytes: u32,
    },
    /// Scheduling request.
    SrIndication { ue_index: UeIndex },
}

/// FIFO of pending feedback events.
#[derive(Debug, Default)]
pub struct FeedbackQueue {
    events: VecDeque<FeedbackEvent>,
}

impl FeedbackQueue {
    pub fn push(&mut self, event: FeedbackEvent) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<FeedbackEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = FeedbackQueue::default();
        assert!(queue.is_empty());

        queue.push(FeedbackEvent::SrIndication { ue_index: 1 });
        queue.push(FeedbackEvent::UlBsr {
            ue_index: 1,
            lcg: 0,
            bytes: 100,
        });
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.pop(), Some(FeedbackEvent::SrIndication { ue_index: 1 }));
        assert_eq!(
            queue.pop(),
            Some(FeedbackEvent::UlBsr {
                ue_index: 1,
                lcg: 0,
                bytes: 100
            })
        );
        assert_eq!(queue.pop(), None);
    }
}
