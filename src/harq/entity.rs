//! Per-UE-cell HARQ pool
//!
//! Fixed-size set of DL and UL HARQ processes owned by one UE-cell, created
//! empty at attachment and destroyed with the UE. The pool only routes: all
//! state transitions live in [`super::process`].

use crate::grant::Rnti;
use crate::harq::process::{DlHarqProcess, HarqId, UlHarqProcess};
use crate::slot::SlotPoint;

#[derive(Debug, Clone)]
pub struct HarqEntity {
    dl: Vec<DlHarqProcess>,
    ul: Vec<UlHarqProcess>,
}

impl HarqEntity {
    pub fn new(rnti: Rnti, nof_dl_harqs: u8, nof_ul_harqs: u8, max_ack_wait_slots: u32) -> Self {
        Self {
            dl: (0..nof_dl_harqs)
                .map(|id| DlHarqProcess::new(id, rnti, max_ack_wait_slots))
                .collect(),
            ul: (0..nof_ul_harqs)
                .map(|id| UlHarqProcess::new(id, rnti, max_ack_wait_slots))
                .collect(),
        }
    }

    pub fn nof_dl_harqs(&self) -> usize {
        self.dl.len()
    }

    pub fn nof_ul_harqs(&self) -> usize {
        self.ul.len()
    }

    pub fn dl_harq(&self, id: HarqId) -> Option<&DlHarqProcess> {
        self.dl.get(id as usize)
    }

    pub fn dl_harq_mut(&mut self, id: HarqId) -> Option<&mut DlHarqProcess> {
        self.dl.get_mut(id as usize)
    }

    pub fn ul_harq(&self, id: HarqId) -> Option<&UlHarqProcess> {
        self.ul.get(id as usize)
    }

    pub fn ul_harq_mut(&mut self, id: HarqId) -> Option<&mut UlHarqProcess> {
        self.ul.get_mut(id as usize)
    }

    pub fn find_empty_dl_harq(&self) -> Option<HarqId> {
        self.dl.iter().find(|h| h.is_empty()).map(|h| h.id())
    }

    pub fn find_pending_dl_retx(&self) -> Option<HarqId> {
        self.dl.iter().find(|h| h.has_pending_retx()).map(|h| h.id())
    }

    pub fn find_empty_ul_harq(&self) -> Option<HarqId> {
        self.ul.iter().find(|h| h.is_empty()).map(|h| h.id())
    }

    pub fn find_pending_ul_retx(&self) -> Option<HarqId> {
        self.ul.iter().find(|h| h.has_pending_retx()).map(|h| h.id())
    }

    /// Advance every process's feedback-timeout clock. Called once per slot.
    pub fn slot_indication(&mut self, now: SlotPoint) {
        for harq in &mut self.dl {
            harq.slot_indication(now);
        }
        for harq in &mut self.ul {
            harq.slot_indication(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_starts_with_all_processes_empty() {
        let harqs = HarqEntity::new(0x4601, 8, 8, 16);
        assert_eq!(harqs.nof_dl_harqs(), 8);
        assert_eq!(harqs.nof_ul_harqs(), 8);
        for id in 0..8 {
            assert!(harqs.dl_harq(id).unwrap().is_empty());
            assert!(harqs.ul_harq(id).unwrap().is_empty());
        }
        assert_eq!(harqs.find_empty_dl_harq(), Some(0));
        assert_eq!(harqs.find_pending_dl_retx(), None);
    }

    #[test]
    fn test_find_skips_occupied_processes() {
        let mut harqs = HarqEntity::new(0x4601, 2, 2, 16);
        let slot = SlotPoint::new(0, 0, 0);
        harqs.dl_harq_mut(0).unwrap().new_tx(slot, 4, 4);
        assert_eq!(harqs.find_empty_dl_harq(), Some(1));
        harqs.dl_harq_mut(1).unwrap().new_tx(slot, 4, 4);
        assert_eq!(harqs.find_empty_dl_harq(), None);
    }

    #[test]
    fn test_slot_indication_times_out_all_processes() {
        let mut harqs = HarqEntity::new(0x4601, 2, 1, 1);
        let mut slot = SlotPoint::new(0, 0, 0);
        harqs.dl_harq_mut(0).unwrap().new_tx(slot, 1, 4);
        harqs.ul_harq_mut(0).unwrap().new_tx(slot, 0, 4);

        for _ in 0..2 {
            slot.advance();
            harqs.slot_indication(slot);
        }
        assert_eq!(harqs.find_pending_dl_retx(), Some(0));
        assert_eq!(harqs.find_pending_ul_retx(), Some(0));
    }

    #[test]
    fn test_out_of_range_id_is_none() {
        let harqs = HarqEntity::new(0x4601, 8, 8, 16);
        assert!(harqs.dl_harq(8).is_none());
        assert!(harqs.ul_harq(9).is_none());
    }
}
