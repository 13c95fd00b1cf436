//! Per-cell slot scheduler
//!
//! `CellScheduler` is the synchronous decision core for one cell. All inputs
//! arrive through handler methods that enqueue feedback events; each
//! [`slot_indication`] drains the queue, advances the HARQ clocks and emits
//! the grants of that slot. Retransmissions are served before new
//! transmissions, and UEs are visited in ascending UE index, so the outcome
//! of a slot is a pure function of the configuration and the event history.
//!
//! [`slot_indication`]: CellScheduler::slot_indication

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cell::{CellConfig, SchedCellConfigRequest, validate_cell_config_request};
use crate::grant::{
    DciDlRntiConfigType, DciUlRntiConfigType, DlMsgAlloc, DlMsgTbInfo, PdschCodeword,
    PdschInformation, PuschInformation, SchedSlotResult, UeIndex, UlSchedInfo, rv_for_retx,
};
use crate::harq::HarqAck;
use crate::interval::PrbInterval;
use crate::scheduler::config::SchedulerExpertConfig;
use crate::scheduler::feedback::{FeedbackEvent, FeedbackQueue};
use crate::scheduler::SchedulerError;
use crate::slot::SlotPoint;
use crate::ue::{SchedUeCreationRequest, SchedUeReconfigurationRequest, Ue};

/// Contiguous first-fit PRB allocation within one slot.
struct PrbAllocator {
    next: u32,
    cap: u32,
}

impl PrbAllocator {
    fn new(cap: u32) -> Self {
        Self { next: 0, cap }
    }

    fn alloc(&mut self, length: u32) -> Option<PrbInterval> {
        if length == 0 || self.next + length > self.cap {
            return None;
        }
        let prbs = PrbInterval::with_length(self.next, length);
        self.next += length;
        Some(prbs)
    }
}

pub struct CellScheduler {
    cell_cfg: Arc<CellConfig>,
    expert_cfg: SchedulerExpertConfig,
    ues: BTreeMap<UeIndex, Ue>,
    feedback: FeedbackQueue,
    last_slot: Option<SlotPoint>,
}

impl CellScheduler {
    pub fn new(
        cell_req: &SchedCellConfigRequest,
        expert_cfg: SchedulerExpertConfig,
    ) -> Result<Self, SchedulerError> {
        expert_cfg.validate()?;
        validate_cell_config_request(cell_req)?;
        let cell_cfg = Arc::new(CellConfig::new(cell_req));
        info!(
            cell_index = cell_cfg.cell_index,
            pci = cell_cfg.pci,
            nof_dl_prbs = cell_cfg.nof_dl_prbs,
            nof_ul_prbs = cell_cfg.nof_ul_prbs,
            tdd = cell_cfg.is_tdd(),
            "cell scheduler created"
        );
        Ok(Self {
            cell_cfg,
            expert_cfg,
            ues: BTreeMap::new(),
            feedback: FeedbackQueue::default(),
            last_slot: None,
        })
    }

    pub fn cell_cfg(&self) -> &CellConfig {
        &self.cell_cfg
    }

    pub fn ue(&self, ue_index: UeIndex) -> Option<&Ue> {
        self.ues.get(&ue_index)
    }

    pub fn nof_ues(&self) -> usize {
        self.ues.len()
    }

    pub fn handle_ue_creation_request(
        &mut self,
        req: &SchedUeCreationRequest,
    ) -> Result<(), SchedulerError> {
        if self.ues.contains_key(&req.ue_index) {
            return Err(SchedulerError::UeAlreadyExists(req.ue_index));
        }
        info!(ue_index = req.ue_index, rnti = req.crnti, "ue created");
        self.ues.insert(
            req.ue_index,
            Ue::new(req, self.expert_cfg.clone(), Arc::clone(&self.cell_cfg)),
        );
        Ok(())
    }

    pub fn handle_ue_reconfiguration_request(
        &mut self,
        req: &SchedUeReconfigurationRequest,
    ) -> Result<(), SchedulerError> {
        let ue = self
            .ues
            .get_mut(&req.ue_index)
            .ok_or(SchedulerError::UeNotFound(req.ue_index))?;
        ue.handle_reconfiguration_request(req);
        Ok(())
    }

    pub fn handle_ue_removal_request(&mut self, ue_index: UeIndex) -> Result<(), SchedulerError> {
        self.ues
            .remove(&ue_index)
            .ok_or(SchedulerError::UeNotFound(ue_index))?;
        info!(ue_index, "ue removed");
        Ok(())
    }

    /// Enqueue any asynchronous input; applied at the next slot tick.
    pub fn handle_feedback(&mut self, event: FeedbackEvent) {
        self.feedback.push(event);
    }

    /// Run one slot of the scheduler. `slot` must be strictly greater than
    /// the previous tick.
    pub fn slot_indication(&mut self, slot: SlotPoint) -> SchedSlotResult {
        assert!(
            self.last_slot.is_none_or(|prev| slot > prev),
            "non-monotonic slot indication {slot}"
        );
        self.last_slot = Some(slot);

        self.drain_feedback();
        for ue in self.ues.values_mut() {
            ue.pcell_mut().harqs.slot_indication(slot);
        }

        let mut result = SchedSlotResult::new(slot);
        if self.cell_cfg.is_dl_enabled(slot) {
            self.schedule_dl(slot, &mut result);
        }
        let pusch_slot = slot + self.expert_cfg.k2;
        if self.cell_cfg.is_ul_enabled(pusch_slot) {
            self.schedule_ul(slot, pusch_slot, &mut result);
        }
        debug!(
            slot = %slot,
            nof_dl_grants = result.dl_grants.len(),
            nof_ul_grants = result.ul_grants.len(),
            "slot scheduled"
        );
        result
    }

    fn drain_feedback(&mut self) {
        while let Some(event) = self.feedback.pop() {
            let ue_index = match event {
                FeedbackEvent::DlHarqAck { ue_index, .. }
                | FeedbackEvent::UlCrc { ue_index, .. }
                | FeedbackEvent::DlBufferState { ue_index, .. }
                | FeedbackEvent::UlBsr { ue_index, .. }
                | FeedbackEvent::SrIndication { ue_index } => ue_index,
            };
            let Some(ue) = self.ues.get_mut(&ue_index) else {
                warn!(ue_index, ?event, "feedback for unknown ue dropped");
                continue;
            };
            match event {
                FeedbackEvent::DlHarqAck {
                    harq_id,
                    tb_idx,
                    ack,
                    ..
                } => match ue.pcell_mut().harqs.dl_harq_mut(harq_id) {
                    Some(harq) => {
                        // Anomalies are logged inside the process and dropped.
                        let _ = harq.ack_info(tb_idx, ack);
                    }
                    None => warn!(ue_index, harq_id, "harq ack for unknown dl process"),
                },
                FeedbackEvent::UlCrc { harq_id, ok, .. } => {
                    let ack = if ok { HarqAck::Ack } else { HarqAck::Nack };
                    match ue.pcell_mut().harqs.ul_harq_mut(harq_id) {
                        Some(harq) => {
                            let _ = harq.ack_info(0, ack);
                        }
                        None => warn!(ue_index, harq_id, "crc for unknown ul process"),
                    }
                }
                FeedbackEvent::DlBufferState { lcid, bytes, .. } => {
                    ue.dl_lc_mgr.handle_dl_buffer_state_indication(lcid, bytes);
                }
                FeedbackEvent::UlBsr { lcg, bytes, .. } => {
                    ue.ul_lc_mgr.handle_bsr_indication(lcg, bytes);
                }
                FeedbackEvent::SrIndication { .. } => {
                    ue.ul_lc_mgr.handle_sr_indication();
                }
            }
        }
    }

    fn schedule_dl(&mut self, slot: SlotPoint, result: &mut SchedSlotResult) {
        let mut prb_alloc = PrbAllocator::new(self.cell_cfg.nof_dl_prbs);
        let symbols = self.cell_cfg.dl_cfg_common.pdsch_td_alloc_list[0].symbols;
        let k1 = self.expert_cfg.k1;

        // Retransmissions hold HARQ processes and must drain first.
        for (&ue_index, ue) in self.ues.iter_mut() {
            let Some(harq_id) = ue.pcell().harqs.find_pending_dl_retx() else {
                continue;
            };
            let harq = ue.pcell().harqs.dl_harq(harq_id).expect("id from find");
            let Some(params) = harq.last_alloc_params().cloned() else {
                continue;
            };
            let Some(prbs) = prb_alloc.alloc(params.prbs.length()) else {
                continue;
            };
            let harq = ue.pcell_mut().harqs.dl_harq_mut(harq_id).expect("id from find");
            harq.new_retx(slot, k1);
            let rv = rv_for_retx(harq.tb_nof_retxs(0));
            let codewords = params
                .tb
                .iter()
                .flatten()
                .map(|tb| PdschCodeword {
                    mcs_table: tb.mcs_table,
                    mcs_index: tb.mcs,
                    tbs_bytes: tb.tbs_bytes,
                    rv,
                })
                .collect();
            result.dl_grants.push(DlMsgAlloc {
                ue_index,
                harq_id,
                dci_cfg_type: params.dci_cfg_type,
                pdsch: PdschInformation {
                    rnti: ue.crnti,
                    prbs,
                    symbols,
                    codewords,
                },
                tb_info: DlMsgTbInfo::default(),
            });
        }

        for (&ue_index, ue) in self.ues.iter_mut() {
            // While contention resolution is outstanding only the SRB0
            // fallback with a TC-RNTI DCI is allowed.
            let fallback = ue.dl_lc_mgr.is_con_res_id_pending();
            let pending_bytes = if fallback {
                ue.pending_dl_srb0_newtx_bytes()
            } else {
                ue.pending_dl_newtx_bytes()
            };
            if pending_bytes == 0 {
                continue;
            }
            let Some(harq_id) = ue.pcell().harqs.find_empty_dl_harq() else {
                debug!(ue_index, "no empty dl harq process, ue skipped");
                continue;
            };
            let nof_prbs = ue.pcell().required_dl_prbs(0, pending_bytes);
            let Some(prbs) = prb_alloc.alloc(nof_prbs) else {
                debug!(ue_index, nof_prbs, "insufficient dl prbs, ue skipped");
                continue;
            };
            let tbs_bytes = ue.pcell().dl_tbs_bytes(0, prbs.length());
            let tb_info = if fallback {
                ue.build_dl_srb0_transport_block_info(tbs_bytes)
            } else {
                ue.build_dl_transport_block_info(tbs_bytes)
            };
            let dci_cfg_type = if fallback {
                DciDlRntiConfigType::TcRntiF1_0
            } else {
                DciDlRntiConfigType::CRntiF1_0
            };
            let pdsch = PdschInformation {
                rnti: ue.crnti,
                prbs,
                symbols,
                codewords: vec![PdschCodeword {
                    mcs_table: self.expert_cfg.dl_mcs_table,
                    mcs_index: self.expert_cfg.fixed_dl_mcs,
                    tbs_bytes,
                    rv: 0,
                }],
            };
            let harq = ue.pcell_mut().harqs.dl_harq_mut(harq_id).expect("id from find");
            harq.new_tx(slot, k1, self.expert_cfg.max_nof_harq_retxs);
            harq.save_alloc_params(crate::harq::DlHarqAllocParams::from_pdsch(
                dci_cfg_type,
                &pdsch,
            ));
            result.dl_grants.push(DlMsgAlloc {
                ue_index,
                harq_id,
                dci_cfg_type,
                pdsch,
                tb_info,
            });
        }
    }

    fn schedule_ul(&mut self, slot: SlotPoint, pusch_slot: SlotPoint, result: &mut SchedSlotResult) {
        let mut prb_alloc = PrbAllocator::new(self.cell_cfg.nof_ul_prbs);
        let symbols = self.cell_cfg.ul_cfg_common.pusch_td_alloc_list[0].symbols;

        for (&ue_index, ue) in self.ues.iter_mut() {
            let Some(harq_id) = ue.pcell().harqs.find_pending_ul_retx() else {
                continue;
            };
            let harq = ue.pcell().harqs.ul_harq(harq_id).expect("id from find");
            let Some(params) = harq.last_alloc_params().cloned() else {
                continue;
            };
            let Some(prbs) = prb_alloc.alloc(params.prbs.length()) else {
                continue;
            };
            let harq = ue.pcell_mut().harqs.ul_harq_mut(harq_id).expect("id from find");
            // The CRC arrives for the PUSCH slot itself, so no extra offset.
            harq.new_retx(pusch_slot, 0);
            let rv = rv_for_retx(harq.tb_nof_retxs(0));
            let ndi = harq.tb_ndi(0);
            result.ul_grants.push(UlSchedInfo {
                ue_index,
                harq_id,
                dci_cfg_type: params.dci_cfg_type,
                pusch: PuschInformation {
                    rnti: ue.crnti,
                    prbs,
                    symbols,
                    mcs_table: params.mcs_table,
                    mcs_index: params.mcs,
                    tbs_bytes: params.tbs_bytes,
                    rv,
                    ndi,
                },
            });
        }

        for (&ue_index, ue) in self.ues.iter_mut() {
            let pending_bytes = ue.pending_ul_newtx_bytes();
            if pending_bytes == 0 {
                continue;
            }
            let Some(harq_id) = ue.pcell().harqs.find_empty_ul_harq() else {
                debug!(ue_index, "no empty ul harq process, ue skipped");
                continue;
            };
            let nof_prbs = ue.pcell().required_ul_prbs(0, pending_bytes);
            let Some(prbs) = prb_alloc.alloc(nof_prbs) else {
                debug!(ue_index, nof_prbs, "insufficient ul prbs, ue skipped");
                continue;
            };
            let tbs_bytes = ue.pcell().ul_tbs_bytes(0, prbs.length());
            let dci_cfg_type = if ue.dl_lc_mgr.is_con_res_id_pending() {
                DciUlRntiConfigType::TcRntiF0_0
            } else {
                DciUlRntiConfigType::CRntiF0_0
            };
            let params = crate::harq::UlHarqAllocParams {
                dci_cfg_type,
                prbs,
                mcs_table: self.expert_cfg.ul_mcs_table,
                mcs: self.expert_cfg.fixed_ul_mcs,
                tbs_bytes,
            };
            let harq = ue.pcell_mut().harqs.ul_harq_mut(harq_id).expect("id from find");
            harq.new_tx(pusch_slot, 0, self.expert_cfg.max_nof_harq_retxs);
            let ndi = harq.tb_ndi(0);
            harq.save_alloc_params(params);
            // The grant covers the SR; the UE reports the rest via BSR.
            ue.ul_lc_mgr.reset_sr_indication();
            result.ul_grants.push(UlSchedInfo {
                ue_index,
                harq_id,
                dci_cfg_type,
                pusch: PuschInformation {
                    rnti: ue.crnti,
                    prbs,
                    symbols,
                    mcs_table: self.expert_cfg.ul_mcs_table,
                    mcs_index: self.expert_cfg.fixed_ul_mcs,
                    tbs_bytes,
                    rv: 0,
                    ndi,
                },
            });
        }
    }
}
