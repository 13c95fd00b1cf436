//! Per-UE scheduling state
//!
//! A [`Ue`] bundles the logical channel managers with one [`UeCell`] per
//! serving cell. The first configured cell is the PCell; carrier aggregation
//! keeps the list open-ended but every allocation in this core targets the
//! PCell.

mod tb_builder;
mod ue_cell;

pub use tb_builder::{allocate_mac_ces, allocate_mac_sdu, allocate_mac_sdus, allocate_ue_con_res_id_mac_ce};
pub use ue_cell::UeCell;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cell::CellConfig;
use crate::grant::{DlMsgTbInfo, Rnti, UeIndex};
use crate::logical_channel::{
    DlLogicalChannelManager, LCID_SRB0, LogicalChannelConfig, UlLogicalChannelManager,
};
use crate::scheduler::SchedulerExpertConfig;

/// UL bytes granted on a scheduling request alone, before any BSR arrives.
pub const SR_GRANT_BYTES: u32 = 512;

/// UE creation request, as received from the DU at UE attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedUeCreationRequest {
    pub ue_index: UeIndex,
    pub crnti: Rnti,
    pub lc_config_list: Vec<LogicalChannelConfig>,
    /// Whether contention resolution is still outstanding; the scheduler
    /// then serves SRB0 with a TC-RNTI DCI until the CE goes out.
    #[serde(default)]
    pub con_res_required: bool,
}

/// UE reconfiguration request; replaces the logical channel set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedUeReconfigurationRequest {
    pub ue_index: UeIndex,
    pub lc_config_list: Vec<LogicalChannelConfig>,
}

#[derive(Debug)]
pub struct Ue {
    pub ue_index: UeIndex,
    pub crnti: Rnti,
    pub dl_lc_mgr: DlLogicalChannelManager,
    pub ul_lc_mgr: UlLogicalChannelManager,
    cells: Vec<UeCell>,
}

impl Ue {
    pub fn new(
        req: &SchedUeCreationRequest,
        expert_cfg: SchedulerExpertConfig,
        cell_cfg: Arc<CellConfig>,
    ) -> Self {
        let mut dl_lc_mgr = DlLogicalChannelManager::default();
        dl_lc_mgr.configure(&req.lc_config_list);
        if req.con_res_required {
            dl_lc_mgr.set_con_res_id_pending();
        }
        Self {
            ue_index: req.ue_index,
            crnti: req.crnti,
            dl_lc_mgr,
            ul_lc_mgr: UlLogicalChannelManager::default(),
            cells: vec![UeCell::new(req.ue_index, req.crnti, expert_cfg, cell_cfg)],
        }
    }

    pub fn handle_reconfiguration_request(&mut self, req: &SchedUeReconfigurationRequest) {
        self.dl_lc_mgr.configure(&req.lc_config_list);
    }

    pub fn pcell(&self) -> &UeCell {
        &self.cells[0]
    }

    pub fn pcell_mut(&mut self) -> &mut UeCell {
        &mut self.cells[0]
    }

    /// DL bytes a new transmission would have to carry: all pending SDUs
    /// plus queued CEs, subheaders included. Saturating.
    pub fn pending_dl_newtx_bytes(&self) -> u32 {
        self.dl_lc_mgr
            .pending_bytes()
            .saturating_add(self.dl_lc_mgr.pending_ue_con_res_id_ce_bytes())
            .saturating_add(self.dl_lc_mgr.pending_ce_bytes())
    }

    /// Bytes of the SRB0 fallback transmission: SRB0 data plus the
    /// contention-resolution CE when SRB0 has something to carry it with.
    pub fn pending_dl_srb0_newtx_bytes(&self) -> u32 {
        let srb0_bytes = self.dl_lc_mgr.lc_pending_bytes(LCID_SRB0);
        if srb0_bytes > 0 {
            srb0_bytes.saturating_add(self.dl_lc_mgr.pending_ue_con_res_id_ce_bytes())
        } else {
            0
        }
    }

    /// UL bytes a new grant should cover: the BSR total minus what in-flight
    /// UL HARQ occupancies already carry. With no BSR data but a pending SR,
    /// a fixed probe of [`SR_GRANT_BYTES`] lets the UE send its BSR.
    pub fn pending_ul_newtx_bytes(&self) -> u32 {
        let pending = self.ul_lc_mgr.pending_bytes();
        if pending > 0 {
            let harqs = &self.pcell().harqs;
            let in_flight = (0..harqs.nof_ul_harqs() as u8)
                .filter_map(|id| harqs.ul_harq(id))
                .filter(|h| !h.is_empty())
                .filter_map(|h| h.last_alloc_params())
                .fold(0u32, |acc, params| acc.saturating_add(params.tbs_bytes));
            return pending.saturating_sub(in_flight);
        }
        if self.ul_lc_mgr.has_pending_sr() {
            SR_GRANT_BYTES
        } else {
            0
        }
    }

    /// Fill a new DL transport block: CEs first, then SDUs by priority.
    pub fn build_dl_transport_block_info(&mut self, tbs_bytes: u32) -> DlMsgTbInfo {
        let mut tb_info = DlMsgTbInfo::default();
        let ce_bytes = allocate_mac_ces(&mut tb_info, &mut self.dl_lc_mgr, tbs_bytes);
        allocate_mac_sdus(&mut tb_info, &mut self.dl_lc_mgr, tbs_bytes - ce_bytes);
        tb_info
    }

    /// Fill the SRB0 fallback transport block: the contention-resolution CE
    /// and SRB0 only.
    pub fn build_dl_srb0_transport_block_info(&mut self, tbs_bytes: u32) -> DlMsgTbInfo {
        let mut tb_info = DlMsgTbInfo::default();
        let ce_bytes = allocate_ue_con_res_id_mac_ce(&mut tb_info, &mut self.dl_lc_mgr, tbs_bytes);
        allocate_mac_sdu(&mut tb_info, &mut self.dl_lc_mgr, LCID_SRB0, tbs_bytes - ce_bytes);
        tb_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::DlSchLcid;
    use crate::logical_channel::LCID_SRB1;
    use crate::slot::SlotPoint;
    use crate::test_helpers::default_cell_config_request;

    fn make_ue(con_res_required: bool) -> Ue {
        let cell_cfg = Arc::new(CellConfig::new(&default_cell_config_request()));
        let req = SchedUeCreationRequest {
            ue_index: 1,
            crnti: 0x4601,
            lc_config_list: vec![
                LogicalChannelConfig {
                    lcid: LCID_SRB0,
                    priority: 0,
                },
                LogicalChannelConfig {
                    lcid: LCID_SRB1,
                    priority: 1,
                },
            ],
            con_res_required,
        };
        Ue::new(&req, SchedulerExpertConfig::default(), cell_cfg)
    }

    #[test]
    fn test_new_ue_has_nothing_pending() {
        let ue = make_ue(false);
        assert_eq!(ue.pending_dl_newtx_bytes(), 0);
        assert_eq!(ue.pending_dl_srb0_newtx_bytes(), 0);
        assert_eq!(ue.pending_ul_newtx_bytes(), 0);
    }

    #[test]
    fn test_dl_pending_accounts_subheaders_and_ces() {
        let mut ue = make_ue(true);
        ue.dl_lc_mgr.handle_dl_buffer_state_indication(LCID_SRB1, 100);
        assert_eq!(ue.pending_dl_newtx_bytes(), 102 + 7);
    }

    #[test]
    fn test_srb0_pending_includes_con_res_ce() {
        let mut ue = make_ue(true);
        assert_eq!(ue.pending_dl_srb0_newtx_bytes(), 0);

        ue.dl_lc_mgr.handle_dl_buffer_state_indication(LCID_SRB0, 50);
        assert_eq!(ue.pending_dl_srb0_newtx_bytes(), 52 + 7);
    }

    #[test]
    fn test_ul_pending_subtracts_in_flight_harqs() {
        let mut ue = make_ue(false);
        ue.ul_lc_mgr.handle_bsr_indication(0, 300);
        assert_eq!(ue.pending_ul_newtx_bytes(), 300);

        let slot = SlotPoint::new(0, 0, 0);
        let harq = ue.pcell_mut().harqs.ul_harq_mut(0).unwrap();
        harq.new_tx(slot, 0, 4);
        harq.save_alloc_params(crate::harq::UlHarqAllocParams {
            dci_cfg_type: crate::grant::DciUlRntiConfigType::CRntiF0_0,
            prbs: crate::interval::PrbInterval::new(0, 10),
            mcs_table: crate::support::mcs::McsTable::Qam64,
            mcs: 10,
            tbs_bytes: 200,
        });
        assert_eq!(ue.pending_ul_newtx_bytes(), 100);

        // In-flight data covering the whole report leaves nothing to grant.
        ue.ul_lc_mgr.handle_bsr_indication(0, 150);
        assert_eq!(ue.pending_ul_newtx_bytes(), 0);
    }

    #[test]
    fn test_extreme_buffer_reports_do_not_overflow() {
        let mut ue = make_ue(true);
        ue.dl_lc_mgr.handle_dl_buffer_state_indication(LCID_SRB1, u32::MAX);
        assert_eq!(ue.pending_dl_newtx_bytes(), u32::MAX);

        ue.dl_lc_mgr.handle_dl_buffer_state_indication(LCID_SRB0, u32::MAX);
        assert_eq!(ue.pending_dl_srb0_newtx_bytes(), u32::MAX);

        ue.ul_lc_mgr.handle_bsr_indication(0, u32::MAX);
        ue.ul_lc_mgr.handle_bsr_indication(1, u32::MAX);
        assert_eq!(ue.pending_ul_newtx_bytes(), u32::MAX);
    }

    #[test]
    fn test_sr_without_bsr_requests_probe_grant() {
        let mut ue = make_ue(false);
        ue.ul_lc_mgr.handle_sr_indication();
        assert_eq!(ue.pending_ul_newtx_bytes(), SR_GRANT_BYTES);

        // A BSR supersedes the probe.
        ue.ul_lc_mgr.handle_bsr_indication(1, 40);
        assert_eq!(ue.pending_ul_newtx_bytes(), 40);
    }

    #[test]
    fn test_build_tb_consumes_pending_state() {
        let mut ue = make_ue(true);
        ue.dl_lc_mgr.handle_dl_buffer_state_indication(LCID_SRB1, 50);

        let tb_info = ue.build_dl_transport_block_info(1000);
        assert_eq!(tb_info.subpdus.len(), 2);
        assert_eq!(tb_info.subpdus[0].lcid, DlSchLcid::UeConResId);
        assert_eq!(tb_info.subpdus[1].lcid, DlSchLcid::Sdu(LCID_SRB1));
        assert_eq!(ue.pending_dl_newtx_bytes(), 0);
    }

    #[test]
    fn test_srb0_tb_leaves_other_channels_untouched() {
        let mut ue = make_ue(true);
        ue.dl_lc_mgr.handle_dl_buffer_state_indication(LCID_SRB0, 30);
        ue.dl_lc_mgr.handle_dl_buffer_state_indication(LCID_SRB1, 500);

        let tb_info = ue.build_dl_srb0_transport_block_info(1000);
        assert_eq!(tb_info.subpdus.len(), 2);
        assert_eq!(tb_info.subpdus[0].lcid, DlSchLcid::UeConResId);
        assert_eq!(tb_info.subpdus[1].lcid, DlSchLcid::Sdu(LCID_SRB0));
        assert_eq!(ue.dl_lc_mgr.lc_pending_bytes(LCID_SRB1), 502);
        assert!(!ue.dl_lc_mgr.is_con_res_id_pending());
    }
}
