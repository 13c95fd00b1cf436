//! UE-cell resource calculator
//!
//! One `UeCell` per (UE, serving cell): it owns the HARQ pool for that cell
//! and sizes candidate allocations, turning a pending byte count and a
//! time-domain resource into a PRB count under the configured fixed MCS and
//! the cell's DMRS overhead.

use std::sync::Arc;

use crate::cell::{CellConfig, CellIndex};
use crate::grant::{Rnti, UeIndex};
use crate::harq::HarqEntity;
use crate::scheduler::SchedulerExpertConfig;
use crate::support::dmrs::{DmrsAdditionalPosition, calculate_nof_dmrs_per_rb, make_dmrs_info_common};
use crate::support::mcs::mcs_to_config;
use crate::support::prbs::{MAX_SINGLE_ALLOC_BITS, PrbsCalculatorConfig, get_nof_prbs, tbs_bytes_for_prbs};

#[derive(Debug)]
pub struct UeCell {
    pub ue_index: UeIndex,
    pub cell_index: CellIndex,
    pub rnti: Rnti,
    pub harqs: HarqEntity,
    expert_cfg: SchedulerExpertConfig,
    cell_cfg: Arc<CellConfig>,
}

impl UeCell {
    pub fn new(
        ue_index: UeIndex,
        rnti: Rnti,
        expert_cfg: SchedulerExpertConfig,
        cell_cfg: Arc<CellConfig>,
    ) -> Self {
        Self {
            ue_index,
            cell_index: cell_cfg.cell_index,
            rnti,
            harqs: HarqEntity::new(
                rnti,
                expert_cfg.nof_dl_harqs,
                expert_cfg.nof_ul_harqs,
                expert_cfg.max_ack_wait_slots,
            ),
            expert_cfg,
            cell_cfg,
        }
    }

    pub fn cell_cfg(&self) -> &CellConfig {
        &self.cell_cfg
    }

    fn dl_prbs_config(&self, time_resource: usize, pending_bytes: u32) -> PrbsCalculatorConfig {
        let symbols = self.cell_cfg.dl_cfg_common.pdsch_td_alloc_list[time_resource].symbols;
        let dmrs = make_dmrs_info_common(
            symbols,
            self.cell_cfg.dmrs_type_a_pos,
            DmrsAdditionalPosition::default(),
        );
        PrbsCalculatorConfig {
            payload_size_bytes: pending_bytes,
            nof_symb_sh: symbols.length() as u32,
            nof_dmrs_prb: calculate_nof_dmrs_per_rb(&dmrs),
            nof_oh_prb: 0,
            mcs: mcs_to_config(self.expert_cfg.dl_mcs_table, self.expert_cfg.fixed_dl_mcs)
                .expect("expert config validated at scheduler creation"),
            nof_layers: 1,
        }
    }

    fn ul_prbs_config(&self, time_resource: usize, pending_bytes: u32) -> PrbsCalculatorConfig {
        let symbols = self.cell_cfg.ul_cfg_common.pusch_td_alloc_list[time_resource].symbols;
        let dmrs = make_dmrs_info_common(
            symbols,
            self.cell_cfg.dmrs_type_a_pos,
            DmrsAdditionalPosition::default(),
        );
        PrbsCalculatorConfig {
            payload_size_bytes: pending_bytes,
            nof_symb_sh: symbols.length() as u32,
            nof_dmrs_prb: calculate_nof_dmrs_per_rb(&dmrs),
            nof_oh_prb: 0,
            mcs: mcs_to_config(self.expert_cfg.ul_mcs_table, self.expert_cfg.fixed_ul_mcs)
                .expect("expert config validated at scheduler creation"),
            nof_layers: 1,
        }
    }

    /// PRBs needed to carry `pending_bytes` DL bytes in the given
    /// time-domain resource.
    ///
    /// Boundary policy: above the 3824-bit single-allocation ceiling the
    /// minimal-PRB search is not exact, and the whole initial DL BWP is
    /// allocated instead. The result is capped at the BWP width either way,
    /// so a low fixed MCS yields a full-width partial grant rather than an
    /// unsatisfiable request.
    pub fn required_dl_prbs(&self, time_resource: usize, pending_bytes: u32) -> u32 {
        let bwp_len = self.cell_cfg.dl_cfg_common.init_dl_bwp.crbs.length();
        if u64::from(pending_bytes) * 8 > u64::from(MAX_SINGLE_ALLOC_BITS) {
            return bwp_len;
        }
        get_nof_prbs(&self.dl_prbs_config(time_resource, pending_bytes))
            .nof_prbs
            .min(bwp_len)
    }

    /// UL counterpart of [`required_dl_prbs`], with the same boundary policy.
    ///
    /// [`required_dl_prbs`]: UeCell::required_dl_prbs
    pub fn required_ul_prbs(&self, time_resource: usize, pending_bytes: u32) -> u32 {
        let bwp_len = self.cell_cfg.ul_cfg_common.init_ul_bwp.crbs.length();
        if u64::from(pending_bytes) * 8 > u64::from(MAX_SINGLE_ALLOC_BITS) {
            return bwp_len;
        }
        get_nof_prbs(&self.ul_prbs_config(time_resource, pending_bytes))
            .nof_prbs
            .min(bwp_len)
    }

    /// TBS yielded by a DL allocation of `nof_prbs` in the given
    /// time-domain resource.
    pub fn dl_tbs_bytes(&self, time_resource: usize, nof_prbs: u32) -> u32 {
        tbs_bytes_for_prbs(nof_prbs, &self.dl_prbs_config(time_resource, 0))
    }

    /// UL counterpart of [`dl_tbs_bytes`].
    ///
    /// [`dl_tbs_bytes`]: UeCell::dl_tbs_bytes
    pub fn ul_tbs_bytes(&self, time_resource: usize, nof_prbs: u32) -> u32 {
        tbs_bytes_for_prbs(nof_prbs, &self.ul_prbs_config(time_resource, 0))
    }
}
