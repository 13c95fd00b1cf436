//! Outbound grant types
//!
//! The per-slot scheduling result handed to the PHY adaptation layer. This
//! core produces typed grants only; serializing them into FAPI PDUs or DCI
//! payloads is the adapter's job.

use crate::harq::HarqId;
use crate::interval::{OfdmSymbolRange, PrbInterval};
use crate::slot::SlotPoint;
use crate::support::mcs::McsTable;

/// Radio network temporary identity of a UE within a cell.
pub type Rnti = u16;

/// Stable UE index assigned by the DU.
pub type UeIndex = u16;

/// Logical channel identity.
pub type Lcid = u8;

/// DCI format and RNTI type used for a DL grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DciDlRntiConfigType {
    CRntiF1_0,
    TcRntiF1_0,
}

/// DCI format and RNTI type used for an UL grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DciUlRntiConfigType {
    CRntiF0_0,
    TcRntiF0_0,
}

/// One PDSCH codeword of a DL grant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdschCodeword {
    pub mcs_table: McsTable,
    pub mcs_index: u8,
    pub tbs_bytes: u32,
    /// Redundancy version, cycling 0, 2, 3, 1 over retransmissions.
    pub rv: u8,
}

/// PDSCH transmission parameters of a DL grant.
#[derive(Debug, Clone, PartialEq)]
pub struct PdschInformation {
    pub rnti: Rnti,
    pub prbs: PrbInterval,
    pub symbols: OfdmSymbolRange,
    pub codewords: Vec<PdschCodeword>,
}

/// PUSCH transmission parameters of an UL grant.
#[derive(Debug, Clone, PartialEq)]
pub struct PuschInformation {
    pub rnti: Rnti,
    pub prbs: PrbInterval,
    pub symbols: OfdmSymbolRange,
    pub mcs_table: McsTable,
    pub mcs_index: u8,
    pub tbs_bytes: u32,
    pub rv: u8,
    pub ndi: bool,
}

/// Identity of one subPDU within a DL transport block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DlSchLcid {
    /// MAC SDU of a logical channel.
    Sdu(Lcid),
    /// UE contention resolution identity MAC CE.
    UeConResId,
    /// Timing advance command MAC CE.
    TaCmd,
}

impl DlSchLcid {
    /// Fixed CE payload size in bytes; `None` for SDUs.
    pub fn ce_size_bytes(&self) -> Option<u32> {
        match self {
            DlSchLcid::Sdu(_) => None,
            DlSchLcid::UeConResId => Some(6),
            DlSchLcid::TaCmd => Some(1),
        }
    }
}

/// One multiplexed subPDU: a MAC CE or a slice of a logical channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DlMsgLcInfo {
    pub lcid: DlSchLcid,
    /// Scheduled bytes, subheader included.
    pub sched_bytes: u32,
}

/// Contents of one DL transport block, in multiplexing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DlMsgTbInfo {
    pub subpdus: Vec<DlMsgLcInfo>,
}

/// One DL grant of a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct DlMsgAlloc {
    pub ue_index: UeIndex,
    pub harq_id: HarqId,
    pub dci_cfg_type: DciDlRntiConfigType,
    pub pdsch: PdschInformation,
    /// Multiplexed contents; empty for retransmissions, which carry the
    /// original data.
    pub tb_info: DlMsgTbInfo,
}

/// One UL grant of a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct UlSchedInfo {
    pub ue_index: UeIndex,
    pub harq_id: HarqId,
    pub dci_cfg_type: DciUlRntiConfigType,
    pub pusch: PuschInformation,
}

/// Everything the scheduler decided for one slot.
#[derive(Debug, Clone)]
pub struct SchedSlotResult {
    pub slot: SlotPoint,
    pub dl_grants: Vec<DlMsgAlloc>,
    pub ul_grants: Vec<UlSchedInfo>,
}

impl SchedSlotResult {
    pub fn new(slot: SlotPoint) -> Self {
        Self {
            slot,
            dl_grants: Vec::new(),
            ul_grants: Vec::new(),
        }
    }
}

/// Redundancy version for the n-th (re)transmission of a transport block.
pub fn rv_for_retx(nof_retxs: u32) -> u8 {
    const RV_SEQUENCE: [u8; 4] = [0, 2, 3, 1];
    RV_SEQUENCE[nof_retxs as usize % 4]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rv_sequence() {
        assert_eq!(rv_for_retx(0), 0);
        assert_eq!(rv_for_retx(1), 2);
        assert_eq!(rv_for_retx(2), 3);
        assert_eq!(rv_for_retx(3), 1);
        assert_eq!(rv_for_retx(4), 0);
    }

    #[test]
    fn test_ce_sizes() {
        assert_eq!(DlSchLcid::UeConResId.ce_size_bytes(), Some(6));
        assert_eq!(DlSchLcid::TaCmd.ce_size_bytes(), Some(1));
        assert_eq!(DlSchLcid::Sdu(1).ce_size_bytes(), None);
    }
}
