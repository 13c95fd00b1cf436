//! Cell configuration
//!
//! Immutable per-cell parameters consulted read-only by every scheduling
//! decision. A [`SchedCellConfigRequest`] is validated before the cell is
//! brought into service; [`CellConfig::new`] is then total and derives the
//! PRB counts, SSB pattern case and, for TDD cells, the per-slot direction
//! bitmaps. Reconfiguration creates a new instance; there is no mutation API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interval::{OfdmSymbolRange, PrbInterval};
use crate::slot::SlotPoint;
use crate::support::dmrs::DmrsTypeAPosition;

/// Maximum number of cells a DU can serve.
pub const MAX_NOF_CELLS: u16 = 16;

/// Highest valid physical cell identity.
pub const MAX_PCI: u16 = 1007;

pub type CellIndex = u16;
pub type Pci = u16;

/// Subcarrier spacing of a carrier or BWP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubcarrierSpacing {
    Khz15,
    Khz30,
    Khz60,
    Khz120,
    Khz240,
}

impl SubcarrierSpacing {
    pub fn numerology(&self) -> u8 {
        match self {
            SubcarrierSpacing::Khz15 => 0,
            SubcarrierSpacing::Khz30 => 1,
            SubcarrierSpacing::Khz60 => 2,
            SubcarrierSpacing::Khz120 => 3,
            SubcarrierSpacing::Khz240 => 4,
        }
    }
}

/// SSB pattern case derived from the SSB subcarrier spacing and spectrum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SsbPatternCase {
    A,
    B,
    C,
    D,
    E,
}

/// Generic parameters of a bandwidth part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BwpConfig {
    pub crbs: PrbInterval,
    pub scs: SubcarrierSpacing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdschTimeDomainAlloc {
    /// Slot offset between the PDCCH and the scheduled PDSCH.
    pub k0: u8,
    pub symbols: OfdmSymbolRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuschTimeDomainAlloc {
    /// Slot offset between the UL grant and the scheduled PUSCH.
    pub k2: u8,
    pub symbols: OfdmSymbolRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlConfigCommon {
    pub init_dl_bwp: BwpConfig,
    pub pdsch_td_alloc_list: Vec<PdschTimeDomainAlloc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UlConfigCommon {
    pub init_ul_bwp: BwpConfig,
    pub pusch_td_alloc_list: Vec<PuschTimeDomainAlloc>,
}

/// tdd-UL-DL-ConfigurationCommon pattern, flattened to slot granularity.
///
/// One period consists of `nof_dl_slots` full DL slots, optionally one
/// special slot carrying `nof_dl_symbols` DL and `nof_ul_symbols` UL
/// symbols, and `nof_ul_slots` full UL slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TddUlDlConfig {
    pub ref_scs: SubcarrierSpacing,
    pub period_slots: u16,
    pub nof_dl_slots: u16,
    pub nof_dl_symbols: u8,
    pub nof_ul_slots: u16,
    pub nof_ul_symbols: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsbConfig {
    pub scs: SubcarrierSpacing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierConfig {
    pub carrier_bw_mhz: u16,
}

/// Cell configuration request, as received from the DU at cell setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedCellConfigRequest {
    pub cell_index: CellIndex,
    pub pci: Pci,
    pub scs_common: SubcarrierSpacing,
    pub dl_carrier: CarrierConfig,
    pub ul_carrier: CarrierConfig,
    pub dl_cfg_common: DlConfigCommon,
    pub ul_cfg_common: UlConfigCommon,
    pub tdd_ul_dl_cfg_common: Option<TddUlDlConfig>,
    pub ssb_config: SsbConfig,
    #[serde(default)]
    pub dmrs_type_a_pos: DmrsTypeAPosition,
}

/// Rejection reasons for a malformed cell configuration request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellConfigError {
    #[error("invalid cell index {0}")]
    InvalidCellIndex(CellIndex),

    #[error("invalid pci {0}")]
    InvalidPci(Pci),

    #[error("unsupported bandwidth {bw_mhz} MHz for subcarrier spacing {scs:?}")]
    UnsupportedBandwidth { bw_mhz: u16, scs: SubcarrierSpacing },

    #[error("empty {0} time-domain allocation list")]
    EmptyTimeDomainAllocList(&'static str),

    #[error("tdd pattern does not fit its period")]
    InvalidTddPattern,

    #[error("unsupported ssb subcarrier spacing {0:?}")]
    UnsupportedSsbScs(SubcarrierSpacing),
}

/// Transmission bandwidth in PRBs (TS 38.104 Table 5.3.2-1, FR1).
fn max_nof_prbs(bw_mhz: u16, scs: SubcarrierSpacing) -> Option<u32> {
    let prbs = match (scs, bw_mhz) {
        (SubcarrierSpacing::Khz15, 5) => 25,
        (SubcarrierSpacing::Khz15, 10) => 52,
        (SubcarrierSpacing::Khz15, 15) => 79,
        (SubcarrierSpacing::Khz15, 20) => 106,
        (SubcarrierSpacing::Khz15, 25) => 133,
        (SubcarrierSpacing::Khz15, 30) => 160,
        (SubcarrierSpacing::Khz15, 40) => 216,
        (SubcarrierSpacing::Khz15, 50) => 270,
        (SubcarrierSpacing::Khz30, 5) => 11,
        (SubcarrierSpacing::Khz30, 10) => 24,
        (SubcarrierSpacing::Khz30, 15) => 38,
        (SubcarrierSpacing::Khz30, 20) => 51,
        (SubcarrierSpacing::Khz30, 25) => 65,
        (SubcarrierSpacing::Khz30, 30) => 78,
        (SubcarrierSpacing::Khz30, 40) => 106,
        (SubcarrierSpacing::Khz30, 50) => 133,
        (SubcarrierSpacing::Khz30, 60) => 162,
        (SubcarrierSpacing::Khz30, 70) => 189,
        (SubcarrierSpacing::Khz30, 80) => 217,
        (SubcarrierSpacing::Khz30, 90) => 245,
        (SubcarrierSpacing::Khz30, 100) => 273,
        (SubcarrierSpacing::Khz60, 10) => 11,
        (SubcarrierSpacing::Khz60, 15) => 18,
        (SubcarrierSpacing::Khz60, 20) => 24,
        (SubcarrierSpacing::Khz60, 25) => 31,
        (SubcarrierSpacing::Khz60, 30) => 38,
        (SubcarrierSpacing::Khz60, 40) => 51,
        (SubcarrierSpacing::Khz60, 50) => 65,
        (SubcarrierSpacing::Khz60, 60) => 79,
        (SubcarrierSpacing::Khz60, 70) => 93,
        (SubcarrierSpacing::Khz60, 80) => 107,
        (SubcarrierSpacing::Khz60, 90) => 121,
        (SubcarrierSpacing::Khz60, 100) => 135,
        _ => return None,
    };
    Some(prbs)
}

impl TddUlDlConfig {
    fn special_slot(&self) -> Option<u16> {
        (self.nof_dl_slots + self.nof_ul_slots < self.period_slots).then_some(self.nof_dl_slots)
    }

    fn slot_is_dl(&self, idx: u16) -> bool {
        idx < self.nof_dl_slots || (Some(idx) == self.special_slot() && self.nof_dl_symbols > 0)
    }

    fn slot_is_ul(&self, idx: u16) -> bool {
        idx >= self.period_slots - self.nof_ul_slots
            || (Some(idx) == self.special_slot() && self.nof_ul_symbols > 0)
    }
}

/// Structural validation of a cell configuration request.
///
/// Pure function of the request: calling it twice yields the same verdict.
pub fn validate_cell_config_request(msg: &SchedCellConfigRequest) -> Result<(), CellConfigError> {
    if msg.cell_index >= MAX_NOF_CELLS {
        return Err(CellConfigError::InvalidCellIndex(msg.cell_index));
    }
    if msg.pci > MAX_PCI {
        return Err(CellConfigError::InvalidPci(msg.pci));
    }
    for carrier in [&msg.dl_carrier, &msg.ul_carrier] {
        if max_nof_prbs(carrier.carrier_bw_mhz, msg.scs_common).is_none() {
            return Err(CellConfigError::UnsupportedBandwidth {
                bw_mhz: carrier.carrier_bw_mhz,
                scs: msg.scs_common,
            });
        }
    }
    if msg.dl_cfg_common.pdsch_td_alloc_list.is_empty() {
        return Err(CellConfigError::EmptyTimeDomainAllocList("pdsch"));
    }
    if msg.ul_cfg_common.pusch_td_alloc_list.is_empty() {
        return Err(CellConfigError::EmptyTimeDomainAllocList("pusch"));
    }
    if let Some(tdd) = &msg.tdd_ul_dl_cfg_common {
        if tdd.period_slots == 0 || tdd.nof_dl_slots + tdd.nof_ul_slots > tdd.period_slots {
            return Err(CellConfigError::InvalidTddPattern);
        }
    }
    if matches!(msg.ssb_config.scs, SubcarrierSpacing::Khz60) {
        return Err(CellConfigError::UnsupportedSsbScs(msg.ssb_config.scs));
    }
    Ok(())
}

/// Immutable cell parameters, created once at cell setup.
#[derive(Debug, Clone)]
pub struct CellConfig {
    pub cell_index: CellIndex,
    pub pci: Pci,
    pub nof_dl_prbs: u32,
    pub nof_ul_prbs: u32,
    pub nof_slots_per_frame: u32,
    pub dl_cfg_common: DlConfigCommon,
    pub ul_cfg_common: UlConfigCommon,
    pub tdd_cfg_common: Option<TddUlDlConfig>,
    pub ssb_case: SsbPatternCase,
    pub paired_spectrum: bool,
    pub dmrs_type_a_pos: DmrsTypeAPosition,
    /// Per-slot DL/UL availability over one TDD period; empty for FDD.
    dl_enabled_slot_lst: Vec<bool>,
    ul_enabled_slot_lst: Vec<bool>,
}

impl CellConfig {
    /// Build the derived cell parameters. The request must have passed
    /// [`validate_cell_config_request`].
    pub fn new(msg: &SchedCellConfigRequest) -> Self {
        debug_assert!(validate_cell_config_request(msg).is_ok());
        let paired_spectrum = msg.tdd_ul_dl_cfg_common.is_none();
        let ssb_case = match msg.ssb_config.scs {
            SubcarrierSpacing::Khz15 => SsbPatternCase::A,
            SubcarrierSpacing::Khz30 if paired_spectrum => SsbPatternCase::B,
            SubcarrierSpacing::Khz30 => SsbPatternCase::C,
            SubcarrierSpacing::Khz120 => SsbPatternCase::D,
            _ => SsbPatternCase::E,
        };

        let (dl_enabled_slot_lst, ul_enabled_slot_lst) = match &msg.tdd_ul_dl_cfg_common {
            Some(tdd) => (
                (0..tdd.period_slots).map(|i| tdd.slot_is_dl(i)).collect(),
                (0..tdd.period_slots).map(|i| tdd.slot_is_ul(i)).collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        Self {
            cell_index: msg.cell_index,
            pci: msg.pci,
            nof_dl_prbs: max_nof_prbs(msg.dl_carrier.carrier_bw_mhz, msg.scs_common)
                .unwrap_or_default(),
            nof_ul_prbs: max_nof_prbs(msg.ul_carrier.carrier_bw_mhz, msg.scs_common)
                .unwrap_or_default(),
            nof_slots_per_frame: 10 * (1u32 << msg.scs_common.numerology()),
            dl_cfg_common: msg.dl_cfg_common.clone(),
            ul_cfg_common: msg.ul_cfg_common.clone(),
            tdd_cfg_common: msg.tdd_ul_dl_cfg_common.clone(),
            ssb_case,
            paired_spectrum,
            dmrs_type_a_pos: msg.dmrs_type_a_pos,
            dl_enabled_slot_lst,
            ul_enabled_slot_lst,
        }
    }

    pub fn is_tdd(&self) -> bool {
        self.tdd_cfg_common.is_some()
    }

    /// Whether the cell may transmit DL in the given slot.
    pub fn is_dl_enabled(&self, slot: SlotPoint) -> bool {
        if self.dl_enabled_slot_lst.is_empty() {
            return true;
        }
        self.dl_enabled_slot_lst[slot.count() as usize % self.dl_enabled_slot_lst.len()]
    }

    /// Whether the cell may receive UL in the given slot.
    pub fn is_ul_enabled(&self, slot: SlotPoint) -> bool {
        if self.ul_enabled_slot_lst.is_empty() {
            return true;
        }
        self.ul_enabled_slot_lst[slot.count() as usize % self.ul_enabled_slot_lst.len()]
    }
}
