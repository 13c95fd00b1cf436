//! Shared test fixtures.

use crate::cell::{
    BwpConfig, CarrierConfig, DlConfigCommon, PdschTimeDomainAlloc, PuschTimeDomainAlloc,
    SchedCellConfigRequest, SsbConfig, SubcarrierSpacing, TddUlDlConfig, UlConfigCommon,
};
use crate::interval::{OfdmSymbolRange, PrbInterval};
use crate::support::dmrs::DmrsTypeAPosition;

/// FDD cell, 20 MHz at 15 kHz SCS (106 PRBs), one 12-symbol time-domain
/// allocation in each direction.
pub fn default_cell_config_request() -> SchedCellConfigRequest {
    SchedCellConfigRequest {
        cell_index: 0,
        pci: 1,
        scs_common: SubcarrierSpacing::Khz15,
        dl_carrier: CarrierConfig { carrier_bw_mhz: 20 },
        ul_carrier: CarrierConfig { carrier_bw_mhz: 20 },
        dl_cfg_common: DlConfigCommon {
            init_dl_bwp: BwpConfig {
                crbs: PrbInterval::new(0, 106),
                scs: SubcarrierSpacing::Khz15,
            },
            pdsch_td_alloc_list: vec![PdschTimeDomainAlloc {
                k0: 0,
                symbols: OfdmSymbolRange::new(2, 14),
            }],
        },
        ul_cfg_common: UlConfigCommon {
            init_ul_bwp: BwpConfig {
                crbs: PrbInterval::new(0, 106),
                scs: SubcarrierSpacing::Khz15,
            },
            pusch_td_alloc_list: vec![PuschTimeDomainAlloc {
                k2: 4,
                symbols: OfdmSymbolRange::new(2, 14),
            }],
        },
        tdd_ul_dl_cfg_common: None,
        ssb_config: SsbConfig {
            scs: SubcarrierSpacing::Khz15,
        },
        dmrs_type_a_pos: DmrsTypeAPosition::default(),
    }
}

/// TDD cell, 20 MHz at 30 kHz SCS (51 PRBs), 10-slot pattern with 6 DL
/// slots, one special slot (8 DL / 2 UL symbols) and 3 UL slots.
pub fn tdd_cell_config_request() -> SchedCellConfigRequest {
    let mut req = default_cell_config_request();
    req.scs_common = SubcarrierSpacing::Khz30;
    req.dl_cfg_common.init_dl_bwp.crbs = PrbInterval::new(0, 51);
    req.dl_cfg_common.init_dl_bwp.scs = SubcarrierSpacing::Khz30;
    req.ul_cfg_common.init_ul_bwp.crbs = PrbInterval::new(0, 51);
    req.ul_cfg_common.init_ul_bwp.scs = SubcarrierSpacing::Khz30;
    req.ssb_config.scs = SubcarrierSpacing::Khz30;
    req.tdd_ul_dl_cfg_common = Some(TddUlDlConfig {
        ref_scs: SubcarrierSpacing::Khz30,
        period_slots: 10,
        nof_dl_slots: 6,
        nof_dl_symbols: 8,
        nof_ul_slots: 3,
        nof_ul_symbols: 2,
    });
    req
}
