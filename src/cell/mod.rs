//! Cell-level configuration

mod config;

pub use config::{
    BwpConfig, CarrierConfig, CellConfig, CellConfigError, CellIndex, DlConfigCommon, MAX_NOF_CELLS,
    MAX_PCI, Pci, PdschTimeDomainAlloc, PuschTimeDomainAlloc, SchedCellConfigRequest, SsbConfig,
    SsbPatternCase, SubcarrierSpacing, TddUlDlConfig, UlConfigCommon, validate_cell_config_request,
};
