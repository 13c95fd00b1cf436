//! DMRS overhead model
//!
//! Derives the demodulation reference signal symbol positions for a
//! mapping-type-A allocation (TS 38.211 Table 7.4.1.1.2-3, single-symbol
//! DMRS) and the resulting number of reference-signal resource elements per
//! PRB, which the PRB/TBS sizing must subtract from the usable grid.

use serde::{Deserialize, Serialize};

use crate::interval::OfdmSymbolRange;

/// First DMRS symbol of a type-A mapping, from the cell's MIB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmrsTypeAPosition {
    #[default]
    Pos2,
    Pos3,
}

impl DmrsTypeAPosition {
    pub fn symbol(&self) -> u8 {
        match self {
            DmrsTypeAPosition::Pos2 => 2,
            DmrsTypeAPosition::Pos3 => 3,
        }
    }
}

/// DMRS configuration type. Type 1 occupies 6 REs per PRB per CDM group,
/// type 2 occupies 4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DmrsConfigType {
    #[default]
    Type1,
    Type2,
}

/// dmrs-AdditionalPosition from the common PDSCH/PUSCH configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmrsAdditionalPosition {
    Pos0,
    Pos1,
    #[default]
    Pos2,
    Pos3,
}

/// Derived DMRS placement for one allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmrsInformation {
    pub config_type: DmrsConfigType,
    /// OFDM symbol indices carrying DMRS.
    pub symbol_positions: Vec<u8>,
    /// CDM groups without data; their REs are unusable for the data channel.
    pub nof_cdm_groups_without_data: u8,
}

/// DMRS symbol positions for mapping type A, single-symbol DMRS
/// (TS 38.211 Table 7.4.1.1.2-3). `duration` is the last allocated symbol,
/// i.e. the allocation must span symbols `[0, duration)` for type A.
fn dmrs_symbol_positions(l0: u8, duration: u8, additional: DmrsAdditionalPosition) -> Vec<u8> {
    assert!((3..=14).contains(&duration), "invalid type A duration {duration}");
    match additional {
        DmrsAdditionalPosition::Pos0 => vec![l0],
        DmrsAdditionalPosition::Pos1 => match duration {
            3..=7 => vec![l0],
            8..=9 => vec![l0, 7],
            10..=12 => vec![l0, 9],
            _ => vec![l0, 11],
        },
        DmrsAdditionalPosition::Pos2 => match duration {
            3..=7 => vec![l0],
            8..=9 => vec![l0, 7],
            10 => vec![l0, 6, 9],
            _ => vec![l0, 7, 11],
        },
        DmrsAdditionalPosition::Pos3 => match duration {
            3..=7 => vec![l0],
            8..=9 => vec![l0, 7],
            10 => vec![l0, 6, 9],
            11 => vec![l0, 7, 11],
            _ => vec![l0, 5, 8, 11],
        },
    }
}

/// Build the DMRS placement for a common (cell-wide) time-domain allocation.
///
/// The common configuration uses type-1 single-symbol DMRS with two CDM
/// groups without data.
pub fn make_dmrs_info_common(
    symbols: OfdmSymbolRange,
    type_a_pos: DmrsTypeAPosition,
    additional: DmrsAdditionalPosition,
) -> DmrsInformation {
    DmrsInformation {
        config_type: DmrsConfigType::Type1,
        symbol_positions: dmrs_symbol_positions(type_a_pos.symbol(), symbols.stop(), additional),
        nof_cdm_groups_without_data: 2,
    }
}

/// Resource elements per PRB unusable for data due to DMRS.
pub fn calculate_nof_dmrs_per_rb(info: &DmrsInformation) -> u32 {
    let re_per_cdm_group = match info.config_type {
        DmrsConfigType::Type1 => 6,
        DmrsConfigType::Type2 => 4,
    };
    re_per_cdm_group * info.nof_cdm_groups_without_data as u32 * info.symbol_positions.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_allocation_has_front_loaded_dmrs_only() {
        let info = make_dmrs_info_common(
            OfdmSymbolRange::new(0, 7),
            DmrsTypeAPosition::Pos2,
            DmrsAdditionalPosition::Pos2,
        );
        assert_eq!(info.symbol_positions, vec![2]);
        assert_eq!(calculate_nof_dmrs_per_rb(&info), 12);
    }

    #[test]
    fn test_full_slot_allocation_has_three_dmrs_symbols() {
        let info = make_dmrs_info_common(
            OfdmSymbolRange::new(0, 14),
            DmrsTypeAPosition::Pos2,
            DmrsAdditionalPosition::Pos2,
        );
        assert_eq!(info.symbol_positions, vec![2, 7, 11]);
        assert_eq!(calculate_nof_dmrs_per_rb(&info), 36);
    }

    #[test]
    fn test_type_a_pos3_shifts_first_symbol() {
        let info = make_dmrs_info_common(
            OfdmSymbolRange::new(0, 10),
            DmrsTypeAPosition::Pos3,
            DmrsAdditionalPosition::Pos2,
        );
        assert_eq!(info.symbol_positions, vec![3, 6, 9]);
    }

    #[test]
    fn test_pos0_single_symbol_regardless_of_duration() {
        let info = make_dmrs_info_common(
            OfdmSymbolRange::new(0, 14),
            DmrsTypeAPosition::Pos2,
            DmrsAdditionalPosition::Pos0,
        );
        assert_eq!(info.symbol_positions, vec![2]);
    }
}
