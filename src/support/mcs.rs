//! Modulation and coding scheme tables
//!
//! MCS index to (modulation order, target code rate) mappings per 3GPP
//! TS 38.214 Tables 5.1.3.1-1 (64QAM) and 5.1.3.1-2 (256QAM). The same
//! tables apply to PDSCH and to PUSCH without transform precoding.

use serde::{Deserialize, Serialize};

/// Modulation scheme of a codeword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modulation {
    Qpsk,
    Qam16,
    Qam64,
    Qam256,
}

impl Modulation {
    /// Bits per modulated symbol (Qm).
    pub fn order(&self) -> u32 {
        match self {
            Modulation::Qpsk => 2,
            Modulation::Qam16 => 4,
            Modulation::Qam64 => 6,
            Modulation::Qam256 => 8,
        }
    }
}

/// Which TS 38.214 MCS table the cell is configured with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McsTable {
    #[default]
    Qam64,
    Qam256,
}

/// Expanded MCS entry used by the PRB/TBS sizing functions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct McsDescription {
    pub modulation: Modulation,
    /// Target code rate multiplied by 1024, as listed in the tables.
    pub target_code_rate: f32,
}

impl McsDescription {
    /// Effective code rate R.
    pub fn code_rate(&self) -> f32 {
        self.target_code_rate / 1024.0
    }
}

/// TS 38.214 Table 5.1.3.1-1. Entries are (Qm, R x 1024).
const MCS_TABLE_QAM64: [(u32, f32); 29] = [
    (2, 120.0),
    (2, 157.0),
    (2, 193.0),
    (2, 251.0),
    (2, 308.0),
    (2, 379.0),
    (2, 449.0),
    (2, 526.0),
    (2, 602.0),
    (2, 679.0),
    (4, 340.0),
    (4, 378.0),
    (4, 434.0),
    (4, 490.0),
    (4, 553.0),
    (4, 616.0),
    (4, 658.0),
    (6, 438.0),
    (6, 466.0),
    (6, 517.0),
    (6, 567.0),
    (6, 616.0),
    (6, 666.0),
    (6, 719.0),
    (6, 772.0),
    (6, 822.0),
    (6, 873.0),
    (6, 910.0),
    (6, 948.0),
];

/// TS 38.214 Table 5.1.3.1-2. Entries are (Qm, R x 1024).
const MCS_TABLE_QAM256: [(u32, f32); 28] = [
    (2, 120.0),
    (2, 193.0),
    (2, 308.0),
    (2, 449.0),
    (2, 602.0),
    (4, 378.0),
    (4, 434.0),
    (4, 490.0),
    (4, 553.0),
    (4, 616.0),
    (4, 658.0),
    (6, 466.0),
    (6, 517.0),
    (6, 567.0),
    (6, 616.0),
    (6, 666.0),
    (6, 719.0),
    (6, 772.0),
    (6, 822.0),
    (6, 873.0),
    (8, 682.5),
    (8, 711.0),
    (8, 754.0),
    (8, 797.0),
    (8, 841.0),
    (8, 885.0),
    (8, 916.5),
    (8, 948.0),
];

fn modulation_from_order(qm: u32) -> Modulation {
    match qm {
        2 => Modulation::Qpsk,
        4 => Modulation::Qam16,
        6 => Modulation::Qam64,
        _ => Modulation::Qam256,
    }
}

/// Look up an MCS index in the given table. `None` for reserved indices.
pub fn mcs_to_config(table: McsTable, index: u8) -> Option<McsDescription> {
    let (qm, rate) = match table {
        McsTable::Qam64 => *MCS_TABLE_QAM64.get(index as usize)?,
        McsTable::Qam256 => *MCS_TABLE_QAM256.get(index as usize)?,
    };
    Some(McsDescription {
        modulation: modulation_from_order(qm),
        target_code_rate: rate,
    })
}
