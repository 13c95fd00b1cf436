//! Scheduler expert configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::support::mcs::{McsTable, mcs_to_config};

/// Largest HARQ pool a UE-cell can be configured with.
pub const MAX_NOF_HARQS: u8 = 16;

/// Operator-tunable scheduler policy knobs, fixed for the cell's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerExpertConfig {
    /// Fixed MCS index for DL allocations.
    #[serde(default = "default_fixed_mcs")]
    pub fixed_dl_mcs: u8,

    /// Fixed MCS index for UL allocations.
    #[serde(default = "default_fixed_mcs")]
    pub fixed_ul_mcs: u8,

    #[serde(default)]
    pub dl_mcs_table: McsTable,

    #[serde(default)]
    pub ul_mcs_table: McsTable,

    /// Retransmission budget of every new transport block.
    #[serde(default = "default_max_nof_harq_retxs")]
    pub max_nof_harq_retxs: u32,

    /// Slots past `slot_ack` before missing feedback counts as a NACK.
    #[serde(default = "default_max_ack_wait_slots")]
    pub max_ack_wait_slots: u32,

    /// Slot offset between a DL transmission and its HARQ feedback.
    #[serde(default = "default_k1")]
    pub k1: u32,

    /// Slot offset between an UL grant and the scheduled PUSCH.
    #[serde(default = "default_k2")]
    pub k2: u32,

    #[serde(default = "default_nof_harqs")]
    pub nof_dl_harqs: u8,

    #[serde(default = "default_nof_harqs")]
    pub nof_ul_harqs: u8,
}

fn default_fixed_mcs() -> u8 {
    10
}

fn default_max_nof_harq_retxs() -> u32 {
    4
}

fn default_max_ack_wait_slots() -> u32 {
    16
}

fn default_k1() -> u32 {
    4
}

fn default_k2() -> u32 {
    4
}

fn default_nof_harqs() -> u8 {
    8
}

impl Default for SchedulerExpertConfig {
    fn default() -> Self {
        Self {
            fixed_dl_mcs: default_fixed_mcs(),
            fixed_ul_mcs: default_fixed_mcs(),
            dl_mcs_table: McsTable::default(),
            ul_mcs_table: McsTable::default(),
            max_nof_harq_retxs: default_max_nof_harq_retxs(),
            max_ack_wait_slots: default_max_ack_wait_slots(),
            k1: default_k1(),
            k2: default_k2(),
            nof_dl_harqs: default_nof_harqs(),
            nof_ul_harqs: default_nof_harqs(),
        }
    }
}

/// Rejection reasons for an unusable expert configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpertConfigError {
    #[error("mcs index {index} is reserved in table {table:?}")]
    InvalidMcs { table: McsTable, index: u8 },

    #[error("harq pool size {0} out of range")]
    InvalidHarqPoolSize(u8),

    #[error("k1 must be positive")]
    InvalidK1,
}

impl SchedulerExpertConfig {
    /// Structural validation, applied once before a cell scheduler is built.
    pub fn validate(&self) -> Result<(), ExpertConfigError> {
        for (table, index) in [
            (self.dl_mcs_table, self.fixed_dl_mcs),
            (self.ul_mcs_table, self.fixed_ul_mcs),
        ] {
            if mcs_to_config(table, index).is_none() {
                return Err(ExpertConfigError::InvalidMcs { table, index });
            }
        }
        for pool in [self.nof_dl_harqs, self.nof_ul_harqs] {
            if pool == 0 || pool > MAX_NOF_HARQS {
                return Err(ExpertConfigError::InvalidHarqPoolSize(pool));
            }
        }
        if self.k1 == 0 {
            return Err(ExpertConfigError::InvalidK1);
        }
        Ok(())
    }
}
