//! Cell scheduler

mod config;
mod core;
mod feedback;

pub use config::{ExpertConfigError, MAX_NOF_HARQS, SchedulerExpertConfig};
pub use core::CellScheduler;
pub use feedback::{FeedbackEvent, FeedbackQueue};

use thiserror::Error;

use crate::cell::CellConfigError;
use crate::grant::UeIndex;

/// Failures of the scheduler's control-plane surface.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("ue {0} already exists")]
    UeAlreadyExists(UeIndex),

    #[error("ue {0} not found")]
    UeNotFound(UeIndex),

    #[error("invalid expert config: {0}")]
    InvalidExpertConfig(#[from] ExpertConfigError),

    #[error("invalid cell config: {0}")]
    InvalidCellConfig(#[from] CellConfigError),
}
