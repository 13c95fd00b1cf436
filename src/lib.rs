//! macsched - 5G NR MAC slot scheduler core
//!
//! Synchronous, deterministic scheduling core for one or more NR cells. The
//! surrounding MAC layer drives it with a monotonic slot clock and a stream
//! of feedback events (HARQ-ACK, CRC, buffer state, scheduling requests);
//! each tick returns the complete set of DL and UL grants for that slot.
//!
//! # Core Concepts
//!
//! - **One tick, one decision**: every input is queued and applied at the
//!   top of the next [`CellScheduler::slot_indication`], so a slot's outcome
//!   is a pure function of configuration and event history
//! - **Timed HARQ**: missing feedback resolves as an implicit NACK after a
//!   bounded wait, so the scheduler makes forward progress over a lossy
//!   feedback channel
//! - **Typed grants only**: the core emits [`SchedSlotResult`] values;
//!   serializing them into FAPI PDUs or DCI payloads belongs to the adapter
//!
//! # Modules
//!
//! - [`slot`] - wrapping slot clock
//! - [`cell`] - immutable cell configuration
//! - [`harq`] - HARQ process state machines
//! - [`logical_channel`] - DL/UL buffer accounting
//! - [`ue`] - per-UE state and resource calculators
//! - [`scheduler`] - the per-cell decision pipeline
//! - [`support`] - MCS, DMRS and TBS rate-matching tables
//! - [`uci`] - UCI part-2 size derivation

pub mod cell;
pub mod grant;
pub mod harq;
pub mod interval;
pub mod logical_channel;
pub mod scheduler;
pub mod slot;
pub mod support;
pub mod uci;
pub mod ue;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use cell::{CellConfig, SchedCellConfigRequest, validate_cell_config_request};
pub use grant::{DlMsgAlloc, Rnti, SchedSlotResult, UeIndex, UlSchedInfo};
pub use harq::{HarqAck, HarqId};
pub use logical_channel::LogicalChannelConfig;
pub use scheduler::{
    CellScheduler, FeedbackEvent, SchedulerError, SchedulerExpertConfig,
};
pub use slot::SlotPoint;
pub use ue::{SchedUeCreationRequest, SchedUeReconfigurationRequest};
