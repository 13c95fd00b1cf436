//! HARQ retransmission state

mod entity;
mod process;

pub use entity::HarqEntity;
pub use process::{
    DlHarqAllocParams, DlHarqProcess, HarqAck, HarqError, HarqId, HarqProcess, TbAllocParams,
    UlHarqAllocParams, UlHarqProcess,
};
