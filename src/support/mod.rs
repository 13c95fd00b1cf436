//! Rate-matching support tables
//!
//! MCS, DMRS and PRB/TBS helpers shared by the DL and UL resource
//! calculators.

pub mod dmrs;
pub mod mcs;
pub mod prbs;
