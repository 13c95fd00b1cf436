//! Logical channel byte accounting
//!
//! Pure accounting, no allocation logic: buffer-status ingestion raises the
//! pending counts, the transport-block builder lowers them as it multiplexes.
//! The DL manager additionally tracks pending MAC control elements (the
//! contention-resolution identity in particular); the UL manager tracks
//! per-LCG buffer status reports and the scheduling-request flag.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::grant::{DlSchLcid, Lcid};

/// SRB0 carries RRC before any security context exists.
pub const LCID_SRB0: Lcid = 0;
pub const LCID_SRB1: Lcid = 1;

/// Highest logical channel identity carrying data.
pub const MAX_LCID: Lcid = 32;

/// Number of logical channel groups reportable in a BSR.
pub const MAX_NOF_LCGS: usize = 8;

/// Subheader of a fixed-size MAC CE.
const MAC_CE_SUBHEADER_BYTES: u32 = 1;

/// Smallest useful MAC SDU allocation: subheader plus one payload byte.
const MIN_MAC_SDU_BYTES: u32 = 3;

/// Per-channel configuration relevant to scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalChannelConfig {
    pub lcid: Lcid,
    /// Multiplexing priority; lower values are served first.
    pub priority: u8,
}

/// Bytes needed to carry `payload` bytes of one channel, subheader included.
///
/// MAC subheaders with a 16-bit length field apply above 255 bytes.
/// Saturating: upper layers may report arbitrarily large buffer levels.
pub fn mac_sdu_required_bytes(payload: u32) -> u32 {
    match payload {
        0 => 0,
        1..=255 => payload + 2,
        _ => payload.saturating_add(3),
    }
}

/// Largest payload such that payload plus subheader fit in `budget`.
fn mac_sdu_payload_for_budget(budget: u32) -> u32 {
    if budget < MIN_MAC_SDU_BYTES {
        0
    } else if budget <= 257 {
        budget - 2
    } else {
        budget - 3
    }
}

#[derive(Debug, Clone)]
struct DlChannelState {
    cfg: LogicalChannelConfig,
    pending_bytes: u32,
}

/// DL per-UE logical channel state.
#[derive(Debug, Clone, Default)]
pub struct DlLogicalChannelManager {
    channels: Vec<DlChannelState>,
    con_res_id_pending: bool,
    pending_ces: Vec<DlSchLcid>,
}

impl DlLogicalChannelManager {
    /// Replace the set of configured channels, keeping the pending counts of
    /// channels that survive the reconfiguration.
    pub fn configure(&mut self, configs: &[LogicalChannelConfig]) {
        let mut next = Vec::with_capacity(configs.len());
        for cfg in configs {
            debug_assert!(cfg.lcid <= MAX_LCID);
            let pending_bytes = self
                .channel(cfg.lcid)
                .map(|ch| ch.pending_bytes)
                .unwrap_or(0);
            next.push(DlChannelState {
                cfg: cfg.clone(),
                pending_bytes,
            });
        }
        self.channels = next;
    }

    fn channel(&self, lcid: Lcid) -> Option<&DlChannelState> {
        self.channels.iter().find(|ch| ch.cfg.lcid == lcid)
    }

    fn channel_mut(&mut self, lcid: Lcid) -> Option<&mut DlChannelState> {
        self.channels.iter_mut().find(|ch| ch.cfg.lcid == lcid)
    }

    /// Ingest a DL buffer state update for one channel. The report carries
    /// the absolute pending amount known to the upper layer.
    pub fn handle_dl_buffer_state_indication(&mut self, lcid: Lcid, bytes: u32) {
        match self.channel_mut(lcid) {
            Some(ch) => {
                ch.pending_bytes = bytes;
                debug!(lcid, bytes, "dl buffer state updated");
            }
            None => warn!(lcid, "buffer state for unconfigured channel ignored"),
        }
    }

    /// Mark the UE contention-resolution identity CE as pending.
    pub fn set_con_res_id_pending(&mut self) {
        self.con_res_id_pending = true;
    }

    pub fn is_con_res_id_pending(&self) -> bool {
        self.con_res_id_pending
    }

    /// Enqueue a fixed-size MAC CE for transmission.
    pub fn enqueue_ce(&mut self, ce: DlSchLcid) {
        debug_assert!(ce.ce_size_bytes().is_some(), "not a fixed-size ce");
        self.pending_ces.push(ce);
    }

    /// Total pending bytes over all channels, subheaders included.
    /// Saturates instead of wrapping on extreme buffer reports.
    pub fn pending_bytes(&self) -> u32 {
        self.channels
            .iter()
            .map(|ch| mac_sdu_required_bytes(ch.pending_bytes))
            .fold(0u32, u32::saturating_add)
    }

    /// Pending bytes of one channel, subheader included.
    pub fn lc_pending_bytes(&self, lcid: Lcid) -> u32 {
        self.channel(lcid)
            .map(|ch| mac_sdu_required_bytes(ch.pending_bytes))
            .unwrap_or(0)
    }

    /// Outstanding contention-resolution CE bytes, subheader included.
    pub fn pending_ue_con_res_id_ce_bytes(&self) -> u32 {
        if self.con_res_id_pending {
            MAC_CE_SUBHEADER_BYTES + DlSchLcid::UeConResId.ce_size_bytes().unwrap_or(0)
        } else {
            0
        }
    }

    /// Outstanding bytes of all other queued CEs, subheaders included.
    pub fn pending_ce_bytes(&self) -> u32 {
        self.pending_ces
            .iter()
            .filter_map(|ce| ce.ce_size_bytes())
            .map(|size| MAC_CE_SUBHEADER_BYTES + size)
            .sum()
    }

    /// Channels with pending data, in multiplexing order: ascending priority
    /// value, ties broken by LCID (SRBs first).
    pub fn prioritized_lcids(&self) -> Vec<Lcid> {
        let mut lcids: Vec<_> = self
            .channels
            .iter()
            .filter(|ch| ch.pending_bytes > 0)
            .map(|ch| (ch.cfg.priority, ch.cfg.lcid))
            .collect();
        lcids.sort_unstable();
        lcids.into_iter().map(|(_, lcid)| lcid).collect()
    }

    /// Consume the contention-resolution CE if it fits the budget.
    /// Returns the bytes written.
    pub fn allocate_ue_con_res_id_ce(&mut self, budget_bytes: u32) -> u32 {
        let required = self.pending_ue_con_res_id_ce_bytes();
        if required == 0 || required > budget_bytes {
            return 0;
        }
        self.con_res_id_pending = false;
        required
    }

    /// Pop the next queued CE fitting the budget. Returns the CE and the
    /// bytes written.
    pub fn allocate_mac_ce(&mut self, budget_bytes: u32) -> Option<(DlSchLcid, u32)> {
        let ce = *self.pending_ces.first()?;
        let required = MAC_CE_SUBHEADER_BYTES + ce.ce_size_bytes()?;
        if required > budget_bytes {
            return None;
        }
        self.pending_ces.remove(0);
        Some((ce, required))
    }

    /// Consume up to `budget_bytes` of one channel's pending data. Returns
    /// the total bytes written, subheader included.
    pub fn allocate_mac_sdu(&mut self, lcid: Lcid, budget_bytes: u32) -> u32 {
        let Some(ch) = self.channel_mut(lcid) else {
            return 0;
        };
        let payload = mac_sdu_payload_for_budget(budget_bytes).min(ch.pending_bytes);
        if payload == 0 {
            return 0;
        }
        ch.pending_bytes -= payload;
        mac_sdu_required_bytes(payload)
    }
}

/// UL per-UE logical channel state, fed by BSRs and SR indications.
#[derive(Debug, Clone, Default)]
pub struct UlLogicalChannelManager {
    lcg_pending_bytes: [u32; MAX_NOF_LCGS],
    sr_pending: bool,
}

impl UlLogicalChannelManager {
    /// Ingest a buffer status report for one logical channel group. The BSR
    /// carries the absolute amount pending at the UE.
    pub fn handle_bsr_indication(&mut self, lcg: usize, bytes: u32) {
        if lcg >= MAX_NOF_LCGS {
            warn!(lcg, "bsr for invalid lcg ignored");
            return;
        }
        self.lcg_pending_bytes[lcg] = bytes;
        debug!(lcg, bytes, "ul buffer state updated");
    }

    pub fn handle_sr_indication(&mut self) {
        self.sr_pending = true;
    }

    /// Clear the SR once an UL grant has been issued.
    pub fn reset_sr_indication(&mut self) {
        self.sr_pending = false;
    }

    pub fn has_pending_sr(&self) -> bool {
        self.sr_pending
    }

    /// Total UL bytes pending across all LCGs, per the last BSRs.
    /// Saturates instead of wrapping on extreme reports.
    pub fn pending_bytes(&self) -> u32 {
        self.lcg_pending_bytes
            .iter()
            .fold(0u32, |acc, &bytes| acc.saturating_add(bytes))
    }

    pub fn lcg_pending_bytes(&self, lcg: usize) -> u32 {
        self.lcg_pending_bytes.get(lcg).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn srb_configs() -> Vec<LogicalChannelConfig> {
        vec![
            LogicalChannelConfig {
                lcid: LCID_SRB0,
                priority: 0,
            },
            LogicalChannelConfig {
                lcid: LCID_SRB1,
                priority: 1,
            },
            LogicalChannelConfig { lcid: 4, priority: 5 },
        ]
    }

    #[test]
    fn test_mac_sdu_required_bytes() {
        assert_eq!(mac_sdu_required_bytes(0), 0);
        assert_eq!(mac_sdu_required_bytes(1), 3);
        assert_eq!(mac_sdu_required_bytes(255), 257);
        assert_eq!(mac_sdu_required_bytes(256), 259);
    }

    #[test]
    fn test_pending_bytes_accounting() {
        let mut mgr = DlLogicalChannelManager::default();
        mgr.configure(&srb_configs());
        assert_eq!(mgr.pending_bytes(), 0);

        mgr.handle_dl_buffer_state_indication(LCID_SRB1, 100);
        mgr.handle_dl_buffer_state_indication(4, 300);
        assert_eq!(mgr.lc_pending_bytes(LCID_SRB1), 102);
        assert_eq!(mgr.lc_pending_bytes(4), 303);
        assert_eq!(mgr.pending_bytes(), 102 + 303);

        // A later report overrides, it does not accumulate.
        mgr.handle_dl_buffer_state_indication(4, 50);
        assert_eq!(mgr.lc_pending_bytes(4), 52);
    }

    #[test]
    fn test_unconfigured_channel_is_absorbed() {
        let mut mgr = DlLogicalChannelManager::default();
        mgr.configure(&srb_configs());
        mgr.handle_dl_buffer_state_indication(9, 500);
        assert_eq!(mgr.pending_bytes(), 0);
    }

    #[test]
    fn test_reconfiguration_keeps_surviving_pending_counts() {
        let mut mgr = DlLogicalChannelManager::default();
        mgr.configure(&srb_configs());
        mgr.handle_dl_buffer_state_indication(LCID_SRB1, 40);
        mgr.handle_dl_buffer_state_indication(4, 60);

        mgr.configure(&[LogicalChannelConfig {
            lcid: LCID_SRB1,
            priority: 1,
        }]);
        assert_eq!(mgr.lc_pending_bytes(LCID_SRB1), 42);
        assert_eq!(mgr.lc_pending_bytes(4), 0);
    }

    #[test]
    fn test_con_res_id_ce_bytes() {
        let mut mgr = DlLogicalChannelManager::default();
        assert_eq!(mgr.pending_ue_con_res_id_ce_bytes(), 0);
        mgr.set_con_res_id_pending();
        assert_eq!(mgr.pending_ue_con_res_id_ce_bytes(), 7);

        // Too small a budget leaves the CE pending.
        assert_eq!(mgr.allocate_ue_con_res_id_ce(6), 0);
        assert!(mgr.is_con_res_id_pending());
        assert_eq!(mgr.allocate_ue_con_res_id_ce(7), 7);
        assert!(!mgr.is_con_res_id_pending());
        assert_eq!(mgr.allocate_ue_con_res_id_ce(7), 0);
    }

    #[test]
    fn test_ce_queue_allocation() {
        let mut mgr = DlLogicalChannelManager::default();
        mgr.enqueue_ce(DlSchLcid::TaCmd);
        assert_eq!(mgr.pending_ce_bytes(), 2);
        assert_eq!(mgr.allocate_mac_ce(1), None);
        assert_eq!(mgr.allocate_mac_ce(10), Some((DlSchLcid::TaCmd, 2)));
        assert_eq!(mgr.allocate_mac_ce(10), None);
    }

    #[test]
    fn test_sdu_allocation_decrements_pending() {
        let mut mgr = DlLogicalChannelManager::default();
        mgr.configure(&srb_configs());
        mgr.handle_dl_buffer_state_indication(4, 100);

        // Budget covers everything.
        assert_eq!(mgr.allocate_mac_sdu(4, 1000), 102);
        assert_eq!(mgr.lc_pending_bytes(4), 0);

        // Budget smaller than pending: partial allocation.
        mgr.handle_dl_buffer_state_indication(4, 100);
        assert_eq!(mgr.allocate_mac_sdu(4, 52), 52);
        assert_eq!(mgr.lc_pending_bytes(4), 52);

        // Budget below the minimum useful SDU yields nothing.
        assert_eq!(mgr.allocate_mac_sdu(4, 2), 0);
    }

    #[test]
    fn test_priority_ordering() {
        let mut mgr = DlLogicalChannelManager::default();
        mgr.configure(&srb_configs());
        mgr.handle_dl_buffer_state_indication(4, 10);
        mgr.handle_dl_buffer_state_indication(LCID_SRB1, 10);
        assert_eq!(mgr.prioritized_lcids(), vec![LCID_SRB1, 4]);
    }

    #[test]
    fn test_extreme_buffer_reports_saturate() {
        let mut mgr = DlLogicalChannelManager::default();
        mgr.configure(&srb_configs());
        mgr.handle_dl_buffer_state_indication(LCID_SRB1, u32::MAX);
        mgr.handle_dl_buffer_state_indication(4, u32::MAX);
        assert_eq!(mac_sdu_required_bytes(u32::MAX), u32::MAX);
        assert_eq!(mgr.lc_pending_bytes(4), u32::MAX);
        assert_eq!(mgr.pending_bytes(), u32::MAX);

        let mut ul = UlLogicalChannelManager::default();
        ul.handle_bsr_indication(0, u32::MAX);
        ul.handle_bsr_indication(1, u32::MAX);
        assert_eq!(ul.pending_bytes(), u32::MAX);
    }

    #[test]
    fn test_ul_bsr_and_sr() {
        let mut mgr = UlLogicalChannelManager::default();
        assert!(!mgr.has_pending_sr());
        assert_eq!(mgr.pending_bytes(), 0);

        mgr.handle_bsr_indication(0, 200);
        mgr.handle_bsr_indication(2, 100);
        assert_eq!(mgr.pending_bytes(), 300);
        assert_eq!(mgr.lcg_pending_bytes(2), 100);

        mgr.handle_bsr_indication(0, 0);
        assert_eq!(mgr.pending_bytes(), 100);

        // Invalid LCG is absorbed.
        mgr.handle_bsr_indication(9, 1000);
        assert_eq!(mgr.pending_bytes(), 100);

        mgr.handle_sr_indication();
        assert!(mgr.has_pending_sr());
        mgr.reset_sr_indication();
        assert!(!mgr.has_pending_sr());
    }
}
