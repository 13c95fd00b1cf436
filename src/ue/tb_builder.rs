//! Transport block multiplexing
//!
//! Fills a transport block of a given byte budget in strict priority order:
//! the contention-resolution CE first, then other pending MAC CEs, then
//! logical-channel SDUs in descending channel priority. Every step consumes
//! the corresponding pending state in the DL logical channel manager.

use crate::grant::{DlMsgLcInfo, DlMsgTbInfo, DlSchLcid};
use crate::logical_channel::DlLogicalChannelManager;

/// Multiplex the UE contention-resolution identity CE, if pending and
/// fitting. Returns the bytes written.
pub fn allocate_ue_con_res_id_mac_ce(
    tb_info: &mut DlMsgTbInfo,
    lc_mgr: &mut DlLogicalChannelManager,
    budget_bytes: u32,
) -> u32 {
    let written = lc_mgr.allocate_ue_con_res_id_ce(budget_bytes);
    if written > 0 {
        tb_info.subpdus.push(DlMsgLcInfo {
            lcid: DlSchLcid::UeConResId,
            sched_bytes: written,
        });
    }
    written
}

/// Multiplex pending MAC CEs, contention resolution first. Returns the total
/// bytes written.
pub fn allocate_mac_ces(
    tb_info: &mut DlMsgTbInfo,
    lc_mgr: &mut DlLogicalChannelManager,
    budget_bytes: u32,
) -> u32 {
    let mut total = allocate_ue_con_res_id_mac_ce(tb_info, lc_mgr, budget_bytes);
    while let Some((ce, written)) = lc_mgr.allocate_mac_ce(budget_bytes - total) {
        tb_info.subpdus.push(DlMsgLcInfo {
            lcid: ce,
            sched_bytes: written,
        });
        total += written;
    }
    total
}

/// Multiplex logical-channel SDUs in priority order. Returns the total bytes
/// written.
pub fn allocate_mac_sdus(
    tb_info: &mut DlMsgTbInfo,
    lc_mgr: &mut DlLogicalChannelManager,
    budget_bytes: u32,
) -> u32 {
    let mut total = 0;
    for lcid in lc_mgr.prioritized_lcids() {
        if total >= budget_bytes {
            break;
        }
        let written = lc_mgr.allocate_mac_sdu(lcid, budget_bytes - total);
        if written > 0 {
            tb_info.subpdus.push(DlMsgLcInfo {
                lcid: DlSchLcid::Sdu(lcid),
                sched_bytes: written,
            });
            total += written;
        }
    }
    total
}

/// Multiplex one logical channel only, for the SRB0 fallback path.
pub fn allocate_mac_sdu(
    tb_info: &mut DlMsgTbInfo,
    lc_mgr: &mut DlLogicalChannelManager,
    lcid: u8,
    budget_bytes: u32,
) -> u32 {
    let written = lc_mgr.allocate_mac_sdu(lcid, budget_bytes);
    if written > 0 {
        tb_info.subpdus.push(DlMsgLcInfo {
            lcid: DlSchLcid::Sdu(lcid),
            sched_bytes: written,
        });
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical_channel::{LCID_SRB0, LCID_SRB1, LogicalChannelConfig};

    fn make_mgr() -> DlLogicalChannelManager {
        let mut mgr = DlLogicalChannelManager::default();
        mgr.configure(&[
            LogicalChannelConfig {
                lcid: LCID_SRB0,
                priority: 0,
            },
            LogicalChannelConfig {
                lcid: LCID_SRB1,
                priority: 1,
            },
            LogicalChannelConfig { lcid: 4, priority: 6 },
        ]);
        mgr
    }

    #[test]
    fn test_ces_come_before_sdus() {
        let mut mgr = make_mgr();
        mgr.set_con_res_id_pending();
        mgr.handle_dl_buffer_state_indication(LCID_SRB1, 20);

        let mut tb_info = DlMsgTbInfo::default();
        let mut total = allocate_mac_ces(&mut tb_info, &mut mgr, 100);
        total += allocate_mac_sdus(&mut tb_info, &mut mgr, 100 - total);

        assert_eq!(total, 7 + 22);
        assert_eq!(tb_info.subpdus.len(), 2);
        assert_eq!(tb_info.subpdus[0].lcid, DlSchLcid::UeConResId);
        assert_eq!(tb_info.subpdus[1].lcid, DlSchLcid::Sdu(LCID_SRB1));
    }

    #[test]
    fn test_sdus_follow_channel_priority() {
        let mut mgr = make_mgr();
        mgr.handle_dl_buffer_state_indication(4, 30);
        mgr.handle_dl_buffer_state_indication(LCID_SRB1, 30);

        let mut tb_info = DlMsgTbInfo::default();
        let total = allocate_mac_sdus(&mut tb_info, &mut mgr, 1000);

        assert_eq!(total, 64);
        assert_eq!(tb_info.subpdus[0].lcid, DlSchLcid::Sdu(LCID_SRB1));
        assert_eq!(tb_info.subpdus[1].lcid, DlSchLcid::Sdu(4));
    }

    #[test]
    fn test_budget_caps_lower_priority_channels() {
        let mut mgr = make_mgr();
        mgr.handle_dl_buffer_state_indication(LCID_SRB1, 40);
        mgr.handle_dl_buffer_state_indication(4, 40);

        let mut tb_info = DlMsgTbInfo::default();
        // Covers SRB1 fully (42 bytes) and 8 bytes of LCID 4.
        let total = allocate_mac_sdus(&mut tb_info, &mut mgr, 50);

        assert_eq!(total, 50);
        assert_eq!(tb_info.subpdus[0].sched_bytes, 42);
        assert_eq!(tb_info.subpdus[1].sched_bytes, 8);
        assert_eq!(mgr.lc_pending_bytes(4), 36);
    }

    #[test]
    fn test_srb0_only_allocation_skips_other_channels() {
        let mut mgr = make_mgr();
        mgr.handle_dl_buffer_state_indication(LCID_SRB0, 10);
        mgr.handle_dl_buffer_state_indication(4, 100);

        let mut tb_info = DlMsgTbInfo::default();
        let written = allocate_mac_sdu(&mut tb_info, &mut mgr, LCID_SRB0, 1000);

        assert_eq!(written, 12);
        assert_eq!(tb_info.subpdus.len(), 1);
        assert_eq!(mgr.lc_pending_bytes(4), 103);
    }
}
