//! HARQ process state machine
//!
//! One process tracks a single in-flight transport block from its first
//! transmission through ACK or retransmission exhaustion. The process is a
//! closed timed state machine: when feedback never arrives, the per-slot
//! clock tick resolves the transmission as an implicit NACK, so the
//! scheduler keeps making forward progress over a lossy feedback channel.
//!
//! Two tiers of failure apply. `new_tx` on an occupied process and `new_retx`
//! without a pending retransmission are caller bugs in the real-time path and
//! panic. Feedback anomalies such as an ACK for an already-empty process are
//! expected over the air interface and surface as a [`HarqError`] the caller
//! logs and drops.

use thiserror::Error;
use tracing::{debug, warn};

use crate::grant::{DciDlRntiConfigType, DciUlRntiConfigType, PdschInformation, Rnti};
use crate::interval::PrbInterval;
use crate::slot::SlotPoint;
use crate::support::mcs::McsTable;

pub type HarqId = u8;

/// HARQ feedback verdict for one codeword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarqAck {
    Ack,
    Nack,
}

/// Expected runtime HARQ anomalies, absorbed by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarqError {
    #[error("harq process {0} is empty, feedback ignored")]
    ProcessEmpty(HarqId),

    #[error("harq process {0} has no codeword {1}")]
    InvalidCodeword(HarqId, usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum TbStatus {
    #[default]
    Empty,
    /// Transmitted, feedback outstanding until `slot_ack + max_ack_wait_slots`.
    WaitingAck,
    /// NACKed or timed out with retransmission budget remaining.
    PendingRetx,
}

/// Per-codeword retransmission state. The NDI survives occupancies: it is
/// toggled on every genuinely new transmission and held constant across
/// retransmissions of the same data.
#[derive(Debug, Clone, Copy, Default)]
struct HarqTbState {
    status: TbStatus,
    ndi: bool,
    nof_retxs: u32,
    max_nof_retxs: u32,
}

/// Saved allocation parameters of one DL codeword, reused on retransmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TbAllocParams {
    pub mcs_table: McsTable,
    pub mcs: u8,
    pub tbs_bytes: u32,
}

/// Last DL allocation of a HARQ process.
#[derive(Debug, Clone, PartialEq)]
pub struct DlHarqAllocParams {
    pub dci_cfg_type: DciDlRntiConfigType,
    pub prbs: PrbInterval,
    pub tb: [Option<TbAllocParams>; 2],
}

impl DlHarqAllocParams {
    /// Capture the parameters of a PDSCH grant.
    pub fn from_pdsch(dci_cfg_type: DciDlRntiConfigType, pdsch: &PdschInformation) -> Self {
        let mut tb = [None, None];
        for (slot, codeword) in tb.iter_mut().zip(&pdsch.codewords) {
            *slot = Some(TbAllocParams {
                mcs_table: codeword.mcs_table,
                mcs: codeword.mcs_index,
                tbs_bytes: codeword.tbs_bytes,
            });
        }
        Self {
            dci_cfg_type,
            prbs: pdsch.prbs,
            tb,
        }
    }
}

/// Last UL allocation of a HARQ process.
#[derive(Debug, Clone, PartialEq)]
pub struct UlHarqAllocParams {
    pub dci_cfg_type: DciUlRntiConfigType,
    pub prbs: PrbInterval,
    pub mcs_table: McsTable,
    pub mcs: u8,
    pub tbs_bytes: u32,
}

/// Retransmission state machine for one (UE, direction, HARQ id).
///
/// `N` is the number of codewords the process can carry (2 for DL, 1 for
/// UL); `P` the direction-specific allocation parameters retained for
/// retransmission re-use.
#[derive(Debug, Clone)]
pub struct HarqProcess<const N: usize, P> {
    id: HarqId,
    rnti: Rnti,
    max_ack_wait_slots: u32,
    slot_tx: Option<SlotPoint>,
    slot_ack: Option<SlotPoint>,
    tb: [HarqTbState; N],
    last_alloc: Option<P>,
}

/// DL process: up to two codewords.
pub type DlHarqProcess = HarqProcess<2, DlHarqAllocParams>;

/// UL process: a single codeword; the CRC result plays the role of the ACK.
pub type UlHarqProcess = HarqProcess<1, UlHarqAllocParams>;

impl<const N: usize, P> HarqProcess<N, P> {
    pub fn new(id: HarqId, rnti: Rnti, max_ack_wait_slots: u32) -> Self {
        Self {
            id,
            rnti,
            max_ack_wait_slots,
            slot_tx: None,
            slot_ack: None,
            tb: [HarqTbState::default(); N],
            last_alloc: None,
        }
    }

    pub fn id(&self) -> HarqId {
        self.id
    }

    /// True when no codeword is occupied.
    pub fn is_empty(&self) -> bool {
        self.tb.iter().all(|tb| tb.status == TbStatus::Empty)
    }

    pub fn tb_empty(&self, tb_idx: usize) -> bool {
        self.tb[tb_idx].status == TbStatus::Empty
    }

    pub fn has_pending_retx(&self) -> bool {
        self.tb.iter().any(|tb| tb.status == TbStatus::PendingRetx)
    }

    pub fn tb_has_pending_retx(&self, tb_idx: usize) -> bool {
        self.tb[tb_idx].status == TbStatus::PendingRetx
    }

    /// NDI bit of a codeword; meaningful while the process is occupied.
    pub fn tb_ndi(&self, tb_idx: usize) -> bool {
        self.tb[tb_idx].ndi
    }

    pub fn tb_nof_retxs(&self, tb_idx: usize) -> u32 {
        self.tb[tb_idx].nof_retxs
    }

    pub fn tb_max_nof_retxs(&self, tb_idx: usize) -> u32 {
        self.tb[tb_idx].max_nof_retxs
    }

    /// Slot of the last transmission, while occupied.
    pub fn slot_tx(&self) -> Option<SlotPoint> {
        self.slot_tx
    }

    /// Slot at which the ACK is expected (`slot_tx + k1`), while occupied.
    pub fn slot_ack(&self) -> Option<SlotPoint> {
        self.slot_ack
    }

    /// Start a new transmission on codeword 0.
    ///
    /// Panics if the process is occupied; scheduling a new transport block
    /// on a busy process is a caller bug that cannot be recovered mid-slot.
    pub fn new_tx(&mut self, slot_tx: SlotPoint, k1: u32, max_nof_retxs: u32) {
        assert!(
            self.is_empty(),
            "new_tx on non-empty harq process {} of rnti {:#06x}",
            self.id,
            self.rnti
        );
        let tb = &mut self.tb[0];
        tb.status = TbStatus::WaitingAck;
        tb.ndi = !tb.ndi;
        tb.nof_retxs = 0;
        tb.max_nof_retxs = max_nof_retxs;
        self.slot_tx = Some(slot_tx);
        self.slot_ack = Some(slot_tx + k1);
        self.last_alloc = None;
        debug!(
            rnti = self.rnti,
            harq_id = self.id,
            slot_tx = %slot_tx,
            k1,
            max_nof_retxs,
            ndi = tb.ndi,
            "harq new tx"
        );
    }

    /// Retransmit the held transport block. The NDI is left untouched so the
    /// receiver combines rather than flushes.
    ///
    /// Panics unless a retransmission is pending.
    pub fn new_retx(&mut self, slot_tx: SlotPoint, k1: u32) {
        assert!(
            self.tb[0].status == TbStatus::PendingRetx,
            "new_retx without pending retx on harq process {} of rnti {:#06x}",
            self.id,
            self.rnti
        );
        let tb = &mut self.tb[0];
        tb.status = TbStatus::WaitingAck;
        tb.nof_retxs += 1;
        self.slot_tx = Some(slot_tx);
        self.slot_ack = Some(slot_tx + k1);
        debug!(
            rnti = self.rnti,
            harq_id = self.id,
            slot_tx = %slot_tx,
            nof_retxs = tb.nof_retxs,
            "harq retx"
        );
    }

    /// Apply HARQ feedback for one codeword.
    ///
    /// An ACK empties the codeword. A NACK marks it retransmittable, or
    /// empties it when the retransmission budget is exhausted. Feedback for
    /// an empty process is an expected anomaly (duplicate or late report)
    /// and is reported back without state change.
    pub fn ack_info(&mut self, tb_idx: usize, ack: HarqAck) -> Result<(), HarqError> {
        if tb_idx >= N {
            return Err(HarqError::InvalidCodeword(self.id, tb_idx));
        }
        if self.tb[tb_idx].status == TbStatus::Empty {
            warn!(
                rnti = self.rnti,
                harq_id = self.id,
                tb_idx,
                "harq feedback for empty process ignored"
            );
            return Err(HarqError::ProcessEmpty(self.id));
        }
        match ack {
            HarqAck::Ack => {
                debug!(rnti = self.rnti, harq_id = self.id, tb_idx, "harq ack");
                self.reset_tb(tb_idx);
            }
            HarqAck::Nack => self.handle_nack(tb_idx),
        }
        Ok(())
    }

    /// Per-slot clock tick. A codeword whose feedback window
    /// (`slot_ack + max_ack_wait_slots`) has elapsed without a report is
    /// resolved as an implicit NACK.
    pub fn slot_indication(&mut self, now: SlotPoint) {
        let Some(slot_ack) = self.slot_ack else {
            return;
        };
        if slot_ack + self.max_ack_wait_slots > now {
            return;
        }
        for tb_idx in 0..N {
            if self.tb[tb_idx].status == TbStatus::WaitingAck {
                warn!(
                    rnti = self.rnti,
                    harq_id = self.id,
                    tb_idx,
                    slot = %now,
                    "harq ack wait timeout, assuming nack"
                );
                self.handle_nack(tb_idx);
            }
        }
    }

    /// Record the allocation chosen for the current occupancy.
    pub fn save_alloc_params(&mut self, params: P) {
        debug_assert!(!self.is_empty(), "alloc params saved on empty harq process");
        self.last_alloc = Some(params);
    }

    /// Allocation parameters of the last transmission, for retransmission
    /// re-use.
    pub fn last_alloc_params(&self) -> Option<&P> {
        self.last_alloc.as_ref()
    }

    /// Force the process back to empty. A no-op on an already-empty process.
    pub fn reset(&mut self) {
        for tb_idx in 0..N {
            self.reset_tb(tb_idx);
        }
    }

    fn handle_nack(&mut self, tb_idx: usize) {
        let tb = &mut self.tb[tb_idx];
        if tb.nof_retxs >= tb.max_nof_retxs {
            warn!(
                rnti = self.rnti,
                harq_id = self.id,
                tb_idx,
                nof_retxs = tb.nof_retxs,
                "harq retransmission budget exhausted, discarding tb"
            );
            self.reset_tb(tb_idx);
        } else {
            tb.status = TbStatus::PendingRetx;
        }
    }

    fn reset_tb(&mut self, tb_idx: usize) {
        let tb = &mut self.tb[tb_idx];
        // The NDI must survive so the next new_tx toggles it.
        tb.status = TbStatus::Empty;
        tb.nof_retxs = 0;
        tb.max_nof_retxs = 0;
        if self.is_empty() {
            self.slot_tx = None;
            self.slot_ack = None;
            self.last_alloc = None;
        }
    }
}
