//! PRB / transport-block sizing
//!
//! Table-driven transport block size determination per TS 38.214 clause
//! 5.1.3.2 (the N_info quantization and Table 5.1.3.2-1), and the inverse
//! search used by the scheduler: the minimum number of PRBs whose resulting
//! TBS covers a requested payload.
//!
//! Only the single-allocation regime (N_info <= 3824 bits) is implemented;
//! callers with larger payloads fall back to allocating the full BWP.

use crate::support::mcs::McsDescription;

/// Largest payload, in bits, the table-driven sizing can resolve exactly.
pub const MAX_SINGLE_ALLOC_BITS: u32 = 3824;

/// Hard cap on PRBs of any NR carrier.
pub const MAX_NOF_PRBS: u32 = 275;

/// A PRB never contributes more than 156 resource elements to N_info.
const MAX_NOF_RE_PER_PRB: u32 = 156;

const NOF_SUBCARRIERS_PER_PRB: u32 = 12;

/// TS 38.214 Table 5.1.3.2-1: TBS in bits for N_info <= 3824.
const TBS_TABLE_BITS: [u32; 93] = [
    24, 32, 40, 48, 56, 64, 72, 80, 88, 96, 104, 112, 120, 128, 136, 144, 152, 160, 168, 176, 184,
    192, 208, 224, 240, 256, 272, 288, 304, 320, 336, 352, 368, 384, 408, 432, 456, 480, 504, 528,
    552, 576, 608, 640, 672, 704, 736, 768, 808, 848, 888, 928, 984, 1032, 1064, 1128, 1160, 1192,
    1224, 1256, 1288, 1320, 1352, 1416, 1480, 1544, 1608, 1672, 1736, 1800, 1864, 1928, 2024, 2088,
    2152, 2216, 2280, 2408, 2472, 2536, 2600, 2664, 2728, 2792, 2856, 2976, 3104, 3240, 3368, 3496,
    3624, 3752, 3824,
];

/// Inputs of the PRB/TBS sizing for one candidate allocation.
#[derive(Debug, Clone)]
pub struct PrbsCalculatorConfig {
    /// Payload the allocation must carry, in bytes.
    pub payload_size_bytes: u32,
    /// Number of OFDM symbols of the shared channel allocation.
    pub nof_symb_sh: u32,
    /// DMRS resource elements per PRB over the whole allocation.
    pub nof_dmrs_prb: u32,
    /// Additional overhead resource elements per PRB (xOverhead).
    pub nof_oh_prb: u32,
    pub mcs: McsDescription,
    pub nof_layers: u32,
}

/// Result of the minimal-PRB search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrbsTbs {
    pub nof_prbs: u32,
    pub tbs_bytes: u32,
}

fn nof_re_per_prb(cfg: &PrbsCalculatorConfig) -> u32 {
    let grid = NOF_SUBCARRIERS_PER_PRB * cfg.nof_symb_sh;
    grid.saturating_sub(cfg.nof_dmrs_prb + cfg.nof_oh_prb)
        .min(MAX_NOF_RE_PER_PRB)
}

/// TBS in bytes yielded by `nof_prbs` PRBs under the given configuration.
///
/// Implements the N_info <= 3824 branch of TS 38.214 5.1.3.2; larger
/// intermediate values saturate at the last table entry.
pub fn tbs_bytes_for_prbs(nof_prbs: u32, cfg: &PrbsCalculatorConfig) -> u32 {
    let n_re = nof_re_per_prb(cfg) * nof_prbs;
    if n_re == 0 {
        return 0;
    }
    let n_info =
        n_re as f64 * cfg.mcs.code_rate() as f64 * cfg.mcs.modulation.order() as f64 * cfg.nof_layers as f64;
    if n_info < 1.0 {
        return TBS_TABLE_BITS[0] / 8;
    }
    let n = ((n_info as u32).ilog2().saturating_sub(6)).max(3);
    let quantized = (((n_info / (1u64 << n) as f64) as u32) << n).max(24);
    let tbs_bits = TBS_TABLE_BITS
        .iter()
        .copied()
        .find(|&tbs| tbs >= quantized)
        .unwrap_or(MAX_SINGLE_ALLOC_BITS);
    tbs_bits / 8
}

/// Minimum PRB count whose TBS covers `payload_size_bytes`, and that TBS.
///
/// If even `MAX_NOF_PRBS` cannot cover the payload (the table saturates at
/// 3824 bits), the search returns the cap; the caller is expected to have
/// applied the full-BWP fallback before getting here.
pub fn get_nof_prbs(cfg: &PrbsCalculatorConfig) -> PrbsTbs {
    if cfg.payload_size_bytes == 0 {
        return PrbsTbs {
            nof_prbs: 0,
            tbs_bytes: 0,
        };
    }
    let re_per_prb = nof_re_per_prb(cfg);
    if re_per_prb == 0 {
        return PrbsTbs {
            nof_prbs: 0,
            tbs_bytes: 0,
        };
    }

    // First estimate from the un-quantized rate, then refine in both
    // directions so the result is the exact minimum.
    let bits_per_prb = re_per_prb as f64
        * cfg.mcs.code_rate() as f64
        * cfg.mcs.modulation.order() as f64
        * cfg.nof_layers as f64;
    let mut nof_prbs = ((cfg.payload_size_bytes as f64 * 8.0 / bits_per_prb).ceil() as u32)
        .clamp(1, MAX_NOF_PRBS);

    while nof_prbs < MAX_NOF_PRBS && tbs_bytes_for_prbs(nof_prbs, cfg) < cfg.payload_size_bytes {
        nof_prbs += 1;
    }
    while nof_prbs > 1 && tbs_bytes_for_prbs(nof_prbs - 1, cfg) >= cfg.payload_size_bytes {
        nof_prbs -= 1;
    }

    PrbsTbs {
        nof_prbs,
        tbs_bytes: tbs_bytes_for_prbs(nof_prbs, cfg),
    }
}
