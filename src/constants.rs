//! Core constants for ring sizing, CSR flush thresholds, and descriptor
//! geometry. Grounded on `qat_qp.h`/`qat_qp.c`'s `ADF_*`/`QAT_*` `#define`s.

/// Empty-slot sentinel byte. Rings are scrubbed to this value so the
/// 32-bit sentinel word `0x7F7F7F7F` marks an unconsumed/unpublished slot.
pub const EMPTY_SLOT_BYTE: u8 = 0x7F;
pub const EMPTY_SLOT_SIGNATURE: u32 = 0x7F7F7F7F;

/// Fixed descriptor sizes per service, in bytes.
pub const SYM_COMP_MSG_SIZE: u32 = 128;
pub const ASYM_MSG_SIZE: u32 = 64;
pub const RESPONSE_MSG_SIZE: u32 = 32;

/// Descriptor-count bounds for queue-pair setup (power-of-two ring sizes
/// between these, in descriptors).
pub const MIN_QUEUE_DESCRIPTORS: u32 = 2;
pub const MAX_QUEUE_DESCRIPTORS: u32 = 32768;

/// Safety margin subtracted from raw descriptor capacity when computing
/// `max_inflights` — the ring can never be driven completely full, since a
/// full ring is indistinguishable from an empty one under the head==tail
/// convention.
pub const QUEUE_SAFETY_MARGIN: u32 = 1;

/// Deferred CSR-flush thresholds (`qat_qp.c`: `QAT_CSR_TAIL_WRITE_THRESH`,
/// `QAT_CSR_TAIL_FORCE_WRITE_THRESH`, `QAT_CSR_HEAD_WRITE_THRESH`).
pub const TAIL_WRITE_THRESH: u32 = 32;
pub const TAIL_FORCE_WRITE_THRESH: u16 = 8;
pub const HEAD_WRITE_THRESH: u32 = 32;

/// Maximum scatter-gather entries per list.
pub const SGL_MAX_SEGMENTS: usize = 16;

/// 64-byte DMA alignment mask used when picking an in-place SGL start
/// offset (`QAT_64_BYTE_ALIGN_MASK`).
pub const QAT_64_BYTE_ALIGN_MASK: u64 = !0x3Fu64;

/// CCM AAD formatting constants (`ICP_QAT_HW_CCM_*`).
pub const CCM_AAD_B0_LEN: usize = 16;
pub const CCM_AAD_DATA_OFFSET: usize = 18;
pub const CCM_NONCE_OFFSET: usize = 1;
