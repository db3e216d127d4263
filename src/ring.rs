//! Ring pair: the paired TX (request) / RX (response) circular buffers
//! backing one queue pair.
//!
//! Grounded on `qat_queue_create`/`qat_qp.h`'s `struct qat_queue`: DMA
//! memory filled with the empty-slot sentinel byte at creation, a
//! power-of-two byte size aligned to itself, and head/tail tracked both in
//! local state and shadow CSR registers.

use crate::constants::{
    EMPTY_SLOT_BYTE, EMPTY_SLOT_SIGNATURE, MAX_QUEUE_DESCRIPTORS, MIN_QUEUE_DESCRIPTORS,
    QUEUE_SAFETY_MARGIN,
};
use crate::error::{QatError, Result};

/// One direction of a ring pair (TX or RX), backed by DMA-coherent memory
/// this crate owns as a boxed byte slice (allocation/memzone naming is the
/// external collaborator's job; the core receives an already-sized,
/// already-aligned buffer).
pub struct Ring {
    buffer: Box<[u8]>,
    pub message_size: u32,
    pub queue_size: u32,
    pub modulo: u32,
    pub max_inflights: u32,
    pub head: u32,
    pub tail: u32,
    pub csr_head: u32,
    pub csr_tail: u32,
    pub pending_requests: u32,
    pub processed_responses: u32,
    pub hw_bundle_number: u8,
    pub hw_queue_number: u8,
}

impl Ring {
    /// Create a ring of `nb_descriptors` slots of `message_size` bytes,
    /// scrubbed to the empty-slot sentinel. Fails with `Invalid` if the
    /// descriptor count is out of `MIN..=MAX` or not a power of two.
    pub fn new(nb_descriptors: u32, message_size: u32, hw_bundle_number: u8, hw_queue_number: u8) -> Result<Self> {
        if !(MIN_QUEUE_DESCRIPTORS..=MAX_QUEUE_DESCRIPTORS).contains(&nb_descriptors)
            || !nb_descriptors.is_power_of_two()
        {
            return Err(QatError::invalid(format!(
                "nb_descriptors {nb_descriptors} must be a power of two in [{MIN_QUEUE_DESCRIPTORS}, {MAX_QUEUE_DESCRIPTORS}]"
            )));
        }

        let queue_size = nb_descriptors
            .checked_mul(message_size)
            .ok_or_else(|| QatError::invalid("queue size overflow"))?;

        let mut buffer = vec![0u8; queue_size as usize].into_boxed_slice();
        buffer.fill(EMPTY_SLOT_BYTE);

        Ok(Self {
            buffer,
            message_size,
            queue_size,
            modulo: queue_size - 1,
            max_inflights: nb_descriptors - QUEUE_SAFETY_MARGIN,
            head: 0,
            tail: 0,
            csr_head: 0,
            csr_tail: 0,
            pending_requests: 0,
            processed_responses: 0,
            hw_bundle_number,
            hw_queue_number,
        })
    }

    /// Alignment invariant required before the base-address CSR is
    /// written: `((queue_size - 1) & base_phys) == 0`.
    pub fn base_is_aligned(&self, base_phys: u64) -> bool {
        (self.modulo as u64) & base_phys == 0
    }

    #[inline]
    fn slot_index(&self, offset: u32) -> usize {
        offset as usize
    }

    /// Whether the slot at `offset` still carries the empty-slot sentinel
    /// (nothing published there yet).
    pub fn slot_is_empty(&self, offset: u32) -> bool {
        let idx = self.slot_index(offset);
        let word = &self.buffer[idx..idx + 4];
        u32::from_le_bytes([word[0], word[1], word[2], word[3]]) == EMPTY_SLOT_SIGNATURE
    }

    pub fn slot_mut(&mut self, offset: u32) -> &mut [u8] {
        let idx = self.slot_index(offset);
        &mut self.buffer[idx..idx + self.message_size as usize]
    }

    pub fn slot(&self, offset: u32) -> &[u8] {
        let idx = self.slot_index(offset);
        &self.buffer[idx..idx + self.message_size as usize]
    }

    #[inline]
    pub fn advance(&self, offset: u32) -> u32 {
        (offset + self.message_size) & self.modulo
    }

    /// Scrub the consumed range `[old_head, new_head)` back to the
    /// empty-slot sentinel, so a stale slot never re-reads as "published".
    /// Handles the wraparound case in two passes exactly as
    /// `rxq_free_desc` does: `[old_head, end)` then `[0, new_head)`.
    pub fn scrub(&mut self, old_head: u32, new_head: u32) {
        if new_head >= old_head {
            self.buffer[old_head as usize..new_head as usize].fill(EMPTY_SLOT_BYTE);
        } else {
            let len = self.buffer.len();
            self.buffer[old_head as usize..len].fill(EMPTY_SLOT_BYTE);
            self.buffer[0..new_head as usize].fill(EMPTY_SLOT_BYTE);
        }
    }
}

/// A paired TX/RX ring for one queue pair.
pub struct RingPair {
    pub tx: Ring,
    pub rx: Ring,
}

impl RingPair {
    pub fn new(nb_descriptors: u32, tx_message_size: u32, hw_bundle_number: u8, tx_queue_number: u8, rx_queue_number: u8) -> Result<Self> {
        let tx = Ring::new(nb_descriptors, tx_message_size, hw_bundle_number, tx_queue_number)?;
        let rx = Ring::new(nb_descriptors, crate::constants::RESPONSE_MSG_SIZE, hw_bundle_number, rx_queue_number)?;
        Ok(Self { tx, rx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_power_of_two_descriptor_count() {
        assert!(Ring::new(100, 128, 0, 0).is_err());
    }

    #[test]
    fn rejects_out_of_bounds_descriptor_count() {
        assert!(Ring::new(1, 128, 0, 0).is_err());
        assert!(Ring::new(MAX_QUEUE_DESCRIPTORS * 2, 128, 0, 0).is_err());
    }

    #[test]
    fn new_ring_is_scrubbed_to_sentinel_everywhere() {
        let ring = Ring::new(8, 128, 0, 0).unwrap();
        assert!(ring.slot_is_empty(0));
        assert!(ring.slot_is_empty(128));
    }

    #[test]
    fn max_inflights_reserves_safety_margin() {
        let ring = Ring::new(128, 128, 0, 0).unwrap();
        assert_eq!(ring.max_inflights, 127);
    }

    #[test]
    fn scrub_handles_wraparound() {
        let mut ring = Ring::new(8, 128, 0, 0).unwrap();
        ring.slot_mut(7 * 128).fill(0xAA);
        ring.slot_mut(0).fill(0xAA);
        ring.scrub(7 * 128, 128);
        assert!(ring.slot_is_empty(7 * 128));
        assert!(ring.slot_is_empty(0));
    }

    proptest::proptest! {
        #[test]
        fn advance_always_stays_within_queue_bounds(nb_descriptors in 1u32..=10, start_slot in 0u32..1024) {
            let nb_descriptors = 1u32 << nb_descriptors; // power of two in [2, 1024]
            let ring = Ring::new(nb_descriptors, 128, 0, 0).unwrap();
            let offset = (start_slot * 128) & ring.modulo;
            let next = ring.advance(offset);
            prop_assert!(next < ring.queue_size);
            prop_assert_eq!(next % ring.message_size, 0);
        }
    }
}
