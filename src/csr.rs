//! Volatile CSR (control/status register) access.
//!
//! `ADF_CSR_WR`/`ADF_CSR_RD` in the original driver distill to a volatile
//! memory access plus an ordering fence relative to DMA-coherent stores —
//! prior descriptor writes must be visible to the device before a tail or
//! head pointer update is observed. This module encodes that pair
//! explicitly rather than relying on plain reads/writes, per the design
//! notes ("CSR writes ... encode as explicit fence + volatile store
//! wrappers, never as regular memory writes").

use std::sync::atomic::{fence, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// A memory-mapped register bank. Owns the base pointer handed out by PCI
/// BAR mapping (out of scope here — the core only ever receives this
/// already-mapped window).
pub struct Bar {
    base: *mut u8,
    len: usize,
}

// The BAR is a fixed hardware-backed memory window; concurrent CSR writes
// to *different* offsets from different queue pairs are safe by
// construction (each QP owns disjoint offsets), and the one offset that is
// genuinely shared — arbiter enable — is protected by `ArbiterLock` below.
unsafe impl Send for Bar {}
unsafe impl Sync for Bar {}

impl Bar {
    /// # Safety
    /// `base` must point to a valid, live MMIO mapping of at least `len`
    /// bytes for the lifetime of this `Bar`.
    pub unsafe fn new(base: *mut u8, len: usize) -> Self {
        Self { base, len }
    }

    #[inline]
    fn check_offset(&self, offset: u32, width: usize) {
        debug_assert!(
            (offset as usize) + width <= self.len,
            "CSR offset {offset:#x} out of BAR bounds ({} bytes)",
            self.len
        );
    }

    /// Release-ordered 32-bit CSR write: a fence precedes the store so any
    /// prior DMA-coherent descriptor writes are globally visible first.
    #[inline]
    pub fn write32(&self, offset: u32, value: u32) {
        self.check_offset(offset, 4);
        fence(Ordering::Release);
        unsafe {
            let ptr = self.base.add(offset as usize) as *mut u32;
            std::ptr::write_volatile(ptr, value);
        }
    }

    /// Acquire-ordered 32-bit CSR read.
    #[inline]
    pub fn read32(&self, offset: u32) -> u32 {
        self.check_offset(offset, 4);
        let value = unsafe {
            let ptr = self.base.add(offset as usize) as *const u32;
            std::ptr::read_volatile(ptr)
        };
        fence(Ordering::Acquire);
        value
    }
}

/// Per-device spinlock guarding the shared arbiter-enable register.
/// `adf_queue_arb_enable`/`disable` in the original driver take
/// `accel_dev->arb_csr_lock`; `parking_lot::Mutex` gives cheap
/// uncontended locking for the same short critical section here.
#[derive(Clone)]
pub struct ArbiterLock {
    inner: Arc<Mutex<()>>,
}

impl ArbiterLock {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(())) }
    }

    /// Set the arbiter-enable bit for `ring` within `bundle`'s bitmask.
    pub fn enable(&self, bar: &Bar, offset: u32, ring: u8) {
        let _guard = self.inner.lock();
        let current = bar.read32(offset);
        bar.write32(offset, current | (1u32 << ring));
    }

    /// Clear the arbiter-enable bit for `ring` within `bundle`'s bitmask.
    pub fn disable(&self, bar: &Bar, offset: u32, ring: u8) {
        let _guard = self.inner.lock();
        let current = bar.read32(offset);
        bar.write32(offset, current & !(1u32 << ring));
    }
}

impl Default for ArbiterLock {
    fn default() -> Self {
        Self::new()
    }
}
