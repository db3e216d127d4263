//! Response dispatcher.
//!
//! Grounded on `qat_sym_process_response` in `qat_sym.c`: recover the
//! opaque operation pointer, map firmware status into the application
//! status taxonomy, run BPI post-processing when the session carries a
//! BPI context, and hand the op back to the caller.

use crate::bpi;
use crate::checksum;
use crate::cookie::Cookie;
use crate::error::OpStatus;
use crate::op::Operation;
use crate::wire::ResponseDescriptor;

/// Process one 32-byte completion. Returns the recovered operation
/// pointer (as handed back through the dequeue loop's output array); the
/// caller is responsible for converting it back into a live reference —
/// this crate never dereferences it itself beyond what's needed to write
/// `status` and run BPI post-processing.
///
/// # Safety
/// `resp.opaque_data` must be a pointer previously written by a request
/// builder from a live `&mut Operation` that has not been dropped.
pub unsafe fn process_response(resp: &ResponseDescriptor, _cookie: &Cookie) -> *mut Operation {
    let op_ptr = resp.opaque_data as *mut Operation;
    let op = &mut *op_ptr;

    if resp.is_ok() {
        op.status = OpStatus::Success;
    } else {
        op.status = OpStatus::AuthFailed;
    }

    if op.status == OpStatus::Success {
        if let Some(bpi_ctx) = op.session.bpi_context.clone() {
            // Encrypt-path post-process: the previous ciphertext block is
            // now resident in the destination buffer the device just
            // wrote. `build_request` only ever admits single-segment,
            // in-place BPI ops, so the same region is always resolvable
            // here.
            let region = unsafe { crate::sgl::single_segment_region_mut(op.dest(), op.cipher.offset as u64, op.cipher.length) };
            if let Ok(region) = region {
                let iv_len = bpi_ctx.block_len.min(op.cipher.iv.len());
                let _ = run_bpi_postprocess(&bpi_ctx, region, &op.cipher.iv[..iv_len]);
            }
        }
    }

    op_ptr
}

/// Compression-service post-process: copy produced length and checksums
/// back into the op on success.
pub struct CompressionResult {
    pub produced_length: u32,
    pub crc32: u32,
    pub adler32: u32,
}

pub fn compression_postprocess(output: &[u8]) -> CompressionResult {
    CompressionResult {
        produced_length: output.len() as u32,
        crc32: checksum::crc32(output),
        adler32: checksum::adler32(output),
    }
}

/// Run the BPI encrypt-path post-process on the caller-owned destination
/// slice, now that the device has completed the hardware-visible portion.
/// Kept as a standalone entry point (rather than folded into
/// `process_response`) because the dispatcher above never holds a mutable
/// borrow of the op's own buffers.
pub fn run_bpi_postprocess(
    bpi_ctx: &crate::session::BpiContext,
    destination: &mut [u8],
    op_iv: &[u8],
) -> crate::error::Result<()> {
    bpi::postprocess_encrypt(bpi_ctx, destination, op_iv)
}
