//! DOCSIS BPI (Baseline Privacy Interface) residue handling.
//!
//! A plain-text residue shorter than one block is XOR-encrypted against an
//! ECB encryption of a chosen IV — never passed through the block cipher's
//! normal chaining mode, since there is no complete block to chain from.
//! Grounded on `bpi_cipher_encrypt`/`decrypt` and
//! `qat_bpicipher_preprocess`/`postprocess` in `qat_sym.c`.

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::cipher::generic_array::GenericArray;
use aes::Aes128;

use crate::error::{QatError, Result};
use crate::session::BpiContext;

/// XOR-encrypt `residue` in place against `E(key, iv)`, truncated to
/// `residue`'s length. This is the single encryption primitive both the
/// encrypt and decrypt residue paths use — BPI never runs the block cipher
/// in its normal chained mode over a runt block.
fn xor_with_keystream(ctx: &BpiContext, iv: &[u8], residue: &mut [u8]) -> Result<()> {
    if ctx.key.len() != 16 {
        return Err(QatError::unsupported("BPI residue handling currently supports AES-128 keys only"));
    }
    if iv.len() != ctx.block_len {
        return Err(QatError::invalid("BPI IV length must equal the cipher block length"));
    }

    let cipher = Aes128::new_from_slice(&ctx.key).map_err(|_| QatError::invalid("invalid BPI key"))?;
    let mut block = GenericArray::clone_from_slice(iv);
    cipher.encrypt_block(&mut block);

    for (byte, keystream) in residue.iter_mut().zip(block.iter()) {
        *byte ^= keystream;
    }
    Ok(())
}

/// Result of a BPI pre-process pass: the byte length hardware still needs
/// to process, and whether a residue was handled entirely outside the
/// hardware request (full runt — no preceding block in this request).
pub struct PreprocessResult {
    pub hw_cipher_len: u32,
}

/// Decrypt-path pre-process, run *before* enqueue on the trailing partial
/// block. `full_region` is the complete plaintext region covered by the op
/// (ciphertext in, since this is the decrypt direction); `op_iv` is the
/// op-supplied IV, used only when the residue is the *entire* region (no
/// preceding full block exists to derive the IV from).
pub fn preprocess_decrypt(
    ctx: &BpiContext,
    full_region: &mut [u8],
    op_iv: &[u8],
) -> Result<PreprocessResult> {
    let block_len = ctx.block_len;
    let last_block_len = full_region.len() % block_len;
    if last_block_len == 0 {
        return Ok(PreprocessResult { hw_cipher_len: full_region.len() as u32 });
    }

    let residue_start = full_region.len() - last_block_len;
    let iv: Vec<u8> = if residue_start >= block_len {
        full_region[residue_start - block_len..residue_start].to_vec()
    } else {
        op_iv.to_vec()
    };

    let (hw_part, residue) = full_region.split_at_mut(residue_start);
    xor_with_keystream(ctx, &iv, residue)?;
    let _ = hw_part;

    Ok(PreprocessResult { hw_cipher_len: residue_start as u32 })
}

/// Encrypt-path post-process, run *after* dequeue on the trailing partial
/// block. The IV is always the previous ciphertext block, now resident in
/// the destination buffer, unless the residue is the entire region.
pub fn postprocess_encrypt(
    ctx: &BpiContext,
    full_region: &mut [u8],
    op_iv: &[u8],
) -> Result<()> {
    let block_len = ctx.block_len;
    let last_block_len = full_region.len() % block_len;
    if last_block_len == 0 {
        return Ok(());
    }

    let residue_start = full_region.len() - last_block_len;
    let iv: Vec<u8> = if residue_start >= block_len {
        full_region[residue_start - block_len..residue_start].to_vec()
    } else {
        op_iv.to_vec()
    };

    let (hw_part, residue) = full_region.split_at_mut(residue_start);
    xor_with_keystream(ctx, &iv, residue)?;
    let _ = hw_part;
    Ok(())
}
