//! Application-supplied operation data model.
//!
//! An `Operation` carries the caller's buffer chain(s) and per-service
//! sub-structures; the core never allocates or owns this data, only reads
//! offsets/lengths out of it and writes a status back in.

use std::sync::Arc;

use crate::error::OpStatus;
use crate::session::Session;
use crate::sgl::BufferChain;

#[derive(Debug, Clone, Copy)]
pub struct CipherParams {
    pub offset: u32,
    pub length: u32,
    /// The operation's actual IV bytes, left-aligned, valid for the
    /// session's `cipher_iv_length`. Copied into the request descriptor's
    /// inline IV field at build time; IVs longer than 16 bytes (pointer
    /// form) are not modeled.
    pub iv: [u8; 16],
}

impl Default for CipherParams {
    fn default() -> Self {
        Self { offset: 0, length: 0, iv: [0; 16] }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthParams {
    pub offset: u32,
    pub length: u32,
    pub digest_phys_addr: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AeadParams {
    pub aad_phys_addr: u64,
    pub aad_length: u16,
}

/// Compression/decompression source and destination geometry, distinct
/// from the crypto-specific `CipherParams`/`AuthParams`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressionParams {
    pub src_offset: u32,
    pub src_length: u32,
    pub dst_length: u32,
}

/// One request submitted to a queue pair. `source`/`destination` are
/// generic buffer chains (see `sgl::BufferChain`); `destination` absent
/// means in-place.
pub struct Operation {
    pub session: Arc<Session>,
    pub source: Box<dyn BufferChain>,
    pub destination: Option<Box<dyn BufferChain>>,
    pub cipher: CipherParams,
    pub auth: AuthParams,
    pub aead: AeadParams,
    pub compression: CompressionParams,
    pub status: OpStatus,
}

impl Operation {
    pub fn is_out_of_place(&self) -> bool {
        self.destination.is_some()
    }

    pub fn dest(&self) -> &dyn BufferChain {
        self.destination.as_deref().unwrap_or(self.source.as_ref())
    }
}
