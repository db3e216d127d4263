//! Opaque session data model.
//!
//! The session *builder* — key/HMAC/content-descriptor construction — is an
//! external collaborator out of scope here. This core only reads
//! the fields a builder is allowed to hand over: algorithm selection, IV/AAD
//! geometry, an optional BPI context, and a pre-built 128-byte request
//! template with the session's immutable fields already filled in.

use crate::generation::DeviceGeneration;
use crate::wire::{CommandId, RequestDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherAlgorithm {
    Aes128,
    Aes192,
    Aes256,
    Des,
    TripleDes,
    Snow3g,
    Kasumi,
    Zuc,
    ChaCha20,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherMode {
    Ecb,
    Cbc,
    Ctr,
    Gcm,
    Ccm,
    AeadChaChaPoly,
    F8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherDirection {
    Encrypt,
    Decrypt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    None,
    Sha1Hmac,
    Sha256Hmac,
    Sha384Hmac,
    Sha512Hmac,
    AesCbcMac,
    AesGcm,
    AesCcm,
    Zuc256Eia3,
}

/// DOCSIS BPI block-cipher context (builder-constructed; the core only
/// reads `block_len` and the encryption key handle needed to run the
/// ECB+XOR residue pass).
#[derive(Debug, Clone)]
pub struct BpiContext {
    pub block_len: usize,
    /// Opaque key material handed to the ECB primitive; this core does not
    /// interpret it, only forwards it to the cipher backend.
    pub key: Vec<u8>,
}

/// A fully built, immutable session. The core treats this as read-shared
/// across many queue pairs — builders copy the template out per request,
/// so no session field is ever mutated after construction.
#[derive(Debug, Clone)]
pub struct Session {
    pub command_id: CommandId,
    pub cipher_algorithm: CipherAlgorithm,
    pub cipher_mode: CipherMode,
    pub cipher_direction: CipherDirection,
    pub hash_algorithm: HashAlgorithm,

    pub cipher_iv_offset: u16,
    pub cipher_iv_length: u16,
    pub auth_iv_offset: u16,
    pub auth_iv_length: u16,

    pub aad_length: u16,
    pub digest_length: u16,
    pub auth_key_length: u16,

    pub bpi_context: Option<BpiContext>,

    pub fw_request_template: RequestDescriptor,

    pub min_device_generation: DeviceGeneration,
}

impl Session {
    pub fn is_bit_oriented(&self) -> bool {
        matches!(
            self.cipher_algorithm,
            CipherAlgorithm::Snow3g | CipherAlgorithm::Kasumi | CipherAlgorithm::Zuc
        )
    }

    pub fn is_aead(&self) -> bool {
        matches!(self.cipher_mode, CipherMode::Gcm | CipherMode::Ccm | CipherMode::AeadChaChaPoly)
            || (self.cipher_mode == CipherMode::Ctr && self.hash_algorithm == HashAlgorithm::AesCbcMac)
    }
}
