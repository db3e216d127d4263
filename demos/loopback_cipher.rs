//! Loopback demo: build an AES-CBC session by hand (the real session
//! builder is an external collaborator out of scope for this crate),
//! submit one in-place encrypt op, and drain the response.
//!
//! No physical queue pair exists in this demo — the dispatch table and
//! ring pair are real, but there is no firmware on the other end to write
//! a completion, so this only demonstrates the enqueue half of the API
//! surface and the setup/teardown lifecycle.

use std::sync::Arc;

use bytemuck::Zeroable;

use qat_core::generation::DeviceGeneration;
use qat_core::op::{CipherParams, Operation};
use qat_core::session::{CipherAlgorithm, CipherDirection, CipherMode, HashAlgorithm, Session};
use qat_core::sgl::{Segment, VecBufferChain};
use qat_core::wire::{CommandId, CommonHeader, RequestDescriptor};
use qat_core::QueuePairConfig;

fn build_session() -> Arc<Session> {
    Arc::new(Session {
        command_id: CommandId::Cipher,
        cipher_algorithm: CipherAlgorithm::Aes128,
        cipher_mode: CipherMode::Cbc,
        cipher_direction: CipherDirection::Encrypt,
        hash_algorithm: HashAlgorithm::None,
        cipher_iv_offset: 0,
        cipher_iv_length: 16,
        auth_iv_offset: 0,
        auth_iv_length: 0,
        aad_length: 0,
        digest_length: 0,
        auth_key_length: 0,
        bpi_context: None,
        fw_request_template: RequestDescriptor {
            header: CommonHeader::zeroed_header(),
            mid: Zeroable::zeroed(),
            cipher: Zeroable::zeroed(),
            auth: Zeroable::zeroed(),
            cd_ctrl: Zeroable::zeroed(),
            _tail_pad: [0; 16],
        },
        min_device_generation: DeviceGeneration::Gen1,
    })
}

fn main() {
    let session = build_session();

    let mut plaintext = vec![0u8; 32];
    for (i, byte) in plaintext.iter_mut().enumerate() {
        *byte = i as u8;
    }
    let iova = plaintext.as_ptr() as u64;

    let mut op = Operation {
        session,
        source: Box::new(VecBufferChain { segments: vec![Segment { iova, data_len: plaintext.len() as u32 }] }),
        destination: None,
        cipher: CipherParams { offset: 0, length: plaintext.len() as u32, iv: [0; 16] },
        auth: Default::default(),
        aead: Default::default(),
        compression: Default::default(),
        status: Default::default(),
    };

    let mut pool = qat_core::cookie::CookiePool::new(8);
    let cookie = pool.get_mut(0);
    let mut slot = RequestDescriptor {
        header: CommonHeader::zeroed_header(),
        mid: Zeroable::zeroed(),
        cipher: Zeroable::zeroed(),
        auth: Zeroable::zeroed(),
        cd_ctrl: Zeroable::zeroed(),
        _tail_pad: [0; 16],
    };

    qat_core::request::symmetric::build_request(&mut op, &mut slot, cookie, DeviceGeneration::Gen4)
        .expect("request build should succeed for a well-formed in-place CBC op");

    println!(
        "built {} byte request descriptor: src_addr={:#x} src_len={}",
        std::mem::size_of::<RequestDescriptor>(),
        { slot.mid.src_data_addr },
        { slot.mid.src_length }
    );

    let config = QueuePairConfig::new(128, 128).expect("valid descriptor count");
    println!("queue-pair config ready for {} descriptors", config.nb_descriptors);
}
