//! Queue-pair engine: admission control, the enqueue/dequeue burst loop,
//! and the `IDLE -> ACTIVE -> DRAINING -> RELEASED` state machine.
//!
//! Grounded on `qat_enqueue_op_burst`/`qat_dequeue_op_burst` and
//! `qat_sym_qp_setup`/`qat_sym_qp_release` in `qat_qp.c`.

use crate::constants::{HEAD_WRITE_THRESH, TAIL_FORCE_WRITE_THRESH, TAIL_WRITE_THRESH};
use crate::cookie::CookiePool;
use crate::csr::{ArbiterLock, Bar};
use crate::error::{OpStatus, QatError, Result};
use crate::generation::{check_generation_floor, DeviceGeneration};
use crate::insights;
use crate::metrics::{QpStats, QpStatsSnapshot};
use crate::op::Operation;
use crate::request::BuildRequestFn;
use crate::response::process_response;
use crate::ring::RingPair;
use crate::wire::ResponseDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QpState {
    Idle,
    Active,
    Draining,
    Released,
}

/// Configuration for queue-pair setup: a power-of-two, bounds-checked
/// builder over descriptor count, message size, and bundle/queue routing.
pub struct QueuePairConfig {
    pub nb_descriptors: u32,
    pub tx_message_size: u32,
    pub hw_bundle_number: u8,
    pub tx_queue_number: u8,
    pub rx_queue_number: u8,
}

impl QueuePairConfig {
    pub fn new(nb_descriptors: u32, tx_message_size: u32) -> Result<Self> {
        use crate::constants::{MAX_QUEUE_DESCRIPTORS, MIN_QUEUE_DESCRIPTORS};
        if !(MIN_QUEUE_DESCRIPTORS..=MAX_QUEUE_DESCRIPTORS).contains(&nb_descriptors)
            || !nb_descriptors.is_power_of_two()
        {
            return Err(QatError::invalid(format!(
                "nb_descriptors {nb_descriptors} out of [{MIN_QUEUE_DESCRIPTORS}, {MAX_QUEUE_DESCRIPTORS}]"
            )));
        }
        Ok(Self {
            nb_descriptors,
            tx_message_size,
            hw_bundle_number: 0,
            tx_queue_number: 0,
            rx_queue_number: 1,
        })
    }

    pub fn with_bundle(mut self, bundle: u8, tx_ring: u8, rx_ring: u8) -> Self {
        self.hw_bundle_number = bundle;
        self.tx_queue_number = tx_ring;
        self.rx_queue_number = rx_ring;
        self
    }
}

/// A single-producer-single-consumer request/response engine. The engine
/// does not internally lock `enqueue`/`dequeue` against each other; the
/// application must not call both concurrently from different threads on
/// the same `QueuePair`.
pub struct QueuePair {
    pub id: u16,
    state: QpState,
    rings: RingPair,
    cookies: CookiePool,
    inflights: u32,
    build_request: BuildRequestFn,
    device_generation: DeviceGeneration,
    bar: Bar,
    arbiter: ArbiterLock,
    arb_offset: u32,
    stats: QpStats,
}

impl QueuePair {
    /// `setup`: validate descriptor count, allocate rings + cookies,
    /// configure queues, enable the arbiter, transition to `Active`.
    pub fn setup(
        id: u16,
        config: QueuePairConfig,
        build_request: BuildRequestFn,
        device_generation: DeviceGeneration,
        bar: Bar,
        arbiter: ArbiterLock,
    ) -> Result<Self> {
        let rings = RingPair::new(
            config.nb_descriptors,
            config.tx_message_size,
            config.hw_bundle_number,
            config.tx_queue_number,
            config.rx_queue_number,
        )?;
        let hw_spec = crate::generation::hw_spec(device_generation);
        let arb_offset = hw_spec.arb_enable_offset(config.hw_bundle_number);
        arbiter.enable(&bar, arb_offset, config.tx_queue_number);

        let cookies = CookiePool::new(config.nb_descriptors);
        insights::record_ring_created(id, config.nb_descriptors);
        insights::record_state_transition(id, "IDLE", "ACTIVE");

        Ok(Self {
            id,
            state: QpState::Active,
            rings,
            cookies,
            inflights: 0,
            build_request,
            device_generation,
            bar,
            arbiter,
            arb_offset,
            stats: QpStats::new(),
        })
    }

    pub fn state(&self) -> QpState {
        self.state
    }

    pub fn stats(&self) -> QpStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Push up to `ops.len()` operations; returns the count actually
    /// enqueued. Never fails the whole batch — per-op build failures are
    /// counted and the batch short-returns.
    pub fn enqueue_burst(&mut self, ops: &mut [&mut Operation]) -> Result<u16> {
        if self.state != QpState::Active {
            return Err(QatError::invalid("enqueue called on a non-active queue pair"));
        }

        let requested = ops.len() as u16;
        let max_inflights = self.rings.tx.max_inflights;
        let tentative = self.inflights + ops.len() as u32;
        let overflow = tentative.saturating_sub(max_inflights);
        let nb_possible = ops.len().saturating_sub(overflow as usize);

        if nb_possible == 0 {
            return Ok(0);
        }

        self.inflights += nb_possible as u32;

        let mut enqueued = 0u16;
        let mut tail = self.rings.tx.tail;

        for op in ops.iter_mut().take(nb_possible) {
            if check_generation_floor(self.device_generation, op.session.min_device_generation).is_err() {
                op.status = OpStatus::InvalidSession;
                self.stats.record_enqueue_err(1);
                let not_built = (nb_possible - enqueued as usize) as u32;
                self.inflights = self.inflights.saturating_sub(not_built);
                break;
            }

            let slot_index = (tail / self.rings.tx.message_size) as usize;
            let cookie = self.cookies.get_mut(slot_index);
            let slot_bytes = self.rings.tx.slot_mut(tail);
            let slot: &mut crate::wire::RequestDescriptor = bytemuck::from_bytes_mut(slot_bytes);

            match (self.build_request)(op, slot, cookie, self.device_generation) {
                Ok(()) => {
                    tail = self.rings.tx.advance(tail);
                    enqueued += 1;
                }
                Err(_) => {
                    self.stats.record_enqueue_err(1);
                    let not_built = (nb_possible - enqueued as usize) as u32;
                    self.inflights = self.inflights.saturating_sub(not_built);
                    break;
                }
            }
        }

        self.rings.tx.tail = tail;
        self.rings.tx.pending_requests += enqueued as u32;

        let should_flush =
            self.inflights < TAIL_FORCE_WRITE_THRESH as u32 || self.rings.tx.pending_requests > TAIL_WRITE_THRESH;
        if should_flush {
            self.flush_tail();
        }

        self.stats.record_enqueued(enqueued as u64);
        insights::record_enqueue_burst(self.id, requested, enqueued);
        Ok(enqueued)
    }

    fn flush_tail(&mut self) {
        let hw_spec = crate::generation::hw_spec(self.device_generation);
        let offset = hw_spec.ring_tail_offset(self.rings.tx.hw_bundle_number, self.rings.tx.hw_queue_number);
        self.bar.write32(offset, self.rings.tx.tail);
        self.rings.tx.csr_tail = self.rings.tx.tail;
        self.rings.tx.pending_requests = 0;
    }

    fn flush_head(&mut self) {
        let hw_spec = crate::generation::hw_spec(self.device_generation);
        let offset = hw_spec.ring_head_offset(self.rings.rx.hw_bundle_number, self.rings.rx.hw_queue_number);
        self.bar.write32(offset, self.rings.rx.head);
        self.rings.rx.csr_head = self.rings.rx.head;
    }

    /// Pop up to `max_ops` completions into `out`. Returns the count
    /// harvested; never fails — an empty ring simply returns `0`.
    ///
    /// # Safety
    /// Every still-inflight operation referenced by a response must be a
    /// live `&mut Operation` the caller has not dropped since enqueue.
    pub unsafe fn dequeue_burst(&mut self, out: &mut [*mut Operation]) -> Result<u16> {
        if self.state != QpState::Active && self.state != QpState::Draining {
            return Err(QatError::invalid("dequeue called on a non-active queue pair"));
        }

        let old_head = self.rings.rx.head;
        let mut head = old_head;
        let mut dequeued = 0u16;

        for slot in out.iter_mut() {
            if self.rings.rx.slot_is_empty(head) {
                break;
            }

            let slot_index = (head / self.rings.rx.message_size) as usize;
            let cookie = self.cookies.get_mut(slot_index);
            let resp_bytes = self.rings.rx.slot(head);
            let resp: &ResponseDescriptor = bytemuck::from_bytes(resp_bytes);

            *slot = process_response(resp, cookie);

            head = self.rings.rx.advance(head);
            self.rings.rx.processed_responses += 1;
            self.inflights = self.inflights.saturating_sub(1);
            dequeued += 1;
        }

        self.rings.rx.head = head;

        if self.rings.rx.processed_responses > HEAD_WRITE_THRESH {
            self.rings.rx.scrub(old_head, head);
            self.flush_head();
            self.rings.rx.processed_responses = 0;
        }

        if self.inflights <= TAIL_FORCE_WRITE_THRESH as u32 && self.rings.tx.tail != self.rings.tx.csr_tail {
            self.flush_tail();
        }

        self.stats.record_dequeued(dequeued as u64);
        Ok(dequeued)
    }

    /// `release`: if requests are still in flight, return `Busy`
    /// (retriable — the caller drains and retries); otherwise disable the
    /// arbiter and transition to `Released`.
    pub fn release(&mut self) -> Result<()> {
        if self.inflights > 0 {
            insights::record_release_busy(self.id, self.inflights as u16);
            return Err(QatError::busy(format!("{} requests still in flight", self.inflights)));
        }

        self.arbiter.disable(&self.bar, self.arb_offset, self.rings.tx.hw_queue_number);
        self.rings.tx.scrub(0, self.rings.tx.queue_size);
        self.rings.rx.scrub(0, self.rings.rx.queue_size);
        self.state = QpState::Released;
        insights::record_state_transition(self.id, "ACTIVE", "RELEASED");
        Ok(())
    }

    /// Transition to `Draining`: no new enqueues will be admitted by the
    /// caller's convention, but in-flight dequeues may still proceed.
    pub fn begin_drain(&mut self) {
        if self.state == QpState::Active {
            self.state = QpState::Draining;
            insights::record_state_transition(self.id, "ACTIVE", "DRAINING");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_and_lock() -> (Bar, ArbiterLock) {
        let buf = Box::leak(vec![0u8; 0x10000].into_boxed_slice());
        (unsafe { Bar::new(buf.as_mut_ptr(), buf.len()) }, ArbiterLock::new())
    }

    fn noop_build(
        _op: &mut Operation,
        slot: &mut crate::wire::RequestDescriptor,
        _cookie: &mut crate::cookie::Cookie,
        _gen: DeviceGeneration,
    ) -> Result<()> {
        slot.mid.opaque_data = 0;
        Ok(())
    }

    fn dummy_op() -> Operation {
        use crate::sgl::{Segment, VecBufferChain};
        Operation {
            session: std::sync::Arc::new(crate::session::Session {
                command_id: crate::wire::CommandId::Cipher,
                cipher_algorithm: crate::session::CipherAlgorithm::Aes128,
                cipher_mode: crate::session::CipherMode::Cbc,
                cipher_direction: crate::session::CipherDirection::Encrypt,
                hash_algorithm: crate::session::HashAlgorithm::None,
                cipher_iv_offset: 0,
                cipher_iv_length: 16,
                auth_iv_offset: 0,
                auth_iv_length: 0,
                aad_length: 0,
                digest_length: 0,
                auth_key_length: 0,
                bpi_context: None,
                fw_request_template: crate::wire::RequestDescriptor {
                    header: crate::wire::CommonHeader::zeroed_header(),
                    mid: bytemuck::Zeroable::zeroed(),
                    cipher: bytemuck::Zeroable::zeroed(),
                    auth: bytemuck::Zeroable::zeroed(),
                    cd_ctrl: bytemuck::Zeroable::zeroed(),
                    _tail_pad: [0; 16],
                },
                min_device_generation: DeviceGeneration::Gen1,
            }),
            source: Box::new(VecBufferChain { segments: vec![Segment { iova: 0x1000, data_len: 16 }] }),
            destination: None,
            cipher: Default::default(),
            auth: Default::default(),
            aead: Default::default(),
            compression: Default::default(),
            status: Default::default(),
        }
    }

    #[test]
    fn setup_transitions_to_active() {
        let (bar, lock) = bar_and_lock();
        let config = QueuePairConfig::new(8, 128).unwrap();
        let qp = QueuePair::setup(0, config, noop_build, DeviceGeneration::Gen4, bar, lock).unwrap();
        assert_eq!(qp.state(), QpState::Active);
    }

    #[test]
    fn release_with_inflight_requests_returns_busy() {
        let (bar, lock) = bar_and_lock();
        let config = QueuePairConfig::new(8, 128).unwrap();
        let mut qp = QueuePair::setup(0, config, noop_build, DeviceGeneration::Gen4, bar, lock).unwrap();

        let mut op = dummy_op();
        let mut ops: Vec<&mut Operation> = vec![&mut op];
        let enqueued = qp.enqueue_burst(&mut ops).unwrap();
        assert_eq!(enqueued, 1);

        assert!(qp.release().is_err());
    }

    #[test]
    fn enqueue_short_returns_when_ring_is_full() {
        let (bar, lock) = bar_and_lock();
        let config = QueuePairConfig::new(8, 128).unwrap();
        let mut qp = QueuePair::setup(0, config, noop_build, DeviceGeneration::Gen4, bar, lock).unwrap();

        let mut owned_ops: Vec<Operation> = (0..8).map(|_| dummy_op()).collect();
        let mut refs: Vec<&mut Operation> = owned_ops.iter_mut().collect();
        let enqueued = qp.enqueue_burst(&mut refs).unwrap();
        assert_eq!(enqueued, 7); // max_inflights = nb_descriptors - 1
    }

    #[test]
    fn enqueue_rejects_session_below_device_generation_floor() {
        let (bar, lock) = bar_and_lock();
        let config = QueuePairConfig::new(8, 128).unwrap();
        let mut qp = QueuePair::setup(0, config, noop_build, DeviceGeneration::Gen3, bar, lock).unwrap();

        let mut op = dummy_op();
        let sess = std::sync::Arc::make_mut(&mut op.session);
        sess.min_device_generation = DeviceGeneration::Gen4;

        let mut ops: Vec<&mut Operation> = vec![&mut op];
        let enqueued = qp.enqueue_burst(&mut ops).unwrap();
        assert_eq!(enqueued, 0);
        assert_eq!(op.status, OpStatus::InvalidSession);
    }
}
