//! Observability hooks. Zero-cost when the `tracing` feature is off.
//!
//! ```toml
//! qat-core = { version = "0.1", features = ["tracing"] }
//! ```
//! ```rust,ignore
//! tracing_subscriber::fmt::init();
//! ```

/// Ring pair created for a queue pair.
#[cfg(feature = "tracing")]
#[inline]
pub fn record_ring_created(qp_id: u16, nb_descriptors: u32) {
    let _span = tracing::trace_span!("ring_created", qp_id, nb_descriptors).entered();
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub fn record_ring_created(_qp_id: u16, _nb_descriptors: u32) {}

/// Queue-pair state transition (IDLE -> ACTIVE -> DRAINING -> RELEASED).
#[cfg(feature = "tracing")]
#[inline]
pub fn record_state_transition(qp_id: u16, from: &str, to: &str) {
    let _span = tracing::debug_span!("qp_state", qp_id, from, to).entered();
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub fn record_state_transition(_qp_id: u16, _from: &str, _to: &str) {}

/// Admission control decision on an enqueue burst (full acceptance, short
/// enqueue, or outright rejection because the queue is draining).
#[cfg(feature = "tracing")]
#[inline]
pub fn record_enqueue_burst(qp_id: u16, requested: u16, accepted: u16) {
    if accepted < requested {
        let _span = tracing::warn_span!("short_enqueue", qp_id, requested, accepted).entered();
    } else {
        let _span = tracing::trace_span!("enqueue_burst", qp_id, accepted).entered();
    }
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub fn record_enqueue_burst(_qp_id: u16, _requested: u16, _accepted: u16) {}

/// Queue pair reported busy on release (requests still in flight).
#[cfg(feature = "tracing")]
#[inline]
pub fn record_release_busy(qp_id: u16, inflight: u16) {
    let _span = tracing::warn_span!("release_busy", qp_id, inflight).entered();
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub fn record_release_busy(_qp_id: u16, _inflight: u16) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hooks_compile_as_no_ops() {
        record_ring_created(0, 128);
        record_state_transition(0, "IDLE", "ACTIVE");
        record_enqueue_burst(0, 8, 8);
        record_release_busy(0, 3);
    }
}
