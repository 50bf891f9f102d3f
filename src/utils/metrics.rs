//! Codec Metrics
//!
//! Atomic counters for fragments flowing through [`PduCodec`](crate::core::codec::PduCodec).
//! Share one instance between codecs with an `Arc`.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

#[derive(Debug, Default)]
pub struct CodecMetrics {
    /// Fragments split off the input stream
    pub fragments_decoded: AtomicU64,
    /// PDUs written to the output stream
    pub fragments_encoded: AtomicU64,
    pub bytes_decoded: AtomicU64,
    pub bytes_encoded: AtomicU64,
    /// Fragments rejected while framing or encoding
    pub decode_errors: AtomicU64,
}

impl CodecMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fragment_decoded(&self, byte_count: usize) {
        self.fragments_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_decoded
            .fetch_add(byte_count as u64, Ordering::Relaxed);
    }

    pub fn fragment_encoded(&self, byte_count: usize) {
        self.fragments_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded
            .fetch_add(byte_count as u64, Ordering::Relaxed);
    }

    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fragments_decoded: self.fragments_decoded.load(Ordering::Relaxed),
            fragments_encoded: self.fragments_encoded.load(Ordering::Relaxed),
            bytes_decoded: self.bytes_decoded.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
        }
    }

    /// Log current metrics at info level
    pub fn log_metrics(&self) {
        let s = self.snapshot();
        info!(
            fragments_decoded = s.fragments_decoded,
            fragments_encoded = s.fragments_encoded,
            bytes_decoded = s.bytes_decoded,
            bytes_encoded = s.bytes_encoded,
            decode_errors = s.decode_errors,
            "Codec metrics"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub fragments_decoded: u64,
    pub fragments_encoded: u64,
    pub bytes_decoded: u64,
    pub bytes_encoded: u64,
    pub decode_errors: u64,
}
