//! # Fragment Codec
//!
//! `tokio-util` codec that splits a byte stream into PDU fragments using the
//! `frag_length` declared in each common header, and writes bind PDUs back out.
//!
//! Fragments are split off the read buffer without copying. Reassembly of
//! multi-fragment calls is left to the caller.

use crate::config::FramingConfig;
use crate::core::cursor::WireReader;
use crate::core::header::{PduHeader, COMMON_HEADER_SIZE};
use crate::error::{constants, ProtocolError, Result};
use crate::pdu::BindPdu;
use crate::utils::metrics::CodecMetrics;
use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

/// One complete fragment, header included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub header: PduHeader,
    /// The whole fragment, starting with the common header
    pub data: Bytes,
}

impl Fragment {
    /// Bytes after the common header.
    pub fn body(&self) -> &[u8] {
        &self.data[COMMON_HEADER_SIZE..]
    }

    /// Decodes the fragment as a `bind` or `alter_context` PDU.
    pub fn into_bind(self) -> Result<BindPdu> {
        BindPdu::from_parts(&self.header, self.body())
    }
}

#[derive(Debug, Clone)]
pub struct PduCodec {
    max_frag_length: usize,
    metrics: Option<Arc<CodecMetrics>>,
}

impl Default for PduCodec {
    fn default() -> Self {
        Self::from_config(&FramingConfig::default())
    }
}

impl PduCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &FramingConfig) -> Self {
        Self {
            max_frag_length: config.max_frag_length,
            metrics: None,
        }
    }

    /// Records traffic in the shared counters.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<CodecMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn reject(&self, err: ProtocolError) -> ProtocolError {
        warn!(error = %err, "rejecting fragment");
        if let Some(metrics) = &self.metrics {
            metrics.decode_error();
        }
        err
    }
}

impl Decoder for PduCodec {
    type Item = Fragment;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Fragment>> {
        let Some(frag_length) = PduHeader::peek_frag_length(src) else {
            return Ok(None);
        };
        let frag_length = usize::from(frag_length);

        if frag_length < COMMON_HEADER_SIZE {
            return Err(self.reject(ProtocolError::InvalidHeader(
                constants::ERR_FRAG_LENGTH_TOO_SMALL,
            )));
        }
        if frag_length > self.max_frag_length {
            return Err(self.reject(ProtocolError::InvalidHeader(
                constants::ERR_FRAG_LENGTH_TOO_LARGE,
            )));
        }

        if src.len() < frag_length {
            src.reserve(frag_length - src.len());
            return Ok(None);
        }

        let data = src.split_to(frag_length).freeze();
        let header = match PduHeader::decode(&mut WireReader::new(&data)) {
            Ok(header) => header,
            Err(err) => return Err(self.reject(err)),
        };

        if let Some(metrics) = &self.metrics {
            metrics.fragment_decoded(frag_length);
        }
        Ok(Some(Fragment { header, data }))
    }
}

impl Encoder<BindPdu> for PduCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: BindPdu, dst: &mut BytesMut) -> Result<()> {
        let bytes = match item.to_bytes() {
            Ok(bytes) => bytes,
            Err(err) => return Err(self.reject(err)),
        };
        if bytes.len() > self.max_frag_length {
            return Err(self.reject(ProtocolError::OversizedPdu(bytes.len())));
        }

        dst.extend_from_slice(&bytes);
        if let Some(metrics) = &self.metrics {
            metrics.fragment_encoded(bytes.len());
        }
        Ok(())
    }
}
