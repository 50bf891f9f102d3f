//! # Utility Modules
//!
//! Supporting utilities for logging and observability.
//!
//! ## Components
//! - **Logging**: `tracing-subscriber` setup from [`LoggingConfig`](crate::config::LoggingConfig)
//! - **Metrics**: thread-safe codec counters

pub mod logging;
pub mod metrics;

pub use metrics::{CodecMetrics, MetricsSnapshot};
