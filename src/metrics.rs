//! Metric helpers for `chatframe`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking envelopes sent and received.
pub const ENVELOPES_TOTAL: &str = "chatframe_envelopes_total";
/// Name of the counter tracking inbound frames that failed to decode.
pub const DECODE_ERRORS_TOTAL: &str = "chatframe_decode_errors_total";
/// Name of the counter tracking incomplete transfers that were discarded.
pub const TRANSFERS_DISCARDED_TOTAL: &str = "chatframe_transfers_discarded_total";
/// Name of the counter tracking reconnect attempts.
pub const RECONNECTS_TOTAL: &str = "chatframe_reconnects_total";

/// Direction of envelope traffic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Envelopes received from the server.
    Inbound,
    /// Envelopes written to the transport.
    Outbound,
}

impl Direction {
    /// Label value recorded for this direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Record one envelope travelling in `direction`.
#[cfg(feature = "metrics")]
pub fn inc_envelopes(direction: Direction) {
    counter!(ENVELOPES_TOTAL, "direction" => direction.as_str()).increment(1);
}

/// Record one envelope travelling in `direction`.
#[cfg(not(feature = "metrics"))]
pub fn inc_envelopes(_direction: Direction) {}

/// Record an inbound frame that failed to decode.
#[cfg(feature = "metrics")]
pub fn inc_decode_errors() { counter!(DECODE_ERRORS_TOTAL).increment(1); }

/// Record an inbound frame that failed to decode.
#[cfg(not(feature = "metrics"))]
pub fn inc_decode_errors() {}

/// Record `count` discarded transfers.
#[cfg(feature = "metrics")]
pub fn add_discarded_transfers(count: usize) {
    if count > 0 {
        counter!(TRANSFERS_DISCARDED_TOTAL).increment(u64::try_from(count).unwrap_or(u64::MAX));
    }
}

/// Record `count` discarded transfers.
#[cfg(not(feature = "metrics"))]
pub fn add_discarded_transfers(_count: usize) {}

/// Record a reconnect attempt.
#[cfg(feature = "metrics")]
pub fn inc_reconnects() { counter!(RECONNECTS_TOTAL).increment(1); }

/// Record a reconnect attempt.
#[cfg(not(feature = "metrics"))]
pub fn inc_reconnects() {}
