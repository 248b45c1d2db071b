//! Client configuration.
//!
//! [`ClientConfig`] collects the endpoint, timing and sizing knobs used by
//! the connection manager and its driver. Builder methods consume and
//! return the config so settings chain from [`ClientConfig::default`].

use std::{
    num::{NonZeroU32, NonZeroUsize},
    time::Duration,
};

/// Endpoint the bundled server listens on.
pub const DEFAULT_URL: &str = "ws://127.0.0.1:18080/ws";
/// Fixed delay between an unsolicited close and the next connect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Largest fragment body, in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(49_999);
/// Idle time after which an incomplete transfer is discarded.
pub const DEFAULT_REASSEMBLY_TIMEOUT: Duration = Duration::from_secs(60);
/// Period of the background eviction sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);
/// Largest `chunkTotal` accepted from a peer.
pub const DEFAULT_MAX_FRAGMENTS: NonZeroU32 = NonZeroU32::MIN.saturating_add(4_095);
/// Buffered events per subscriber before the slowest one starts lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

const MIN_DURATION: Duration = Duration::from_millis(1);

/// Settings for a [`ChatClient`](crate::client::ChatClient).
///
/// # Examples
///
/// ```
/// use std::{num::NonZeroUsize, time::Duration};
///
/// use chatframe::config::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_url("ws://chat.example:18080/ws")
///     .with_reconnect_delay(Duration::from_secs(2))
///     .with_max_chunk_size(NonZeroUsize::new(1_024).expect("non-zero"));
/// assert_eq!(config.url(), "ws://chat.example:18080/ws");
/// assert_eq!(config.reconnect_delay(), Duration::from_secs(2));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    url: String,
    reconnect_delay: Duration,
    max_chunk_size: NonZeroUsize,
    reassembly_timeout: Duration,
    sweep_interval: Duration,
    max_fragments: NonZeroU32,
    event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_owned(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            reassembly_timeout: DEFAULT_REASSEMBLY_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_fragments: DEFAULT_MAX_FRAGMENTS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Set the WebSocket endpoint.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the delay before reconnecting after an unsolicited close.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the largest outbound fragment, in characters.
    #[must_use]
    pub fn with_max_chunk_size(mut self, size: NonZeroUsize) -> Self {
        self.max_chunk_size = size;
        self
    }

    /// Set how long an incomplete transfer may stay idle.
    #[must_use]
    pub fn with_reassembly_timeout(mut self, timeout: Duration) -> Self {
        self.reassembly_timeout = timeout;
        self
    }

    /// Set the period of the background eviction sweep.
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Cap the `chunkTotal` a peer may announce.
    #[must_use]
    pub fn with_max_fragments(mut self, max: NonZeroU32) -> Self {
        self.max_fragments = max;
        self
    }

    /// Set the per-subscriber event buffer.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Clamp durations to at least one millisecond and the event capacity to
    /// at least one slot.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.reconnect_delay = self.reconnect_delay.max(MIN_DURATION);
        self.reassembly_timeout = self.reassembly_timeout.max(MIN_DURATION);
        self.sweep_interval = self.sweep_interval.max(MIN_DURATION);
        self.event_capacity = self.event_capacity.max(1);
        self
    }

    /// WebSocket endpoint.
    #[must_use]
    pub fn url(&self) -> &str { &self.url }

    /// Delay before reconnecting.
    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration { self.reconnect_delay }

    /// Largest outbound fragment, in characters.
    #[must_use]
    pub const fn max_chunk_size(&self) -> NonZeroUsize { self.max_chunk_size }

    /// Idle timeout for incomplete transfers.
    #[must_use]
    pub const fn reassembly_timeout(&self) -> Duration { self.reassembly_timeout }

    /// Period of the eviction sweep.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration { self.sweep_interval }

    /// Largest accepted `chunkTotal`.
    #[must_use]
    pub const fn max_fragments(&self) -> NonZeroU32 { self.max_fragments }

    /// Per-subscriber event buffer.
    #[must_use]
    pub const fn event_capacity(&self) -> usize { self.event_capacity }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployed_server() {
        let config = ClientConfig::default();
        assert_eq!(config.url(), "ws://127.0.0.1:18080/ws");
        assert_eq!(config.reconnect_delay(), Duration::from_secs(5));
        assert_eq!(config.max_chunk_size().get(), 50_000);
        assert_eq!(config.reassembly_timeout(), Duration::from_secs(60));
        assert_eq!(config.max_fragments().get(), 4_096);
    }

    #[test]
    fn normalized_clamps_zero_values() {
        let config = ClientConfig::default()
            .with_reconnect_delay(Duration::ZERO)
            .with_reassembly_timeout(Duration::ZERO)
            .with_sweep_interval(Duration::ZERO)
            .with_event_capacity(0)
            .normalized();

        assert_eq!(config.reconnect_delay(), MIN_DURATION);
        assert_eq!(config.reassembly_timeout(), MIN_DURATION);
        assert_eq!(config.sweep_interval(), MIN_DURATION);
        assert_eq!(config.event_capacity(), 1);
    }

    #[test]
    fn normalized_keeps_sane_values() {
        let config = ClientConfig::default();
        assert_eq!(config.clone().normalized(), config);
    }
}
