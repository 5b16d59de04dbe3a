use std::time::Duration;

use crate::protocol::constants::{
    DEFAULT_FRAGMENT_SIZE, DEFAULT_FRAGMENT_TIMEOUT, DEFAULT_INITIAL_RTO, DEFAULT_MAXIMUM_RTO,
    DEFAULT_PEER_TIMEOUT, DEFAULT_PING_INTERVAL, DEFAULT_TICK_INTERVAL, MAXIMUM_CHANNEL_COUNT,
};

/// Limits and timers for a [`Host`](crate::transport::Host).
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of simultaneously connected peers.
    pub max_peers: usize,
    /// Upper bound for the channel count a peer may negotiate.
    pub channel_limit: u32,
    /// Incomplete fragment groups a single peer may hold at once.
    pub max_fragment_groups_per_peer: usize,
    /// Reassembly bytes reserved across all peers.
    pub max_reassembly_bytes: usize,
    /// Out-of-order reliable commands a single channel may hold.
    pub max_held_reliable: usize,
    /// Largest reassembled payload accepted.
    pub max_packet_size: usize,
    /// Chunk size for outbound fragmentation.
    pub fragment_size: usize,
    pub fragment_timeout: Duration,
    pub peer_timeout: Duration,
    pub ping_interval: Duration,
    pub initial_rto: Duration,
    pub max_rto: Duration,
    /// Resends of one reliable command before the peer is dropped.
    pub max_retransmits: u32,
    /// Period of the listener's sweep.
    pub tick_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_peers: 100,
            channel_limit: 2,
            max_fragment_groups_per_peer: 32,
            max_reassembly_bytes: 64 * 1024 * 1024,
            max_held_reliable: 256,
            max_packet_size: 32 * 1024 * 1024,
            fragment_size: DEFAULT_FRAGMENT_SIZE,
            fragment_timeout: DEFAULT_FRAGMENT_TIMEOUT,
            peer_timeout: DEFAULT_PEER_TIMEOUT,
            ping_interval: DEFAULT_PING_INTERVAL,
            initial_rto: DEFAULT_INITIAL_RTO,
            max_rto: DEFAULT_MAXIMUM_RTO,
            max_retransmits: 8,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl Config {
    #[must_use]
    pub fn max_peers(mut self, max_peers: usize) -> Self {
        self.max_peers = max_peers;
        self
    }

    #[must_use]
    pub fn channel_limit(mut self, limit: u32) -> Self {
        self.channel_limit = limit.clamp(1, MAXIMUM_CHANNEL_COUNT);
        self
    }

    #[must_use]
    pub fn max_fragment_groups_per_peer(mut self, max: usize) -> Self {
        self.max_fragment_groups_per_peer = max;
        self
    }

    #[must_use]
    pub fn max_reassembly_bytes(mut self, max: usize) -> Self {
        self.max_reassembly_bytes = max;
        self
    }

    #[must_use]
    pub fn max_held_reliable(mut self, max: usize) -> Self {
        self.max_held_reliable = max;
        self
    }

    #[must_use]
    pub fn max_packet_size(mut self, max: usize) -> Self {
        self.max_packet_size = max;
        self
    }

    #[must_use]
    pub fn fragment_size(mut self, size: usize) -> Self {
        self.fragment_size = size.max(1);
        self
    }

    #[must_use]
    pub fn fragment_timeout(mut self, timeout: Duration) -> Self {
        self.fragment_timeout = timeout;
        self
    }

    #[must_use]
    pub fn peer_timeout(mut self, timeout: Duration) -> Self {
        self.peer_timeout = timeout;
        self
    }

    #[must_use]
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    #[must_use]
    pub fn retransmission(mut self, initial_rto: Duration, max_rto: Duration, max_retransmits: u32) -> Self {
        self.initial_rto = initial_rto;
        self.max_rto = max_rto.max(initial_rto);
        self.max_retransmits = max_retransmits;
        self
    }

    #[must_use]
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}
