//! Per-peer connection state.
//!
//! A [`Peer`] owns everything the host knows about one remote endpoint:
//! negotiated parameters, per-channel sequencing, the acknowledgement and
//! outbound queues, unacknowledged reliable commands and in-flight fragment
//! groups. Peers never touch the socket; [`Peer::flush`] hands encoded
//! datagrams back to the host.

pub mod channel;
pub mod fragment;
mod inbound;
mod outbound;

pub use channel::{Arrival, Channel, ReliableInbox};
pub use fragment::{FragmentAssembler, ReassemblyBudget};
pub use outbound::RetransmitStatus;

use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::{
    config::Config,
    protocol::{
        constants::{
            CONTROL_CHANNEL, DEFAULT_MTU, DEFAULT_THROTTLE_ACCELERATION,
            DEFAULT_THROTTLE_DECELERATION, DEFAULT_THROTTLE_INTERVAL, MAXIMUM_CHANNEL_COUNT,
            MAXIMUM_MTU, MAXIMUM_PEER_ID, MAXIMUM_WINDOW_SIZE, MINIMUM_CHANNEL_COUNT, MINIMUM_MTU,
            MINIMUM_WINDOW_SIZE, SESSION_MASK, SESSION_SHIFT,
        },
        packet::{Command, Connect, VerifyConnect},
        state::PeerState,
        types::PeerId,
    },
};

use outbound::SentCommand;

/// Session ids fit in two header bits.
const SESSION_ID_LIMIT: u8 = (SESSION_MASK >> SESSION_SHIFT) as u8;

/// Session id a peer holds before its first CONNECT.
const UNSET_SESSION_ID: u8 = 0xFF;

/// Packet throttle parameters. Stored and echoed, not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    pub interval: u32,
    pub acceleration: u32,
    pub deceleration: u32,
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            interval: DEFAULT_THROTTLE_INTERVAL,
            acceleration: DEFAULT_THROTTLE_ACCELERATION,
            deceleration: DEFAULT_THROTTLE_DECELERATION,
        }
    }
}

pub struct Peer {
    id: PeerId,
    addr: SocketAddr,
    state: PeerState,
    connect_id: u32,
    /// Id the remote assigned to us; stamped on every outbound header.
    outgoing_peer_id: u16,
    incoming_session_id: u8,
    outgoing_session_id: u8,
    mtu: u32,
    window_size: u32,
    incoming_bandwidth: u32,
    outgoing_bandwidth: u32,
    throttle: Throttle,
    channels: Vec<Channel>,
    control: Channel,
    fragments: FragmentAssembler,
    acknowledgements: Vec<Command>,
    outgoing: VecDeque<Command>,
    unacked: BTreeMap<(u8, u16), SentCommand>,
    max_held_reliable: usize,
    initial_rto: Duration,
    last_receive: Instant,
    last_send: Instant,
}

impl Peer {
    pub fn new(id: PeerId, addr: SocketAddr, config: &Config, now: Instant) -> Self {
        Self {
            id,
            addr,
            state: PeerState::Disconnected,
            connect_id: 0,
            outgoing_peer_id: MAXIMUM_PEER_ID,
            incoming_session_id: UNSET_SESSION_ID,
            outgoing_session_id: UNSET_SESSION_ID,
            mtu: DEFAULT_MTU,
            window_size: MAXIMUM_WINDOW_SIZE,
            incoming_bandwidth: 0,
            outgoing_bandwidth: 0,
            throttle: Throttle::default(),
            channels: Vec::new(),
            control: Channel::default(),
            fragments: FragmentAssembler::new(
                config.max_fragment_groups_per_peer,
                config.max_packet_size,
            ),
            acknowledgements: Vec::new(),
            outgoing: VecDeque::new(),
            unacked: BTreeMap::new(),
            max_held_reliable: config.max_held_reliable,
            initial_rto: config.initial_rto,
            last_receive: now,
            last_send: now,
        }
    }

    /// Apply a CONNECT: negotiate parameters, derive session ids, reset all
    /// sequencing and queue the VerifyConnect reply.
    ///
    /// Calling this on a connected peer is a reconnection; the peer keeps
    /// its id but starts over with fresh counters.
    pub fn connect(
        &mut self,
        connect: &Connect,
        config: &Config,
        now: Instant,
        budget: &mut ReassemblyBudget,
    ) -> VerifyConnect {
        self.reset(budget);

        let incoming = next_session_id(
            connect.incoming_session_id,
            self.outgoing_session_id,
        );
        let outgoing = next_session_id(
            connect.outgoing_session_id,
            self.incoming_session_id,
        );
        self.outgoing_session_id = incoming;
        self.incoming_session_id = outgoing;

        let channel_limit = config.channel_limit.min(MAXIMUM_CHANNEL_COUNT);
        let channel_count = connect
            .channel_count
            .clamp(MINIMUM_CHANNEL_COUNT, channel_limit.max(MINIMUM_CHANNEL_COUNT));

        self.state = PeerState::Connected;
        self.connect_id = connect.connect_id;
        self.outgoing_peer_id = connect.outgoing_peer_id;
        self.mtu = connect.mtu.clamp(MINIMUM_MTU, MAXIMUM_MTU);
        self.window_size = connect
            .window_size
            .clamp(MINIMUM_WINDOW_SIZE, MAXIMUM_WINDOW_SIZE);
        self.channels = (0..channel_count).map(|_| Channel::default()).collect();
        self.incoming_bandwidth = connect.incoming_bandwidth;
        self.outgoing_bandwidth = connect.outgoing_bandwidth;
        if connect.packet_throttle_interval != 0 {
            self.throttle = Throttle {
                interval: connect.packet_throttle_interval,
                acceleration: connect.packet_throttle_acceleration,
                deceleration: connect.packet_throttle_deceleration,
            };
        }
        self.last_receive = now;
        self.last_send = now;

        let verify = VerifyConnect {
            outgoing_peer_id: self.id.value(),
            incoming_session_id: self.outgoing_session_id,
            outgoing_session_id: self.incoming_session_id,
            mtu: self.mtu,
            window_size: self.window_size,
            channel_count,
            incoming_bandwidth: 0,
            outgoing_bandwidth: 0,
            packet_throttle_interval: self.throttle.interval,
            packet_throttle_acceleration: self.throttle.acceleration,
            packet_throttle_deceleration: self.throttle.deceleration,
            connect_id: self.connect_id,
        };
        self.queue_control(verify.clone());
        verify
    }

    /// Drop all sequencing, queued traffic and fragment state.
    pub fn reset(&mut self, budget: &mut ReassemblyBudget) {
        self.channels.iter_mut().for_each(|c| *c = Channel::default());
        self.control = Channel::default();
        self.acknowledgements.clear();
        self.outgoing.clear();
        self.unacked.clear();
        self.fragments.clear(budget);
    }

    /// Final teardown when the host forgets this peer.
    pub fn close(&mut self, budget: &mut ReassemblyBudget) {
        self.reset(budget);
        self.state = PeerState::Disconnected;
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> PeerState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == PeerState::Connected
    }

    pub fn connect_id(&self) -> u32 {
        self.connect_id
    }

    pub fn outgoing_peer_id(&self) -> u16 {
        self.outgoing_peer_id
    }

    pub fn incoming_session_id(&self) -> u8 {
        self.incoming_session_id
    }

    pub fn outgoing_session_id(&self) -> u8 {
        self.outgoing_session_id
    }

    pub fn mtu(&self) -> u32 {
        self.mtu
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// `(incoming, outgoing)` bandwidth in bytes per second; 0 is unlimited.
    pub fn bandwidth(&self) -> (u32, u32) {
        (self.incoming_bandwidth, self.outgoing_bandwidth)
    }

    pub fn throttle(&self) -> Throttle {
        self.throttle
    }

    pub fn last_receive(&self) -> Instant {
        self.last_receive
    }

    pub fn last_send(&self) -> Instant {
        self.last_send
    }

    /// Fragment groups still waiting for pieces.
    pub fn pending_fragment_groups(&self) -> usize {
        self.fragments.len()
    }

    /// Reliable commands sent and not yet acknowledged.
    pub fn unacked_count(&self) -> usize {
        self.unacked.len()
    }

    fn channel(&self, channel_id: u8) -> Option<&Channel> {
        if channel_id == CONTROL_CHANNEL {
            Some(&self.control)
        } else {
            self.channels.get(channel_id as usize)
        }
    }

    fn channel_mut(&mut self, channel_id: u8) -> Option<&mut Channel> {
        if channel_id == CONTROL_CHANNEL {
            Some(&mut self.control)
        } else {
            self.channels.get_mut(channel_id as usize)
        }
    }

    pub fn has_channel(&self, channel_id: u8) -> bool {
        channel_id == CONTROL_CHANNEL || (channel_id as usize) < self.channels.len()
    }
}

/// Derive a session id: the requested one (or `previous` when unset) plus
/// one, wrapped to two bits and never equal to `previous`.
fn next_session_id(requested: u8, previous: u8) -> u8 {
    let base = if requested == UNSET_SESSION_ID {
        previous
    } else {
        requested
    };
    let mut id = base.wrapping_add(1) & SESSION_ID_LIMIT;
    if id == previous {
        id = id.wrapping_add(1) & SESSION_ID_LIMIT;
    }
    id
}
