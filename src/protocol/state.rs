use std::net::SocketAddr;

use bytes::Bytes;

use crate::protocol::types::PeerId;

/// Lifecycle of a peer as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PeerState {
    Disconnected,
    Connected,
}

/// Why a peer left the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DisconnectReason {
    /// The remote sent DISCONNECT.
    ClosedByRemotePeer,
    /// The local side called `disconnect`.
    ClosedLocally,
    /// Nothing was heard from the peer within the idle timeout.
    TimedOut,
    /// A reliable command was never acknowledged.
    RetransmitLimit,
    /// A new CONNECT replaced the previous session.
    Reconnected,
}

/// Everything the host surfaces to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connected {
        peer: PeerId,
        addr: SocketAddr,
        data: u32,
    },
    Disconnected {
        peer: PeerId,
        addr: SocketAddr,
        reason: DisconnectReason,
    },
    Received {
        peer: PeerId,
        channel: u8,
        payload: Bytes,
    },
}

impl Event {
    pub fn peer(&self) -> PeerId {
        match self {
            Event::Connected { peer, .. }
            | Event::Disconnected { peer, .. }
            | Event::Received { peer, .. } => *peer,
        }
    }
}
