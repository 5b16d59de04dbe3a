use thiserror::Error;

use crate::protocol::{
    packet::{DecodeError, EncodeError},
    types::PeerId,
};

/// Host-side resources that are bounded against flooding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Peers,
    FragmentGroups,
    ReassemblyMemory,
    /// Reliable commands held per channel while waiting for a gap to fill.
    ReorderBuffer,
}

/// Errors surfaced by the host, the listener and the game layer.
///
/// None of these are fatal to the host: they are scoped to the datagram,
/// command or call that produced them.
#[derive(Error, Debug)]
pub enum EnetError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("invalid fragment descriptor: {0}")]
    InvalidFragmentDescriptor(&'static str),

    #[error("peer id space exhausted")]
    IdSpaceExhausted,

    #[error("resource exhausted: {0:?}")]
    ResourceExhausted(Resource),

    #[error("unknown peer {0}")]
    UnknownPeer(PeerId),

    #[error("channel {0} was not negotiated")]
    InvalidChannel(u8),

    #[error("peer {0} is not connected")]
    NotConnected(PeerId),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
