//! Datagram codec, the sans-IO [`Host`] engine and the tokio socket layer.
//!
//! [`Host`] turns inbound datagrams into [`Event`](crate::Event)s and queues
//! outbound [`Transmit`]s; it never touches a socket. [`EnetListener`] owns
//! a UDP socket and a `Host` inside one muxer task, and [`HostHandle`]
//! funnels sends from other tasks through that same task.

use bytes::Bytes;
use std::net::SocketAddr;

use crate::protocol::types::PeerId;

pub mod datagram;
pub mod host;
pub mod listener;
mod listener_conn;

pub use datagram::{Datagram, decode_datagram, encode_datagram};
pub use host::Host;
pub use listener::EnetListener;
pub use listener_conn::HostHandle;

/// Application payload plus the channel it travels on.
#[derive(Debug, Clone)]
pub struct Message {
    pub buffer: Bytes,
    pub channel: u8,
}

impl Message {
    pub fn new(buffer: impl Into<Bytes>) -> Self {
        Self {
            buffer: buffer.into(),
            channel: 0,
        }
    }

    pub fn channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }
}

impl From<Bytes> for Message {
    fn from(buffer: Bytes) -> Self {
        Self::new(buffer)
    }
}

impl From<Vec<u8>> for Message {
    fn from(vec: Vec<u8>) -> Self {
        Self::new(vec)
    }
}

impl From<&'static [u8]> for Message {
    fn from(slice: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(slice))
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Self::new(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Self::new(Bytes::from(s))
    }
}

/// An encoded datagram ready for the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmit {
    pub addr: SocketAddr,
    pub payload: Bytes,
}

/// Request from a [`HostHandle`] to the muxer task.
#[derive(Debug)]
pub enum OutboundMsg {
    Send { peer: PeerId, message: Message },
    Broadcast { message: Message },
    Disconnect { peer: PeerId, data: u32 },
}
