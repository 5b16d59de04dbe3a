mod datagram_header;
mod primitives;
mod sequence;

pub use datagram_header::DatagramHeader;
pub use primitives::{F32LE, I32LE, U16LE, U32LE};
pub use sequence::Sequence16;

use std::fmt;

use bytes::{Buf, Bytes};

use crate::protocol::packet::DecodeError;

/// 12-bit identifier the host assigns to a peer on CONNECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(pub u16);

impl PeerId {
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read exactly `len` payload bytes, failing without consuming anything when
/// the buffer is short.
pub fn read_payload(src: &mut impl Buf, len: usize) -> Result<Bytes, DecodeError> {
    if src.remaining() < len {
        return Err(DecodeError::UnexpectedEof);
    }
    Ok(src.copy_to_bytes(len))
}
