use bytes::{Buf, BufMut};

use crate::protocol::{
    constants::{
        DATAGRAM_HEADER_SIZE, HeaderFlags, MAXIMUM_PEER_ID, PEER_ID_MASK, SESSION_MASK,
        SESSION_SHIFT,
    },
    packet::DecodeError,
};

/// The 4-byte header that opens every ENet datagram.
///
/// On the wire the first word packs `flags | session << 12 | peer_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatagramHeader {
    pub peer_id: u16,
    pub session_id: u8,
    pub flags: HeaderFlags,
    pub sent_time: u16,
}

impl DatagramHeader {
    /// Header for a datagram sent before the remote assigned us an id.
    pub fn unassigned(sent_time: u16) -> Self {
        Self {
            peer_id: MAXIMUM_PEER_ID,
            session_id: 0,
            flags: HeaderFlags::SENT_TIME,
            sent_time,
        }
    }

    pub fn encode(&self, dst: &mut impl BufMut) {
        let word = (self.peer_id & PEER_ID_MASK)
            | ((u16::from(self.session_id) << SESSION_SHIFT) & SESSION_MASK)
            | self.flags.bits();
        dst.put_u16(word);
        dst.put_u16(self.sent_time);
    }

    pub fn decode(src: &mut impl Buf) -> Result<Self, DecodeError> {
        if src.remaining() < DATAGRAM_HEADER_SIZE {
            return Err(DecodeError::MalformedHeader);
        }
        let word = src.get_u16();
        let sent_time = src.get_u16();
        Ok(DatagramHeader {
            peer_id: word & PEER_ID_MASK,
            session_id: ((word & SESSION_MASK) >> SESSION_SHIFT) as u8,
            flags: HeaderFlags::from_bits_truncate(word),
            sent_time,
        })
    }
}
