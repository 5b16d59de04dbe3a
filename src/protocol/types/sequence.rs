use std::ops::Add;

use bytes::{Buf, BufMut};

use crate::protocol::packet::{DecodeError, EnetEncodable};

/// 16-bit reliable sequence number with wraparound ordering.
///
/// Two sequences compare by their signed 16-bit distance, so 65535 < 0.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct Sequence16(u16);

impl Sequence16 {
    pub fn new(v: u16) -> Sequence16 {
        Sequence16(v)
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    // clone mutations.

    pub fn next(&self) -> Sequence16 {
        Sequence16(self.0.wrapping_add(1))
    }

    /// Signed distance from `other` to `self`.
    pub fn distance(&self, other: Sequence16) -> i16 {
        self.0.wrapping_sub(other.0) as i16
    }
}

impl Ord for Sequence16 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance(*other).cmp(&0)
    }
}

impl PartialOrd for Sequence16 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Add<u16> for Sequence16 {
    type Output = Self;

    fn add(self, rhs: u16) -> Self::Output {
        Sequence16(self.0.wrapping_add(rhs))
    }
}

impl From<u16> for Sequence16 {
    fn from(raw: u16) -> Self {
        Sequence16(raw)
    }
}

impl EnetEncodable for Sequence16 {
    fn encode_enet(&self, dst: &mut impl BufMut) {
        self.0.encode_enet(dst);
    }

    fn decode_enet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Sequence16(u16::decode_enet(src)?))
    }
}
