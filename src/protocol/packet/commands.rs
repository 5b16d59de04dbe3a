//! ENet command bodies.
//!
//! Every body is big-endian. Variable-length bodies carry a `u16` data
//! length; callers keep payloads within one MTU so the length always fits.

use bytes::{Buf, BufMut, Bytes};

use crate::protocol::{
    packet::{CommandBody, DecodeError, EnetEncodable},
    types::read_payload,
};

/// Acknowledges one reliable command, echoing the sender's header time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledge {
    pub received_reliable_sequence: u16,
    pub received_sent_time: u16,
}

impl CommandBody for Acknowledge {
    const ID: u8 = 1;

    fn encode_body(&self, dst: &mut impl BufMut) {
        self.received_reliable_sequence.encode_enet(dst);
        self.received_sent_time.encode_enet(dst);
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            received_reliable_sequence: u16::decode_enet(src)?,
            received_sent_time: u16::decode_enet(src)?,
        })
    }
}

/// Connection request. 44 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connect {
    pub outgoing_peer_id: u16,
    pub incoming_session_id: u8,
    pub outgoing_session_id: u8,
    pub mtu: u32,
    pub window_size: u32,
    pub channel_count: u32,
    pub incoming_bandwidth: u32,
    pub outgoing_bandwidth: u32,
    pub packet_throttle_interval: u32,
    pub packet_throttle_acceleration: u32,
    pub packet_throttle_deceleration: u32,
    pub connect_id: u32,
    pub data: u32,
}

impl CommandBody for Connect {
    const ID: u8 = 2;

    fn encode_body(&self, dst: &mut impl BufMut) {
        self.outgoing_peer_id.encode_enet(dst);
        self.incoming_session_id.encode_enet(dst);
        self.outgoing_session_id.encode_enet(dst);
        self.mtu.encode_enet(dst);
        self.window_size.encode_enet(dst);
        self.channel_count.encode_enet(dst);
        self.incoming_bandwidth.encode_enet(dst);
        self.outgoing_bandwidth.encode_enet(dst);
        self.packet_throttle_interval.encode_enet(dst);
        self.packet_throttle_acceleration.encode_enet(dst);
        self.packet_throttle_deceleration.encode_enet(dst);
        self.connect_id.encode_enet(dst);
        self.data.encode_enet(dst);
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            outgoing_peer_id: u16::decode_enet(src)?,
            incoming_session_id: u8::decode_enet(src)?,
            outgoing_session_id: u8::decode_enet(src)?,
            mtu: u32::decode_enet(src)?,
            window_size: u32::decode_enet(src)?,
            channel_count: u32::decode_enet(src)?,
            incoming_bandwidth: u32::decode_enet(src)?,
            outgoing_bandwidth: u32::decode_enet(src)?,
            packet_throttle_interval: u32::decode_enet(src)?,
            packet_throttle_acceleration: u32::decode_enet(src)?,
            packet_throttle_deceleration: u32::decode_enet(src)?,
            connect_id: u32::decode_enet(src)?,
            data: u32::decode_enet(src)?,
        })
    }
}

/// Connection acceptance: a CONNECT body without the trailing `data`. 40 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyConnect {
    pub outgoing_peer_id: u16,
    pub incoming_session_id: u8,
    pub outgoing_session_id: u8,
    pub mtu: u32,
    pub window_size: u32,
    pub channel_count: u32,
    pub incoming_bandwidth: u32,
    pub outgoing_bandwidth: u32,
    pub packet_throttle_interval: u32,
    pub packet_throttle_acceleration: u32,
    pub packet_throttle_deceleration: u32,
    pub connect_id: u32,
}

impl CommandBody for VerifyConnect {
    const ID: u8 = 3;

    fn encode_body(&self, dst: &mut impl BufMut) {
        self.outgoing_peer_id.encode_enet(dst);
        self.incoming_session_id.encode_enet(dst);
        self.outgoing_session_id.encode_enet(dst);
        self.mtu.encode_enet(dst);
        self.window_size.encode_enet(dst);
        self.channel_count.encode_enet(dst);
        self.incoming_bandwidth.encode_enet(dst);
        self.outgoing_bandwidth.encode_enet(dst);
        self.packet_throttle_interval.encode_enet(dst);
        self.packet_throttle_acceleration.encode_enet(dst);
        self.packet_throttle_deceleration.encode_enet(dst);
        self.connect_id.encode_enet(dst);
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            outgoing_peer_id: u16::decode_enet(src)?,
            incoming_session_id: u8::decode_enet(src)?,
            outgoing_session_id: u8::decode_enet(src)?,
            mtu: u32::decode_enet(src)?,
            window_size: u32::decode_enet(src)?,
            channel_count: u32::decode_enet(src)?,
            incoming_bandwidth: u32::decode_enet(src)?,
            outgoing_bandwidth: u32::decode_enet(src)?,
            packet_throttle_interval: u32::decode_enet(src)?,
            packet_throttle_acceleration: u32::decode_enet(src)?,
            packet_throttle_deceleration: u32::decode_enet(src)?,
            connect_id: u32::decode_enet(src)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnect {
    pub data: u32,
}

impl CommandBody for Disconnect {
    const ID: u8 = 4;

    fn encode_body(&self, dst: &mut impl BufMut) {
        self.data.encode_enet(dst);
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            data: u32::decode_enet(src)?,
        })
    }
}

/// Keep-alive; header only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping;

impl CommandBody for Ping {
    const ID: u8 = 5;

    fn encode_body(&self, _dst: &mut impl BufMut) {}

    fn decode_body(_src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Ping)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReliable {
    pub data: Bytes,
}

impl CommandBody for SendReliable {
    const ID: u8 = 6;

    fn encode_body(&self, dst: &mut impl BufMut) {
        (self.data.len() as u16).encode_enet(dst);
        dst.put_slice(&self.data);
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let len = u16::decode_enet(src)? as usize;
        Ok(Self {
            data: read_payload(src, len)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendUnreliable {
    pub unreliable_sequence: u16,
    pub data: Bytes,
}

impl CommandBody for SendUnreliable {
    const ID: u8 = 7;

    fn encode_body(&self, dst: &mut impl BufMut) {
        self.unreliable_sequence.encode_enet(dst);
        (self.data.len() as u16).encode_enet(dst);
        dst.put_slice(&self.data);
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let unreliable_sequence = u16::decode_enet(src)?;
        let len = u16::decode_enet(src)? as usize;
        Ok(Self {
            unreliable_sequence,
            data: read_payload(src, len)?,
        })
    }
}

/// One chunk of an oversized send, with enough of the whole to reassemble it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFragment {
    pub start_sequence: u16,
    pub fragment_count: u32,
    pub fragment_number: u32,
    pub total_length: u32,
    pub fragment_offset: u32,
    pub data: Bytes,
}

impl CommandBody for SendFragment {
    const ID: u8 = 8;

    fn encode_body(&self, dst: &mut impl BufMut) {
        self.start_sequence.encode_enet(dst);
        (self.data.len() as u16).encode_enet(dst);
        self.fragment_count.encode_enet(dst);
        self.fragment_number.encode_enet(dst);
        self.total_length.encode_enet(dst);
        self.fragment_offset.encode_enet(dst);
        dst.put_slice(&self.data);
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let start_sequence = u16::decode_enet(src)?;
        let len = u16::decode_enet(src)? as usize;
        let fragment_count = u32::decode_enet(src)?;
        let fragment_number = u32::decode_enet(src)?;
        let total_length = u32::decode_enet(src)?;
        let fragment_offset = u32::decode_enet(src)?;
        Ok(Self {
            start_sequence,
            fragment_count,
            fragment_number,
            total_length,
            fragment_offset,
            data: read_payload(src, len)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendUnsequenced {
    pub unsequenced_group: u16,
    pub data: Bytes,
}

impl CommandBody for SendUnsequenced {
    const ID: u8 = 9;

    fn encode_body(&self, dst: &mut impl BufMut) {
        self.unsequenced_group.encode_enet(dst);
        (self.data.len() as u16).encode_enet(dst);
        dst.put_slice(&self.data);
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let unsequenced_group = u16::decode_enet(src)?;
        let len = u16::decode_enet(src)? as usize;
        Ok(Self {
            unsequenced_group,
            data: read_payload(src, len)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandwidthLimit {
    pub incoming_bandwidth: u32,
    pub outgoing_bandwidth: u32,
}

impl CommandBody for BandwidthLimit {
    const ID: u8 = 10;

    fn encode_body(&self, dst: &mut impl BufMut) {
        self.incoming_bandwidth.encode_enet(dst);
        self.outgoing_bandwidth.encode_enet(dst);
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            incoming_bandwidth: u32::decode_enet(src)?,
            outgoing_bandwidth: u32::decode_enet(src)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfigure {
    pub packet_throttle_interval: u32,
    pub packet_throttle_acceleration: u32,
    pub packet_throttle_deceleration: u32,
}

impl CommandBody for ThrottleConfigure {
    const ID: u8 = 11;

    fn encode_body(&self, dst: &mut impl BufMut) {
        self.packet_throttle_interval.encode_enet(dst);
        self.packet_throttle_acceleration.encode_enet(dst);
        self.packet_throttle_deceleration.encode_enet(dst);
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            packet_throttle_interval: u32::decode_enet(src)?,
            packet_throttle_acceleration: u32::decode_enet(src)?,
            packet_throttle_deceleration: u32::decode_enet(src)?,
        })
    }
}

/// Same layout as [`SendFragment`]; only the type nibble differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendUnreliableFragment(pub SendFragment);

impl CommandBody for SendUnreliableFragment {
    const ID: u8 = 12;

    fn encode_body(&self, dst: &mut impl BufMut) {
        self.0.encode_body(dst);
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self(SendFragment::decode_body(src)?))
    }
}
