use bitflags::bitflags;
use std::time::Duration;

pub const MINIMUM_MTU: u32 = 576;
pub const MAXIMUM_MTU: u32 = 4096;
/// MTU assumed for a peer until its CONNECT says otherwise.
pub const DEFAULT_MTU: u32 = 1400;

pub const MAXIMUM_PACKET_COMMANDS: usize = 32;

pub const MINIMUM_WINDOW_SIZE: u32 = 4096;
pub const MAXIMUM_WINDOW_SIZE: u32 = 65536;

pub const MINIMUM_CHANNEL_COUNT: u32 = 1;
pub const MAXIMUM_CHANNEL_COUNT: u32 = 255;

/// Peer id reserved for "not yet assigned"; a CONNECT carries it in the header.
pub const MAXIMUM_PEER_ID: u16 = 0xFFF;

pub const MAXIMUM_FRAGMENT_COUNT: u32 = 1024 * 1024;

/// Channel id used by connection-control commands (VerifyConnect, Ping, Disconnect).
pub const CONTROL_CHANNEL: u8 = 0xFF;

/// Session ids live in two bits of the header peer id.
pub const SESSION_MASK: u16 = 3 << 12;
pub const SESSION_SHIFT: u16 = 12;
pub const PEER_ID_MASK: u16 = 0x0FFF;

pub const DATAGRAM_HEADER_SIZE: usize = 4;
pub const COMMAND_HEADER_SIZE: usize = 4;

/// Fixed body sizes, excluding the 4-byte command header.
pub const ACKNOWLEDGE_BODY_SIZE: usize = 4;
pub const CONNECT_BODY_SIZE: usize = 44;
pub const VERIFY_CONNECT_BODY_SIZE: usize = 40;
pub const DISCONNECT_BODY_SIZE: usize = 4;
pub const PING_BODY_SIZE: usize = 0;
pub const SEND_RELIABLE_BODY_SIZE: usize = 2;
pub const SEND_UNRELIABLE_BODY_SIZE: usize = 4;
pub const SEND_UNSEQUENCED_BODY_SIZE: usize = 4;
pub const SEND_FRAGMENT_BODY_SIZE: usize = 20;
pub const BANDWIDTH_LIMIT_BODY_SIZE: usize = 8;
pub const THROTTLE_CONFIGURE_BODY_SIZE: usize = 12;

/// Bytes a single SEND_RELIABLE costs on top of its payload.
pub const RELIABLE_OVERHEAD: usize =
    DATAGRAM_HEADER_SIZE + COMMAND_HEADER_SIZE + SEND_RELIABLE_BODY_SIZE;

/// Bytes a single SEND_FRAGMENT costs on top of its chunk.
pub const FRAGMENT_OVERHEAD: usize =
    DATAGRAM_HEADER_SIZE + COMMAND_HEADER_SIZE + SEND_FRAGMENT_BODY_SIZE;

/// Recommended fragment chunk size.
pub const DEFAULT_FRAGMENT_SIZE: usize = 1024;

/// Throttle values advertised in VerifyConnect.
pub const DEFAULT_THROTTLE_INTERVAL: u32 = 5000;
pub const DEFAULT_THROTTLE_ACCELERATION: u32 = 2;
pub const DEFAULT_THROTTLE_DECELERATION: u32 = 2;

/// How far ahead of the next expected sequence an incoming reliable command
/// may be held. Anything further is dropped unacknowledged.
pub const RELIABLE_WINDOW: u16 = 4096;

pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_FRAGMENT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_INITIAL_RTO: Duration = Duration::from_millis(500);
pub const DEFAULT_MAXIMUM_RTO: Duration = Duration::from_secs(5);
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

bitflags! {
    /// Flag bits carried in the upper part of the datagram header peer id.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct HeaderFlags: u16 {
        const COMPRESSED = 1 << 14;
        const SENT_TIME  = 1 << 15;

        const MASK = Self::COMPRESSED.bits() | Self::SENT_TIME.bits();
    }
}

bitflags! {
    /// Flag nibble of the first command header byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct CommandFlags: u8 {
        const ACKNOWLEDGE = 1 << 7;
        const UNSEQUENCED = 1 << 6;
    }
}

pub const COMMAND_MASK: u8 = 0x0F;
