use bytes::{Buf, BufMut};

use crate::protocol::{
    constants::{COMMAND_HEADER_SIZE, COMMAND_MASK, CommandFlags},
    packet::{CommandBody, DecodeError, commands::*},
    types::Sequence16,
};

/// The 4-byte header in front of every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    pub command: u8,
    pub flags: CommandFlags,
    pub channel_id: u8,
    pub reliable_sequence: Sequence16,
}

impl CommandHeader {
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u8((self.command & COMMAND_MASK) | self.flags.bits());
        dst.put_u8(self.channel_id);
        dst.put_u16(self.reliable_sequence.value());
    }

    pub fn decode(src: &mut impl Buf) -> Result<Self, DecodeError> {
        if src.remaining() < COMMAND_HEADER_SIZE {
            return Err(DecodeError::UnexpectedEof);
        }
        let raw = src.get_u8();
        Ok(Self {
            command: raw & COMMAND_MASK,
            flags: CommandFlags::from_bits_truncate(raw),
            channel_id: src.get_u8(),
            reliable_sequence: Sequence16::new(src.get_u16()),
        })
    }
}

/// INTERNAL
/// Used to generate the CommandKind enum type
/// this will be used in all networking loops
/// to encode and decode commands.
macro_rules! define_enet_commands {
    (
        $(
            $name:ident,
        )+
    ) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum CommandKind {
            $(
                $name($name),
            )+
        }

        impl CommandKind {
            pub fn id(&self) -> u8 {
                match self {
                    $(
                        CommandKind::$name(_inner) => <$name as CommandBody>::ID,
                    )+
                }
            }

            fn decode_body(id: u8, src: &mut impl Buf) -> Result<Self, DecodeError> {
                Ok(match id {
                    $(
                        <$name as CommandBody>::ID => {
                            CommandKind::$name(<$name as CommandBody>::decode_body(src)?)
                        }
                    )+
                    other => return Err(DecodeError::UnknownCommand(other)),
                })
            }

            fn encode_body(&self, dst: &mut impl BufMut) {
                match self {
                    $(
                        CommandKind::$name(inner) => inner.encode_body(dst),
                    )+
                }
            }
        }

        $(
            impl From<$name> for CommandKind {
                fn from(body: $name) -> Self {
                    CommandKind::$name(body)
                }
            }
        )+
    }
}

define_enet_commands! {
    Acknowledge,
    Connect,
    VerifyConnect,
    Disconnect,
    Ping,
    SendReliable,
    SendUnreliable,
    SendFragment,
    SendUnsequenced,
    BandwidthLimit,
    ThrottleConfigure,
    SendUnreliableFragment,
}

impl CommandKind {
    /// Encoded body length in bytes.
    pub fn body_len(&self) -> usize {
        use crate::protocol::constants::*;
        match self {
            CommandKind::Acknowledge(_) => ACKNOWLEDGE_BODY_SIZE,
            CommandKind::Connect(_) => CONNECT_BODY_SIZE,
            CommandKind::VerifyConnect(_) => VERIFY_CONNECT_BODY_SIZE,
            CommandKind::Disconnect(_) => DISCONNECT_BODY_SIZE,
            CommandKind::Ping(_) => PING_BODY_SIZE,
            CommandKind::SendReliable(c) => SEND_RELIABLE_BODY_SIZE + c.data.len(),
            CommandKind::SendUnreliable(c) => SEND_UNRELIABLE_BODY_SIZE + c.data.len(),
            CommandKind::SendFragment(c) => SEND_FRAGMENT_BODY_SIZE + c.data.len(),
            CommandKind::SendUnsequenced(c) => SEND_UNSEQUENCED_BODY_SIZE + c.data.len(),
            CommandKind::BandwidthLimit(_) => BANDWIDTH_LIMIT_BODY_SIZE,
            CommandKind::ThrottleConfigure(_) => THROTTLE_CONFIGURE_BODY_SIZE,
            CommandKind::SendUnreliableFragment(c) => SEND_FRAGMENT_BODY_SIZE + c.0.data.len(),
        }
    }
}

/// A single command as it appears in a datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub flags: CommandFlags,
    pub channel_id: u8,
    pub reliable_sequence: Sequence16,
    pub kind: CommandKind,
}

impl Command {
    pub fn new(kind: impl Into<CommandKind>, channel_id: u8, reliable_sequence: Sequence16) -> Self {
        Self {
            flags: CommandFlags::empty(),
            channel_id,
            reliable_sequence,
            kind: kind.into(),
        }
    }

    /// Mark this command as requiring an acknowledgement.
    pub fn acknowledged(mut self) -> Self {
        self.flags |= CommandFlags::ACKNOWLEDGE;
        self
    }

    pub fn wants_ack(&self) -> bool {
        self.flags.contains(CommandFlags::ACKNOWLEDGE)
    }

    pub fn header(&self) -> CommandHeader {
        CommandHeader {
            command: self.kind.id(),
            flags: self.flags,
            channel_id: self.channel_id,
            reliable_sequence: self.reliable_sequence,
        }
    }

    pub fn encoded_len(&self) -> usize {
        COMMAND_HEADER_SIZE + self.kind.body_len()
    }

    pub fn encode(&self, dst: &mut impl BufMut) {
        self.header().encode(dst);
        self.kind.encode_body(dst);
    }

    /// Decode one command.
    ///
    /// A short header or body reports `TruncatedCommand`; an unknown type
    /// reports `UnknownCommand`. Either way the caller must stop, since the
    /// rest of the stream cannot be framed.
    pub fn decode(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let header = CommandHeader::decode(src).map_err(|_| DecodeError::TruncatedCommand {
            command: 0,
        })?;
        let kind = CommandKind::decode_body(header.command, src).map_err(|e| match e {
            DecodeError::UnexpectedEof => DecodeError::TruncatedCommand {
                command: header.command,
            },
            other => other,
        })?;
        Ok(Self {
            flags: header.flags,
            channel_id: header.channel_id,
            reliable_sequence: header.reliable_sequence,
            kind,
        })
    }
}
