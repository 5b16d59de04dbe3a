pub mod commands;
mod error;
mod registry;

pub use commands::*;
pub use error::{DecodeError, EncodeError};
pub use registry::{Command, CommandHeader, CommandKind};

use bytes::{Buf, BufMut};

/// Trait implemented by all concrete ENet command body types.
///
/// Implementations are responsible for encoding/decoding only the
/// command body – the 4-byte command header is handled by `Command`.
pub trait CommandBody: Sized {
    /// The command type nibble used to identify this command on the wire.
    const ID: u8;

    /// Encode the body of this command into the destination buffer.
    fn encode_body(&self, dst: &mut impl BufMut);

    /// Decode the body of this command from the source buffer.
    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError>;
}

/// Trait for types that know how to encode/decode themselves using
/// the ENet wire format.
pub trait EnetEncodable: Sized {
    /// Encode this value into the destination buffer.
    fn encode_enet(&self, dst: &mut impl BufMut);

    /// Decode a value of this type from the source buffer.
    fn decode_enet(src: &mut impl Buf) -> Result<Self, DecodeError>;
}
