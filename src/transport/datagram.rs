use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::protocol::{
    constants::{DATAGRAM_HEADER_SIZE, HeaderFlags},
    packet::{Command, DecodeError},
    types::DatagramHeader,
};

/// One UDP datagram: a header followed by a stream of commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub header: DatagramHeader,
    pub commands: Vec<Command>,
}

impl Datagram {
    pub fn encode(&self, dst: &mut impl BufMut) {
        self.header.encode(dst);
        for command in &self.commands {
            command.encode(dst);
        }
    }

    /// Decode a datagram.
    ///
    /// A short header or a compressed datagram fails outright. A bad command
    /// stops decoding there: the commands before it are returned together
    /// with the error that halted the stream.
    pub fn decode(bytes: &[u8]) -> Result<(Self, Option<DecodeError>), DecodeError> {
        let mut src = bytes;
        let header = DatagramHeader::decode(&mut src)?;
        if header.flags.contains(HeaderFlags::COMPRESSED) {
            return Err(DecodeError::CompressedDatagram);
        }

        let mut commands = Vec::new();
        let mut halted = None;
        while src.has_remaining() {
            match Command::decode(&mut src) {
                Ok(command) => commands.push(command),
                Err(e) => {
                    halted = Some(e);
                    break;
                }
            }
        }
        Ok((Self { header, commands }, halted))
    }
}

pub fn decode_datagram(bytes: &[u8]) -> Result<(Datagram, Option<DecodeError>), DecodeError> {
    Datagram::decode(bytes)
}

pub fn encode_datagram(header: &DatagramHeader, commands: &[Command]) -> Bytes {
    let len = DATAGRAM_HEADER_SIZE + commands.iter().map(Command::encoded_len).sum::<usize>();
    let mut buf = BytesMut::with_capacity(len);
    header.encode(&mut buf);
    for command in commands {
        command.encode(&mut buf);
    }
    buf.freeze()
}
