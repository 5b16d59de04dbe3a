use thiserror::Error;

/// Errors that may occur while decoding ENet protocol values, commands or
/// the game payloads carried inside them.
///
/// This type is kept small and generic so it can be shared by all
/// `EnetEncodable` implementations and command bodies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer did not contain enough bytes to decode the requested value.
    #[error("Unexpected EoF, not enough bytes to read requested type.")]
    UnexpectedEof,

    /// A datagram shorter than the 4-byte protocol header.
    #[error("Malformed datagram header, fewer than 4 bytes available.")]
    MalformedHeader,

    /// The datagram header advertised a compressed command stream.
    #[error("Compressed datagrams are not supported.")]
    CompressedDatagram,

    /// A command body ran past the end of the datagram.
    ///
    /// Commands decoded before this one are still valid.
    #[error("Truncated command, type: {command}")]
    TruncatedCommand { command: u8 },

    /// A command type nibble that does not map to any known command.
    #[error("Unknown command, type: {0}")]
    UnknownCommand(u8),

    /// A fixed-layout game packet header did not fit in the buffer.
    #[error("Short buffer, needed {needed} bytes but only {available} available.")]
    ShortBuffer { needed: usize, available: usize },

    /// A declared trailing length is larger than what the buffer holds.
    #[error("Length mismatch, declared {declared} bytes but only {available} available.")]
    LengthMismatch { declared: usize, available: usize },

    /// A variant type byte with no known width.
    #[error("An unknown variant type was provided. Type byte: {0}")]
    UnknownVariantType(u8),

    /// A string field was not valid UTF-8.
    #[error("String field is not valid UTF-8.")]
    InvalidUtf8,

    /// A game message type that does not map to any known variant.
    #[error("An unknown message type was provided. Type: {0}")]
    UnknownMessageType(u32),
}

/// Errors that may occur while encoding values that have wire-imposed
/// size limits.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Payload of {len} bytes exceeds the maximum of {max}.")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("A variant list holds at most 255 entries, got {0}.")]
    TooManyVariants(usize),
}
