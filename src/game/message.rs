//! Message framing for reliable payloads: `type:u32 LE` followed by a body.
//!
//! Text, action and game bodies are masked with the session key; the hello
//! body is empty and sent in the clear.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    game::{GamePacket, mask::apply_mask},
    protocol::packet::DecodeError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MessageType {
    Hello = 1,
    Text = 2,
    Action = 3,
    Game = 4,
}

impl TryFrom<u32> for MessageType {
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => MessageType::Hello,
            2 => MessageType::Text,
            3 => MessageType::Action,
            4 => MessageType::Game,
            other => return Err(DecodeError::UnknownMessageType(other)),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameMessage {
    Hello,
    Text(String),
    Action(String),
    Game(GamePacket),
}

impl GameMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            GameMessage::Hello => MessageType::Hello,
            GameMessage::Text(_) => MessageType::Text,
            GameMessage::Action(_) => MessageType::Action,
            GameMessage::Game(_) => MessageType::Game,
        }
    }

    pub fn encode(&self, key: u32) -> Bytes {
        let mut body = BytesMut::new();
        match self {
            GameMessage::Hello => {}
            GameMessage::Text(text) | GameMessage::Action(text) => {
                body.put_slice(text.as_bytes());
                body.put_u8(0);
            }
            GameMessage::Game(packet) => packet.encode(&mut body),
        }
        if !matches!(self, GameMessage::Hello) {
            apply_mask(&mut body, key);
        }

        let mut out = BytesMut::with_capacity(4 + body.len());
        out.put_u32_le(self.message_type() as u32);
        out.put_slice(&body);
        out.freeze()
    }

    pub fn decode(bytes: &[u8], key: u32) -> Result<Self, DecodeError> {
        if bytes.len() < 4 {
            return Err(DecodeError::ShortBuffer {
                needed: 4,
                available: bytes.len(),
            });
        }
        let (head, rest) = bytes.split_at(4);
        let ty = MessageType::try_from(u32::from_le_bytes([head[0], head[1], head[2], head[3]]))?;
        if ty == MessageType::Hello {
            return Ok(GameMessage::Hello);
        }

        let mut body = rest.to_vec();
        apply_mask(&mut body, key);
        Ok(match ty {
            MessageType::Hello => GameMessage::Hello,
            MessageType::Text => GameMessage::Text(decode_text(&body)),
            MessageType::Action => GameMessage::Action(decode_text(&body)),
            MessageType::Game => GameMessage::Game(GamePacket::unpack(&body)?),
        })
    }
}

fn decode_text(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_owned()
}

/// `key|value` lines, as carried by text and action messages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextFields {
    fields: Vec<(String, String)>,
}

impl TextFields {
    pub fn parse(text: &str) -> Self {
        let fields = text
            .lines()
            .filter_map(|line| line.split_once('|'))
            .map(|(k, v)| (k.trim().to_owned(), v.trim_end().to_owned()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn render(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}|{v}\n"))
            .collect()
    }
}
