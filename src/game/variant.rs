//! Indexed, typed value lists used for remote function calls.
//!
//! Wire format: `count:u8`, then per entry `index:u8, type:u8, value`.
//! Values are little-endian; strings carry a `u32` byte length.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::protocol::{
    packet::{DecodeError, EncodeError, EnetEncodable},
    types::{F32LE, I32LE, U32LE, read_payload},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VariantType {
    None = 0,
    Float = 1,
    String = 2,
    Vector2 = 3,
    Vector3 = 4,
    UInt = 5,
    Int = 9,
}

impl TryFrom<u8> for VariantType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => VariantType::None,
            1 => VariantType::Float,
            2 => VariantType::String,
            3 => VariantType::Vector2,
            4 => VariantType::Vector3,
            5 => VariantType::UInt,
            9 => VariantType::Int,
            other => return Err(DecodeError::UnknownVariantType(other)),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    None,
    Float(f32),
    String(String),
    Vector2([f32; 2]),
    Vector3([f32; 3]),
    UInt(u32),
    Int(i32),
}

impl Variant {
    pub fn variant_type(&self) -> VariantType {
        match self {
            Variant::None => VariantType::None,
            Variant::Float(_) => VariantType::Float,
            Variant::String(_) => VariantType::String,
            Variant::Vector2(_) => VariantType::Vector2,
            Variant::Vector3(_) => VariantType::Vector3,
            Variant::UInt(_) => VariantType::UInt,
            Variant::Int(_) => VariantType::Int,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }

    fn encode_value(&self, dst: &mut impl BufMut) {
        match self {
            Variant::None => {}
            Variant::Float(v) => F32LE(*v).encode_enet(dst),
            Variant::String(s) => {
                U32LE(s.len() as u32).encode_enet(dst);
                dst.put_slice(s.as_bytes());
            }
            Variant::Vector2(v) => v.iter().for_each(|f| F32LE(*f).encode_enet(dst)),
            Variant::Vector3(v) => v.iter().for_each(|f| F32LE(*f).encode_enet(dst)),
            Variant::UInt(v) => U32LE(*v).encode_enet(dst),
            Variant::Int(v) => I32LE(*v).encode_enet(dst),
        }
    }

    fn decode_value(ty: VariantType, src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(match ty {
            VariantType::None => Variant::None,
            VariantType::Float => Variant::Float(F32LE::decode_enet(src)?.0),
            VariantType::String => {
                let len = U32LE::decode_enet(src)?.0 as usize;
                let raw = read_payload(src, len)?;
                let s = std::str::from_utf8(&raw).map_err(|_| DecodeError::InvalidUtf8)?;
                Variant::String(s.to_owned())
            }
            VariantType::Vector2 => Variant::Vector2([
                F32LE::decode_enet(src)?.0,
                F32LE::decode_enet(src)?.0,
            ]),
            VariantType::Vector3 => Variant::Vector3([
                F32LE::decode_enet(src)?.0,
                F32LE::decode_enet(src)?.0,
                F32LE::decode_enet(src)?.0,
            ]),
            VariantType::UInt => Variant::UInt(U32LE::decode_enet(src)?.0),
            VariantType::Int => Variant::Int(I32LE::decode_enet(src)?.0),
        })
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        Variant::String(s.to_owned())
    }
}

impl From<String> for Variant {
    fn from(s: String) -> Self {
        Variant::String(s)
    }
}

impl From<f32> for Variant {
    fn from(v: f32) -> Self {
        Variant::Float(v)
    }
}

impl From<u32> for Variant {
    fn from(v: u32) -> Self {
        Variant::UInt(v)
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Variant::Int(v)
    }
}

impl From<(f32, f32)> for Variant {
    fn from((x, y): (f32, f32)) -> Self {
        Variant::Vector2([x, y])
    }
}

impl From<(f32, f32, f32)> for Variant {
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Variant::Vector3([x, y, z])
    }
}

/// Ordered `(index, value)` pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariantList {
    entries: Vec<(u8, Variant)>,
}

impl VariantList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a function call: the name goes at index 0.
    pub fn call(function: &str) -> Self {
        Self::new().with(function)
    }

    /// Append `value` at the next index.
    #[must_use]
    pub fn with(mut self, value: impl Into<Variant>) -> Self {
        self.push(value);
        self
    }

    pub fn push(&mut self, value: impl Into<Variant>) {
        let index = self.entries.len() as u8;
        self.entries.push((index, value.into()));
    }

    pub fn push_indexed(&mut self, index: u8, value: impl Into<Variant>) {
        self.entries.push((index, value.into()));
    }

    pub fn get(&self, index: u8) -> Option<&Variant> {
        self.entries
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, v)| v)
    }

    /// Name of the called function, if this list is a call.
    pub fn function(&self) -> Option<&str> {
        self.get(0).and_then(Variant::as_str)
    }

    pub fn entries(&self) -> &[(u8, Variant)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        let count =
            u8::try_from(self.entries.len()).map_err(|_| EncodeError::TooManyVariants(self.entries.len()))?;
        dst.put_u8(count);
        for (index, value) in &self.entries {
            dst.put_u8(*index);
            dst.put_u8(value.variant_type() as u8);
            value.encode_value(dst);
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Bytes, EncodeError> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode a list. An unrecognised type byte halts decoding: its value
    /// width is unknown, so nothing after it can be framed.
    pub fn decode(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let count = u8::decode_enet(src)?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let index = u8::decode_enet(src)?;
            let ty = VariantType::try_from(u8::decode_enet(src)?)?;
            entries.push((index, Variant::decode_value(ty, src)?));
        }
        Ok(Self { entries })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut src = bytes;
        Self::decode(&mut src)
    }
}
