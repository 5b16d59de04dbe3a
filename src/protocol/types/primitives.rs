use std::mem;

use bytes::{Buf, BufMut};

use crate::protocol::packet::{DecodeError, EnetEncodable};

macro_rules! impl_enet_int {
    ($ty:ty, $put:ident, $get:ident) => {
        impl EnetEncodable for $ty {
            fn encode_enet(&self, dst: &mut impl BufMut) {
                dst.$put(*self);
            }

            fn decode_enet(src: &mut impl Buf) -> Result<Self, DecodeError> {
                if src.remaining() < mem::size_of::<$ty>() {
                    return Err(DecodeError::UnexpectedEof);
                }
                Ok(src.$get())
            }
        }
    };
}

// The transport speaks network byte order.
impl_enet_int!(u8, put_u8, get_u8);
impl_enet_int!(u16, put_u16, get_u16);
impl_enet_int!(u32, put_u32, get_u32);

/// Little-endian wrappers, used by the game layer which sits inside the
/// big-endian transport but follows the client's in-memory layout.
macro_rules! impl_le {
    ($name:ident, $ty:ty, $put:ident, $get:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name(pub $ty);

        impl EnetEncodable for $name {
            fn encode_enet(&self, dst: &mut impl BufMut) {
                dst.$put(self.0);
            }

            fn decode_enet(src: &mut impl Buf) -> Result<Self, DecodeError> {
                if src.remaining() < mem::size_of::<$ty>() {
                    return Err(DecodeError::UnexpectedEof);
                }
                Ok($name(src.$get()))
            }
        }
    };
}

impl_le!(U16LE, u16, put_u16_le, get_u16_le);
impl_le!(U32LE, u32, put_u32_le, get_u32_le);
impl_le!(I32LE, i32, put_i32_le, get_i32_le);
impl_le!(F32LE, f32, put_f32_le, get_f32_le);
