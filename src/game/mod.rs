//! Application layer carried inside reliable ENet payloads.
//!
//! The game layer is little-endian throughout, independent of the
//! big-endian transport framing around it.

pub mod mask;
pub mod message;
pub mod variant;

pub use mask::{apply_mask, mask};
pub use message::{GameMessage, MessageType, TextFields};
pub use variant::{Variant, VariantList, VariantType};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::protocol::{
    packet::{DecodeError, EncodeError, EnetEncodable},
    types::{F32LE, I32LE, U32LE},
};

/// Size of the fixed game packet header: fifteen 4-byte fields.
pub const GAME_PACKET_HEADER_SIZE: usize = 60;

/// `flags` bit marking a packet whose trailing data is an extended payload,
/// such as a variant list.
pub const FLAG_EXTENDED: u32 = 0x8;

/// Net id addressing the system rather than a player.
pub const SYSTEM_NET_ID: i32 = -1;

macro_rules! tank_packet_types {
    ($($name:ident = $value:literal,)+) => {
        /// Known values of [`GamePacket::packet_type`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum TankPacketType {
            $($name = $value,)+
        }

        impl TryFrom<u32> for TankPacketType {
            type Error = u32;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(TankPacketType::$name),)+
                    other => Err(other),
                }
            }
        }
    };
}

tank_packet_types! {
    State = 0,
    CallFunction = 1,
    UpdateStatus = 2,
    TileChangeRequest = 3,
    SendMapData = 4,
    SendTileUpdateData = 5,
    SendTileUpdateDataMultiple = 6,
    TileActivateRequest = 7,
    TileApplyDamage = 8,
    SendInventoryState = 9,
    ItemActivateRequest = 10,
    ItemActivateObjectRequest = 11,
    SendTileTreeState = 12,
    ModifyItemInventory = 13,
    ItemChangeObject = 14,
    SendLock = 15,
    SendItemDatabaseData = 16,
    SendParticleEffect = 17,
    SetIconState = 18,
    ItemEffect = 19,
    SetCharacterState = 20,
    PingReply = 21,
    PingRequest = 22,
    GotPunched = 23,
    AppCheckResponse = 24,
    AppIntegrityFail = 25,
    Disconnect = 26,
    BattleJoin = 27,
    BattleEvent = 28,
    UseDoor = 29,
    SendParental = 30,
    GoneFishin = 31,
    Steam = 32,
    PetBattle = 33,
    Npc = 34,
    Special = 35,
    ParticleEffectV2 = 36,
    ActiveArrowToItem = 37,
    SelectTileIndex = 38,
    SendPlayerTributeData = 39,
}

/// Fixed-layout game packet.
///
/// Header layout (little-endian, 4 bytes each, in this order): type,
/// object type, count1, count2, net id, item, flags, float var, int data,
/// x, y, speed x, speed y, secondary net id, trailing data length.
/// The secondary net id travels as a float.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GamePacket {
    pub packet_type: u32,
    pub object_type: u32,
    pub count1: u32,
    pub count2: u32,
    pub net_id: i32,
    pub item: u32,
    pub flags: u32,
    pub float_var: f32,
    pub int_data: i32,
    pub pos_x: f32,
    pub pos_y: f32,
    pub speed_x: f32,
    pub speed_y: f32,
    pub secondary_net_id: f32,
    pub data: Bytes,
}

impl GamePacket {
    pub fn new(packet_type: TankPacketType) -> Self {
        Self {
            packet_type: packet_type as u32,
            ..Self::default()
        }
    }

    /// A CALL_FUNCTION packet addressed from the system, carrying `call`.
    pub fn call_function(call: &VariantList) -> Result<Self, EncodeError> {
        Ok(Self {
            net_id: SYSTEM_NET_ID,
            flags: FLAG_EXTENDED,
            data: call.to_bytes()?,
            ..Self::new(TankPacketType::CallFunction)
        })
    }

    pub fn kind(&self) -> Option<TankPacketType> {
        TankPacketType::try_from(self.packet_type).ok()
    }

    pub fn encoded_len(&self) -> usize {
        GAME_PACKET_HEADER_SIZE + self.data.len()
    }

    pub fn encode(&self, dst: &mut impl BufMut) {
        U32LE(self.packet_type).encode_enet(dst);
        U32LE(self.object_type).encode_enet(dst);
        U32LE(self.count1).encode_enet(dst);
        U32LE(self.count2).encode_enet(dst);
        I32LE(self.net_id).encode_enet(dst);
        U32LE(self.item).encode_enet(dst);
        U32LE(self.flags).encode_enet(dst);
        F32LE(self.float_var).encode_enet(dst);
        I32LE(self.int_data).encode_enet(dst);
        F32LE(self.pos_x).encode_enet(dst);
        F32LE(self.pos_y).encode_enet(dst);
        F32LE(self.speed_x).encode_enet(dst);
        F32LE(self.speed_y).encode_enet(dst);
        F32LE(self.secondary_net_id).encode_enet(dst);
        U32LE(self.data.len() as u32).encode_enet(dst);
        dst.put_slice(&self.data);
    }

    pub fn pack(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decode a packet, taking exactly the declared number of trailing bytes.
    pub fn decode(src: &mut impl Buf) -> Result<Self, DecodeError> {
        if src.remaining() < GAME_PACKET_HEADER_SIZE {
            return Err(DecodeError::ShortBuffer {
                needed: GAME_PACKET_HEADER_SIZE,
                available: src.remaining(),
            });
        }
        let mut packet = Self {
            packet_type: U32LE::decode_enet(src)?.0,
            object_type: U32LE::decode_enet(src)?.0,
            count1: U32LE::decode_enet(src)?.0,
            count2: U32LE::decode_enet(src)?.0,
            net_id: I32LE::decode_enet(src)?.0,
            item: U32LE::decode_enet(src)?.0,
            flags: U32LE::decode_enet(src)?.0,
            float_var: F32LE::decode_enet(src)?.0,
            int_data: I32LE::decode_enet(src)?.0,
            pos_x: F32LE::decode_enet(src)?.0,
            pos_y: F32LE::decode_enet(src)?.0,
            speed_x: F32LE::decode_enet(src)?.0,
            speed_y: F32LE::decode_enet(src)?.0,
            secondary_net_id: F32LE::decode_enet(src)?.0,
            data: Bytes::new(),
        };
        let declared = U32LE::decode_enet(src)?.0 as usize;
        if declared > src.remaining() {
            return Err(DecodeError::LengthMismatch {
                declared,
                available: src.remaining(),
            });
        }
        packet.data = src.copy_to_bytes(declared);
        Ok(packet)
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut src = bytes;
        Self::decode(&mut src)
    }
}
