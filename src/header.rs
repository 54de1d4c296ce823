// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;

use crate::base::{Decode, Encode, QoS};
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};
use crate::var_int::VarInt;

/// The fixed header's first byte: packet type in the high nibble, flags in
/// the low nibble. PUBLISH folds its flags into the variant; every other
/// type has a fixed, reserved flag pattern that is validated on decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketType {
    Connect,
    ConnectAck,
    Publish { dup: bool, qos: QoS, retain: bool },
    PublishAck,
    PublishReceived,
    PublishRelease,
    PublishComplete,
    Subscribe,
    SubscribeAck,
    Unsubscribe,
    UnsubscribeAck,
    PingRequest,
    PingResponse,
    Disconnect,
    Auth,
}

impl From<PacketType> for u8 {
    fn from(t: PacketType) -> Self {
        match t {
            PacketType::Connect => 0b0001_0000,
            PacketType::ConnectAck => 0b0010_0000,
            PacketType::Publish { dup, qos, retain } => {
                let mut v = 0b0011_0000;
                if dup {
                    v |= 0b0000_1000;
                }
                v |= (qos as u8) << 1;
                if retain {
                    v |= 0b0000_0001;
                }
                v
            }
            PacketType::PublishAck => 0b0100_0000,
            PacketType::PublishReceived => 0b0101_0000,
            PacketType::PublishRelease => 0b0110_0010,
            PacketType::PublishComplete => 0b0111_0000,
            PacketType::Subscribe => 0b1000_0010,
            PacketType::SubscribeAck => 0b1001_0000,
            PacketType::Unsubscribe => 0b1010_0010,
            PacketType::UnsubscribeAck => 0b1011_0000,
            PacketType::PingRequest => 0b1100_0000,
            PacketType::PingResponse => 0b1101_0000,
            PacketType::Disconnect => 0b1110_0000,
            PacketType::Auth => 0b1111_0000,
        }
    }
}

impl TryFrom<u8> for PacketType {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        let type_bits = v >> 4;
        let flags = v & 0x0f;
        match type_bits {
            1 => reject_reserved_flags(flags, 0b0000, PacketType::Connect),
            2 => reject_reserved_flags(flags, 0b0000, PacketType::ConnectAck),
            3 => {
                let dup = flags & 0b1000 != 0;
                let qos = QoS::try_from((flags & 0b0110) >> 1)?;
                let retain = flags & 0b0001 != 0;
                if flags & 0b0110 == 0b0110 {
                    log::error!("header: invalid qos bits 0b11 in PUBLISH flags");
                    return Err(DecodeError::BadResponse);
                }
                Ok(PacketType::Publish { dup, qos, retain })
            }
            4 => reject_reserved_flags(flags, 0b0000, PacketType::PublishAck),
            5 => reject_reserved_flags(flags, 0b0000, PacketType::PublishReceived),
            6 => reject_reserved_flags(flags, 0b0010, PacketType::PublishRelease),
            7 => reject_reserved_flags(flags, 0b0000, PacketType::PublishComplete),
            8 => reject_reserved_flags(flags, 0b0010, PacketType::Subscribe),
            9 => reject_reserved_flags(flags, 0b0000, PacketType::SubscribeAck),
            10 => reject_reserved_flags(flags, 0b0010, PacketType::Unsubscribe),
            11 => reject_reserved_flags(flags, 0b0000, PacketType::UnsubscribeAck),
            12 => reject_reserved_flags(flags, 0b0000, PacketType::PingRequest),
            13 => reject_reserved_flags(flags, 0b0000, PacketType::PingResponse),
            14 => reject_reserved_flags(flags, 0b0000, PacketType::Disconnect),
            15 => reject_reserved_flags(flags, 0b0000, PacketType::Auth),
            _ => {
                log::error!("header: unknown packet type bits {type_bits}");
                Err(DecodeError::BadResponse)
            }
        }
    }
}

fn reject_reserved_flags(
    flags: u8,
    expected: u8,
    t: PacketType,
) -> Result<PacketType, DecodeError> {
    if flags != expected {
        log::error!("header: invalid reserved flags {flags:#06b} for {t:?}");
        return Err(DecodeError::BadResponse);
    }
    Ok(t)
}

/// The fixed header shared by every MQTT control packet: packet type byte
/// plus a Remaining Length variable byte integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedHeader {
    packet_type: PacketType,
    remaining_length: VarInt,
}

impl FixedHeader {
    #[must_use]
    pub const fn new(packet_type: PacketType, remaining_length: VarInt) -> Self {
        Self {
            packet_type,
            remaining_length,
        }
    }

    #[must_use]
    pub const fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    #[must_use]
    pub const fn remaining_length(&self) -> u32 {
        self.remaining_length.value()
    }

    #[must_use]
    pub const fn bytes(&self) -> u32 {
        1 + self.remaining_length.bytes()
    }
}

impl Encode for FixedHeader {
    fn encode(&self, bw: &mut ByteWriter) -> Result<u32, EncodeError> {
        bw.write_u8(self.packet_type.into())?;
        let n = self.remaining_length.encode(bw)?;
        Ok(1 + n)
    }
}

impl<'a> Decode<'a> for FixedHeader {
    fn decode(ba: &mut ByteArray<'a>) -> Result<Self, DecodeError> {
        let byte0 = ba.read_byte()?;
        let packet_type = PacketType::try_from(byte0)?;
        let remaining_length = VarInt::decode(ba)?;
        Ok(Self {
            packet_type,
            remaining_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_ping_response() {
        let header = FixedHeader::new(PacketType::PingResponse, VarInt::new(0).unwrap());
        let mut buf = [0u8; 2];
        let mut bw = ByteWriter::new(&mut buf);
        let n = header.encode(&mut bw).unwrap();
        assert_eq!(n, 2);
        assert_eq!(buf, [0xd0, 0x00]);
    }

    #[test]
    fn decode_publish_flags() {
        let buf = [0b0011_1101, 19];
        let mut ba = ByteArray::new(&buf);
        let header = FixedHeader::decode(&mut ba).unwrap();
        assert_eq!(
            header.packet_type(),
            PacketType::Publish {
                dup: true,
                qos: QoS::ExactlyOnce,
                retain: true,
            }
        );
        assert_eq!(header.remaining_length(), 19);
    }

    #[test]
    fn decode_publish_release_requires_reserved_bits() {
        let buf = [0b0110_0000, 2];
        let mut ba = ByteArray::new(&buf);
        assert_eq!(
            FixedHeader::decode(&mut ba),
            Err(DecodeError::BadResponse)
        );
    }
}
