// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;

use crate::base::{Decode, Encode, PacketId};
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};
use crate::header::{FixedHeader, PacketType};
use crate::var_int::VarInt;
use crate::v5::property::{Properties, ACK_PROPERTIES};
use crate::v5::reason_code::{ReasonCode, PUBLISH_RELEASE_REASONS};

/// MQTT 5 PUBCOMP, the final step of the QoS 2 handshake. Shares its
/// reason code family with PUBREL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublishCompletePacket<'a> {
    packet_id: PacketId,
    reason_code: ReasonCode,
    properties: Properties<'a>,
}

impl<'a> PublishCompletePacket<'a> {
    /// # Errors
    /// `EncodeError::BadParameter` if `packet_id` is zero.
    pub const fn new(
        packet_id: PacketId,
        reason_code: ReasonCode,
        properties: Properties<'a>,
    ) -> Result<Self, EncodeError> {
        if packet_id == 0 {
            return Err(EncodeError::BadParameter);
        }
        Ok(Self {
            packet_id,
            reason_code,
            properties,
        })
    }

    #[must_use]
    pub const fn packet_id(&self) -> PacketId {
        self.packet_id
    }

    #[must_use]
    pub const fn reason_code(&self) -> ReasonCode {
        self.reason_code
    }

    #[must_use]
    pub const fn properties(&self) -> Properties<'a> {
        self.properties
    }

    fn is_shorthand(&self) -> bool {
        matches!(self.reason_code, ReasonCode::Success) && self.properties.is_empty()
    }

    /// # Errors
    /// `EncodeError::BadParameter` if the total would exceed
    /// `MAX_REMAINING_LENGTH`.
    pub fn encoded_len(&self) -> Result<(u32, u32), EncodeError> {
        let remaining: u32 = if self.is_shorthand() {
            2
        } else {
            2 + 1 + self.properties.bytes()
        };
        if remaining > crate::var_int::MAX_REMAINING_LENGTH {
            return Err(EncodeError::BadParameter);
        }
        let total = 1 + VarInt::size(remaining) + remaining;
        Ok((remaining, total))
    }

    /// # Errors
    /// `EncodeError::NoMemory` if `buf` is smaller than the reported total
    /// size.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<u32, EncodeError> {
        let (remaining, _total) = self.encoded_len()?;
        let mut bw = ByteWriter::new(buf);
        FixedHeader::new(PacketType::PublishComplete, VarInt::new(remaining)?).encode(&mut bw)?;
        bw.write_u16(self.packet_id)?;
        if !self.is_shorthand() {
            bw.write_u8(self.reason_code as u8)?;
            self.properties.encode(&mut bw)?;
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(bw.len() as u32)
    }

    /// # Errors
    /// `DecodeError::BadResponse` if `remaining_data` is too short, the
    /// packet id is zero, or the reason code is outside the PUBCOMP family.
    pub fn decode(remaining_data: &'a [u8]) -> Result<Self, DecodeError> {
        let mut ba = ByteArray::new(remaining_data);
        let packet_id = ba.read_u16()?;
        if packet_id == 0 {
            return Err(DecodeError::BadResponse);
        }

        if ba.remaining_bytes() == 0 {
            return Ok(Self {
                packet_id,
                reason_code: ReasonCode::Success,
                properties: Properties::empty(),
            });
        }

        let reason_code = ReasonCode::try_from(ba.read_byte()?)?;
        if !PUBLISH_RELEASE_REASONS.contains(&reason_code) {
            log::error!("v5/publish_complete: reason code {reason_code:?} not valid for PUBCOMP");
            return Err(DecodeError::BadResponse);
        }

        let properties = if ba.remaining_bytes() == 0 {
            Properties::empty()
        } else {
            let properties = Properties::decode(&mut ba)?;
            properties.validate(ACK_PROPERTIES)?;
            properties
        };

        if ba.remaining_bytes() != 0 {
            log::error!("v5/publish_complete: trailing bytes after property block");
            return Err(DecodeError::MalformedPacket);
        }

        Ok(Self {
            packet_id,
            reason_code,
            properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_round_trip() {
        let packet =
            PublishCompletePacket::new(12, ReasonCode::Success, Properties::empty()).unwrap();
        let (_remaining, total) = packet.encoded_len().unwrap();
        let mut buf = vec![0u8; total as usize];
        packet.encode_into(&mut buf).unwrap();
        assert_eq!(buf, [0x70, 0x02, 0x00, 0x0c]);
        assert_eq!(PublishCompletePacket::decode(&buf[2..]).unwrap(), packet);
    }

    #[test]
    fn rejects_zero_packet_id() {
        assert_eq!(
            PublishCompletePacket::new(0, ReasonCode::Success, Properties::empty()),
            Err(EncodeError::BadParameter)
        );
    }
}
