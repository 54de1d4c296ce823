// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;

use crate::base::{Decode, Encode};
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};
use crate::header::{FixedHeader, PacketType};
use crate::var_int::VarInt;
use crate::v5::property::{Properties, DISCONNECT_PROPERTIES};
use crate::v5::reason_code::{ReasonCode, DISCONNECT_REASONS};

/// MQTT 5 DISCONNECT: unlike v3.1.1's empty packet, carries a reason code
/// and property block — both omitted on the wire for the default
/// (`Success`, no properties) case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisconnectPacket<'a> {
    reason_code: ReasonCode,
    properties: Properties<'a>,
}

impl<'a> DisconnectPacket<'a> {
    #[must_use]
    pub const fn new(reason_code: ReasonCode, properties: Properties<'a>) -> Self {
        Self {
            reason_code,
            properties,
        }
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
            0
        } else {
            1 + self.properties.bytes()
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
        FixedHeader::new(PacketType::Disconnect, VarInt::new(remaining)?).encode(&mut bw)?;
        if !self.is_shorthand() {
            bw.write_u8(self.reason_code as u8)?;
            self.properties.encode(&mut bw)?;
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(bw.len() as u32)
    }

    /// # Errors
    /// `DecodeError::BadResponse` if the reason code is outside the
    /// DISCONNECT family; `ProtocolError`/`MalformedPacket` bubbled up
    /// from the property block.
    pub fn decode(remaining_data: &'a [u8]) -> Result<Self, DecodeError> {
        if remaining_data.is_empty() {
            return Ok(Self {
                reason_code: ReasonCode::Success,
                properties: Properties::empty(),
            });
        }

        let mut ba = ByteArray::new(remaining_data);
        let reason_code = ReasonCode::try_from(ba.read_byte()?)?;
        if !DISCONNECT_REASONS.contains(&reason_code) {
            log::error!("v5/disconnect: reason code {reason_code:?} not valid for DISCONNECT");
            return Err(DecodeError::BadResponse);
        }

        let properties = if ba.remaining_bytes() == 0 {
            Properties::empty()
        } else {
            let properties = Properties::decode(&mut ba)?;
            properties.validate(DISCONNECT_PROPERTIES)?;
            properties
        };

        if ba.remaining_bytes() != 0 {
            log::error!("v5/disconnect: trailing bytes after property block");
            return Err(DecodeError::MalformedPacket);
        }

        Ok(Self {
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
        let packet = DisconnectPacket::new(ReasonCode::Success, Properties::empty());
        let (_remaining, total) = packet.encoded_len().unwrap();
        let mut buf = vec![0u8; total as usize];
        packet.encode_into(&mut buf).unwrap();
        assert_eq!(buf, [0xe0, 0x00]);
        assert_eq!(DisconnectPacket::decode(&buf[2..]).unwrap(), packet);
    }

    #[test]
    fn explicit_reason_round_trip() {
        let packet = DisconnectPacket::new(ReasonCode::ServerBusy, Properties::empty());
        let (_remaining, total) = packet.encoded_len().unwrap();
        let mut buf = vec![0u8; total as usize];
        packet.encode_into(&mut buf).unwrap();
        let decoded = DisconnectPacket::decode(&buf[2..]).unwrap();
        assert_eq!(decoded.reason_code(), ReasonCode::ServerBusy);
    }
}
