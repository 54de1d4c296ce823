// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;

use crate::base::{Decode, Encode};
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};
use crate::header::{FixedHeader, PacketType};
use crate::var_int::VarInt;
use crate::v5::property::{Properties, AUTH_PROPERTIES};
use crate::v5::reason_code::{ReasonCode, AUTH_REASONS};

/// MQTT 5 AUTH packet, used for extended (e.g. challenge/response)
/// authentication exchanges after CONNECT. Remaining Length 0 means
/// `Success` with no properties, same as DISCONNECT.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthPacket<'a> {
    reason_code: ReasonCode,
    properties: Properties<'a>,
}

impl<'a> AuthPacket<'a> {
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
        FixedHeader::new(PacketType::Auth, VarInt::new(remaining)?).encode(&mut bw)?;
        if !self.is_shorthand() {
            bw.write_u8(self.reason_code as u8)?;
            self.properties.encode(&mut bw)?;
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(bw.len() as u32)
    }

    /// # Errors
    /// `DecodeError::BadResponse` if the reason code is outside the AUTH
    /// family; `ProtocolError`/`MalformedPacket` bubbled up from the
    /// property block.
    pub fn decode(remaining_data: &'a [u8]) -> Result<Self, DecodeError> {
        if remaining_data.is_empty() {
            return Ok(Self {
                reason_code: ReasonCode::Success,
                properties: Properties::empty(),
            });
        }

        let mut ba = ByteArray::new(remaining_data);
        let reason_code = ReasonCode::try_from(ba.read_byte()?)?;
        if !AUTH_REASONS.contains(&reason_code) {
            log::error!("v5/auth: reason code {reason_code:?} not valid for AUTH");
            return Err(DecodeError::BadResponse);
        }

        let properties = Properties::decode(&mut ba)?;
        properties.validate(AUTH_PROPERTIES)?;

        if ba.remaining_bytes() != 0 {
            log::error!("v5/auth: trailing bytes after property block");
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
        let packet = AuthPacket::new(ReasonCode::Success, Properties::empty());
        let (_remaining, total) = packet.encoded_len().unwrap();
        let mut buf = vec![0u8; total as usize];
        packet.encode_into(&mut buf).unwrap();
        assert_eq!(buf, [0xf0, 0x00]);
        assert_eq!(AuthPacket::decode(&buf[2..]).unwrap(), packet);
    }

    #[test]
    fn continue_authentication_round_trip() {
        let packet = AuthPacket::new(ReasonCode::ContinueAuthentication, Properties::empty());
        let (_remaining, total) = packet.encoded_len().unwrap();
        let mut buf = vec![0u8; total as usize];
        packet.encode_into(&mut buf).unwrap();
        let decoded = AuthPacket::decode(&buf[2..]).unwrap();
        assert_eq!(decoded.reason_code(), ReasonCode::ContinueAuthentication);
    }
}
