// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;

use crate::base::{Decode, Encode, PacketId};
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};
use crate::header::{FixedHeader, PacketType};
use crate::var_int::VarInt;
use crate::v5::property::{Properties, UNSUBSCRIBE_ACK_PROPERTIES};
use crate::v5::reason_code::{ReasonCode, UNSUBSCRIBE_REASONS};

/// MQTT 5 UNSUBACK packet: one reason code per UNSUBSCRIBE topic filter,
/// in the same order, preceded by a property block. Unlike v3.1.1's
/// UNSUBACK (packet id only), v5 reports per-filter outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsubscribeAckPacket<'a> {
    packet_id: PacketId,
    properties: Properties<'a>,
    reasons: &'a [ReasonCode],
}

impl<'a> UnsubscribeAckPacket<'a> {
    /// # Errors
    /// `EncodeError::BadParameter` if `packet_id` is zero or `reasons` is
    /// empty.
    pub fn new(
        packet_id: PacketId,
        properties: Properties<'a>,
        reasons: &'a [ReasonCode],
    ) -> Result<Self, EncodeError> {
        if packet_id == 0 || reasons.is_empty() {
            return Err(EncodeError::BadParameter);
        }
        Ok(Self {
            packet_id,
            properties,
            reasons,
        })
    }

    #[must_use]
    pub const fn packet_id(&self) -> PacketId {
        self.packet_id
    }

    #[must_use]
    pub const fn properties(&self) -> Properties<'a> {
        self.properties
    }

    #[must_use]
    pub const fn reasons(&self) -> &'a [ReasonCode] {
        self.reasons
    }

    /// # Errors
    /// `EncodeError::BadParameter` if the total would exceed
    /// `MAX_REMAINING_LENGTH`.
    pub fn encoded_len(&self) -> Result<(u32, u32), EncodeError> {
        let remaining = 2
            + self.properties.bytes()
            + u32::try_from(self.reasons.len()).map_err(|_| EncodeError::BadParameter)?;
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
        FixedHeader::new(PacketType::UnsubscribeAck, VarInt::new(remaining)?).encode(&mut bw)?;
        bw.write_u16(self.packet_id)?;
        self.properties.encode(&mut bw)?;
        for reason in self.reasons {
            bw.write_u8(*reason as u8)?;
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(bw.len() as u32)
    }

    /// Decode into a caller-supplied scratch array (zero allocation). The
    /// packet id is written out and `out` fully populated even when the
    /// call returns `Err(ServerRefused)`.
    ///
    /// # Errors
    /// `DecodeError::BadResponse` if the packet id is zero or more reason
    /// codes are present than `out` can hold; `ServerRefused` if any
    /// filter was refused.
    pub fn decode(
        remaining_data: &'a [u8],
        packet_id: &mut PacketId,
        out: &mut [ReasonCode],
    ) -> Result<usize, DecodeError> {
        let mut ba = ByteArray::new(remaining_data);
        *packet_id = ba.read_u16()?;
        if *packet_id == 0 {
            return Err(DecodeError::BadResponse);
        }

        let properties = Properties::decode(&mut ba)?;
        properties.validate(UNSUBSCRIBE_ACK_PROPERTIES)?;

        let mut count = 0;
        let mut any_refused = false;
        while ba.remaining_bytes() > 0 {
            let reason = ReasonCode::try_from(ba.read_byte()?)?;
            if !UNSUBSCRIBE_REASONS.contains(&reason) {
                log::error!("v5/unsubscribe_ack: reason code {reason:?} not valid for UNSUBACK");
                return Err(DecodeError::BadResponse);
            }
            if count >= out.len() {
                log::error!("v5/unsubscribe_ack: more reason codes than scratch space");
                return Err(DecodeError::BadResponse);
            }
            out[count] = reason;
            count += 1;
            any_refused |= !reason.is_success();
        }

        if any_refused {
            return Err(DecodeError::ServerRefused);
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let reasons = [ReasonCode::Success];
        let packet = UnsubscribeAckPacket::new(5, Properties::empty(), &reasons).unwrap();
        let (_remaining, total) = packet.encoded_len().unwrap();
        let mut buf = vec![0u8; total as usize];
        packet.encode_into(&mut buf).unwrap();

        let mut packet_id = 0;
        let mut out = [ReasonCode::Success; 4];
        let count = UnsubscribeAckPacket::decode(&buf[2..], &mut packet_id, &mut out).unwrap();
        assert_eq!(packet_id, 5);
        assert_eq!(count, 1);
    }

    #[test]
    fn refusal_reports_server_refused() {
        let reasons = [ReasonCode::NotAuthorized];
        let packet = UnsubscribeAckPacket::new(6, Properties::empty(), &reasons).unwrap();
        let (_remaining, total) = packet.encoded_len().unwrap();
        let mut buf = vec![0u8; total as usize];
        packet.encode_into(&mut buf).unwrap();

        let mut packet_id = 0;
        let mut out = [ReasonCode::Success; 4];
        assert_eq!(
            UnsubscribeAckPacket::decode(&buf[2..], &mut packet_id, &mut out),
            Err(DecodeError::ServerRefused)
        );
    }
}
