// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;

use crate::base::{Encode, PacketId, QoS};
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};
use crate::header::{FixedHeader, PacketType};
use crate::var_int::VarInt;

/// Per-filter outcome reported in a SUBACK.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscribeReturnCode {
    Granted(QoS),
    Failure,
}

impl SubscribeReturnCode {
    const fn to_byte(self) -> u8 {
        match self {
            Self::Granted(qos) => qos as u8,
            Self::Failure => 0x80,
        }
    }
}

impl TryFrom<u8> for SubscribeReturnCode {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0x00 => Ok(Self::Granted(QoS::AtMostOnce)),
            0x01 => Ok(Self::Granted(QoS::AtLeastOnce)),
            0x02 => Ok(Self::Granted(QoS::ExactlyOnce)),
            0x80 => Ok(Self::Failure),
            _ => {
                log::error!("subscribe_ack: unknown return code byte {v:#04x}");
                Err(DecodeError::BadResponse)
            }
        }
    }
}

/// MQTT 3.1.1 SUBACK packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscribeAckPacket<'a> {
    packet_id: PacketId,
    codes: &'a [SubscribeReturnCode],
}

impl<'a> SubscribeAckPacket<'a> {
    /// # Errors
    /// `EncodeError::BadParameter` if `packet_id` is zero or `codes` is
    /// empty.
    pub fn new(packet_id: PacketId, codes: &'a [SubscribeReturnCode]) -> Result<Self, EncodeError> {
        if packet_id == 0 || codes.is_empty() {
            return Err(EncodeError::BadParameter);
        }
        Ok(Self { packet_id, codes })
    }

    #[must_use]
    pub const fn packet_id(&self) -> PacketId {
        self.packet_id
    }

    #[must_use]
    pub const fn codes(&self) -> &'a [SubscribeReturnCode] {
        self.codes
    }

    /// # Errors
    /// `EncodeError::BadParameter` if the total would exceed
    /// `MAX_REMAINING_LENGTH`.
    pub fn encoded_len(&self) -> Result<(u32, u32), EncodeError> {
        let remaining = 2 + u32::try_from(self.codes.len()).map_err(|_| EncodeError::BadParameter)?;
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
        FixedHeader::new(PacketType::SubscribeAck, VarInt::new(remaining)?).encode(&mut bw)?;
        bw.write_u16(self.packet_id)?;
        for code in self.codes {
            bw.write_u8(code.to_byte())?;
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(bw.len() as u32)
    }

    /// Decode into a caller-supplied scratch array (zero allocation). The
    /// packet id is written to `packet_id` and `out` is fully populated
    /// even when the call goes on to return `Err(ServerRefused)`, so a
    /// refusal still leaves both accessible to the caller.
    ///
    /// # Errors
    /// `DecodeError::BadResponse` if Remaining Length < 3, the packet id is
    /// zero, or more status bytes are present than `out` can hold.
    /// `DecodeError::ServerRefused` if any filter was refused.
    pub fn decode(
        remaining_data: &[u8],
        packet_id: &mut PacketId,
        out: &mut [SubscribeReturnCode],
    ) -> Result<usize, DecodeError> {
        if remaining_data.len() < 3 {
            return Err(DecodeError::BadResponse);
        }
        let mut ba = ByteArray::new(remaining_data);
        *packet_id = ba.read_u16()?;
        if *packet_id == 0 {
            return Err(DecodeError::BadResponse);
        }

        let mut count = 0;
        let mut any_refused = false;
        while ba.remaining_bytes() > 0 {
            let code = SubscribeReturnCode::try_from(ba.read_byte()?)?;
            if count >= out.len() {
                log::error!("subscribe_ack: more status bytes than scratch space");
                return Err(DecodeError::BadResponse);
            }
            out[count] = code;
            count += 1;
            any_refused |= matches!(code, SubscribeReturnCode::Failure);
        }

        if any_refused {
            return Err(DecodeError::ServerRefused);
        }

        Ok(count)
    }
}
