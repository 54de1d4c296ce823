// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;

use crate::base::{Decode, Encode};
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};
use crate::header::{FixedHeader, PacketType};
use crate::var_int::VarInt;
use crate::v5::property::{Properties, Property, CONNECT_ACK_PROPERTIES};
use crate::v5::reason_code::{ReasonCode, CONNECT_REASONS};

/// Cross-packet state the CONNECT side supplies so the v5 CONNACK decoder
/// can enforce MQTT5's "only valid if the client asked for it" property
/// rules — not session state (it is built fresh by the caller from the
/// CONNECT it just sent, and does not outlive one decode call).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectContext {
    pub sent_authentication_method: bool,
    pub requested_response_information: bool,
}

/// MQTT 5 CONNACK packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectAckPacket<'a> {
    session_present: bool,
    reason_code: ReasonCode,
    properties: Properties<'a>,
}

impl<'a> ConnectAckPacket<'a> {
    #[must_use]
    pub const fn new(session_present: bool, reason_code: ReasonCode, properties: Properties<'a>) -> Self {
        let session_present = session_present && matches!(reason_code, ReasonCode::Success);
        Self {
            session_present,
            reason_code,
            properties,
        }
    }

    #[must_use]
    pub const fn session_present(&self) -> bool {
        self.session_present
    }

    #[must_use]
    pub const fn reason_code(&self) -> ReasonCode {
        self.reason_code
    }

    #[must_use]
    pub const fn properties(&self) -> Properties<'a> {
        self.properties
    }

    /// # Errors
    /// `EncodeError::BadParameter` if the total would exceed
    /// `MAX_REMAINING_LENGTH`.
    pub fn encoded_len(&self) -> Result<(u32, u32), EncodeError> {
        let remaining = 1 + 1 + self.properties.bytes();
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
        FixedHeader::new(PacketType::ConnectAck, VarInt::new(remaining)?).encode(&mut bw)?;
        bw.write_u8(u8::from(self.session_present))?;
        bw.write_u8(self.reason_code as u8)?;
        self.properties.encode(&mut bw)?;
        #[allow(clippy::cast_possible_truncation)]
        Ok(bw.len() as u32)
    }

    /// # Errors
    /// `DecodeError::BadResponse` on structural violations (bad ack-flags,
    /// unknown reason code outside the CONNACK family, session-present set
    /// with a non-success reason code); `ProtocolError`/`MalformedPacket`
    /// from the property block, including Authentication-Data without a
    /// preceding Authentication-Method and Response-Information without the
    /// client having requested it; `ServerRefused` for a structurally valid
    /// refusal.
    pub fn decode(remaining_data: &'a [u8], ctx: ConnectContext) -> Result<Self, DecodeError> {
        let mut ba = ByteArray::new(remaining_data);
        let ack_flags = ba.read_byte()?;
        if ack_flags & 0b1111_1110 != 0 {
            log::error!("v5/connect_ack: reserved ack-flags bits set");
            return Err(DecodeError::BadResponse);
        }
        let session_present = ack_flags & 0b0000_0001 != 0;

        let reason_code = ReasonCode::try_from(ba.read_byte()?)?;
        if !CONNECT_REASONS.contains(&reason_code) {
            log::error!("v5/connect_ack: reason code {reason_code:?} not valid for CONNACK");
            return Err(DecodeError::BadResponse);
        }
        if session_present && !matches!(reason_code, ReasonCode::Success) {
            log::error!("v5/connect_ack: session-present set with non-success reason code");
            return Err(DecodeError::BadResponse);
        }

        let properties = Properties::decode(&mut ba)?;
        properties.validate(CONNECT_ACK_PROPERTIES)?;
        if !ctx.sent_authentication_method
            && properties
                .iter()
                .any(|p| matches!(p, Ok(Property::AuthenticationData(_))))
        {
            log::error!("v5/connect_ack: authentication-data without a negotiated method");
            return Err(DecodeError::ProtocolError);
        }
        if !ctx.requested_response_information
            && properties
                .iter()
                .any(|p| matches!(p, Ok(Property::ResponseInformation(_))))
        {
            log::error!("v5/connect_ack: response-information without a client request");
            return Err(DecodeError::ProtocolError);
        }

        if ba.remaining_bytes() != 0 {
            log::error!("v5/connect_ack: trailing bytes after property block");
            return Err(DecodeError::MalformedPacket);
        }

        if !reason_code.is_success() {
            return Err(DecodeError::ServerRefused);
        }

        Ok(Self {
            session_present,
            reason_code,
            properties,
        })
    }
}
