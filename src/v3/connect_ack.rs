// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;

use crate::base::Encode;
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};
use crate::header::{FixedHeader, PacketType};
use crate::var_int::VarInt;

/// MQTT 3.1.1 CONNACK return code.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectReturnCode {
    Accepted = 0,
    UnacceptableProtocolVersion = 1,
    IdentifierRejected = 2,
    ServerUnavailable = 3,
    BadUserNameOrPassword = 4,
    NotAuthorized = 5,
}

impl TryFrom<u8> for ConnectReturnCode {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Accepted),
            1 => Ok(Self::UnacceptableProtocolVersion),
            2 => Ok(Self::IdentifierRejected),
            3 => Ok(Self::ServerUnavailable),
            4 => Ok(Self::BadUserNameOrPassword),
            5 => Ok(Self::NotAuthorized),
            _ => Err(DecodeError::BadResponse),
        }
    }
}

/// MQTT 3.1.1 CONNACK packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectAckPacket {
    session_present: bool,
    return_code: ConnectReturnCode,
}

impl ConnectAckPacket {
    #[must_use]
    pub const fn new(return_code: ConnectReturnCode, session_present: bool) -> Self {
        let session_present = session_present && matches!(return_code, ConnectReturnCode::Accepted);
        Self {
            session_present,
            return_code,
        }
    }

    #[must_use]
    pub const fn session_present(&self) -> bool {
        self.session_present
    }

    #[must_use]
    pub const fn return_code(&self) -> ConnectReturnCode {
        self.return_code
    }

    #[must_use]
    pub const fn encoded_len() -> (u32, u32) {
        (2, 4)
    }

    /// # Errors
    /// `EncodeError::NoMemory` if `buf` is smaller than 4 bytes.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<u32, EncodeError> {
        let mut bw = ByteWriter::new(buf);
        FixedHeader::new(PacketType::ConnectAck, VarInt::new(2)?).encode(&mut bw)?;
        bw.write_u8(u8::from(self.session_present))?;
        bw.write_u8(self.return_code as u8)?;
        #[allow(clippy::cast_possible_truncation)]
        Ok(bw.len() as u32)
    }

    /// # Errors
    /// `DecodeError::BadResponse` on any structural violation (remaining
    /// length != 2, reserved ack-flag bits set, unknown return code, or
    /// session-present set alongside a non-zero return code).
    /// `DecodeError::ServerRefused` if the return code indicates refusal.
    pub fn decode(remaining_data: &[u8]) -> Result<Self, DecodeError> {
        if remaining_data.len() != 2 {
            return Err(DecodeError::BadResponse);
        }
        let mut ba = ByteArray::new(remaining_data);
        let ack_flags = ba.read_byte()?;
        if ack_flags & 0b1111_1110 != 0 {
            log::error!("connect_ack: reserved ack-flags bits set");
            return Err(DecodeError::BadResponse);
        }
        let session_present = ack_flags & 0b0000_0001 != 0;
        let return_code = ConnectReturnCode::try_from(ba.read_byte()?)?;

        if session_present && !matches!(return_code, ConnectReturnCode::Accepted) {
            log::error!("connect_ack: session-present set with non-zero return code");
            return Err(DecodeError::BadResponse);
        }

        if !matches!(return_code, ConnectReturnCode::Accepted) {
            return Err(DecodeError::ServerRefused);
        }

        Ok(Self {
            session_present,
            return_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S5 — CONNACK success, no session present, v3.1.1.
    #[test]
    fn decode_scenario_s5() {
        let wire = [0x00, 0x00];
        let packet = ConnectAckPacket::decode(&wire).unwrap();
        assert!(!packet.session_present());
        assert_eq!(packet.return_code(), ConnectReturnCode::Accepted);
    }

    // S6 — CONNACK session-present with nonzero reason.
    #[test]
    fn decode_scenario_s6() {
        let wire = [0x01, 0x01];
        assert_eq!(
            ConnectAckPacket::decode(&wire),
            Err(DecodeError::BadResponse)
        );
    }

    #[test]
    fn refusal_without_session_present_is_server_refused() {
        let wire = [0x00, 0x02];
        assert_eq!(
            ConnectAckPacket::decode(&wire),
            Err(DecodeError::ServerRefused)
        );
    }
}
