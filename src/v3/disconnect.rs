// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::base::Encode;
use crate::byte_cursor::ByteWriter;
use crate::error::{DecodeError, EncodeError};
use crate::header::{FixedHeader, PacketType};
use crate::var_int::VarInt;

/// MQTT 3.1.1 DISCONNECT: graceful connection teardown notice, no variable
/// header or payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisconnectPacket;

impl DisconnectPacket {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[must_use]
    pub const fn encoded_len() -> (u32, u32) {
        (0, 2)
    }

    /// # Errors
    /// `EncodeError::NoMemory` if `buf` is smaller than 2 bytes.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<u32, EncodeError> {
        let mut bw = ByteWriter::new(buf);
        FixedHeader::new(PacketType::Disconnect, VarInt::new(0)?).encode(&mut bw)?;
        #[allow(clippy::cast_possible_truncation)]
        Ok(bw.len() as u32)
    }

    /// # Errors
    /// `DecodeError::BadResponse` if Remaining Length != 0.
    pub fn decode(remaining_data: &[u8]) -> Result<Self, DecodeError> {
        if !remaining_data.is_empty() {
            return Err(DecodeError::BadResponse);
        }
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S2 — DISCONNECT v3.1.1 serialize.
    #[test]
    fn encode_matches_scenario_s2() {
        let mut buf = [0u8; 2];
        DisconnectPacket::new().encode_into(&mut buf).unwrap();
        assert_eq!(buf, [0xe0, 0x00]);
    }

    #[test]
    fn decode_rejects_nonzero_remaining_length() {
        assert_eq!(
            DisconnectPacket::decode(&[0x00]),
            Err(DecodeError::BadResponse)
        );
    }
}
