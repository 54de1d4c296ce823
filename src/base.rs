// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;

use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};

/// Literal protocol name that appears on the wire in every CONNECT packet.
pub const PROTOCOL_NAME: &str = "MQTT";

/// Encode a field into a caller-supplied buffer, returning the number of
/// bytes written.
pub trait Encode {
    fn encode(&self, bw: &mut ByteWriter) -> Result<u32, EncodeError>;
}

/// Decode a field, borrowing any string/binary data straight out of the
/// backing buffer rather than copying it.
pub trait Decode<'a>: Sized {
    fn decode(ba: &mut ByteArray<'a>) -> Result<Self, DecodeError>;
}

/// Packet identifier. Zero is a reserved value: every packet type that
/// carries one rejects it, on both the encode and decode paths.
pub type PacketId = u16;

/// Quality of service level.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl QoS {
    #[must_use]
    pub const fn bytes() -> u32 {
        1
    }
}

impl TryFrom<u8> for QoS {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            _ => Err(DecodeError::BadResponse),
        }
    }
}

/// Protocol version this codec supports: MQTT 3.1.1 and MQTT 5.0.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolLevel {
    V311 = 4,
    V5 = 5,
}

impl TryFrom<u8> for ProtocolLevel {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            4 => Ok(Self::V311),
            5 => Ok(Self::V5),
            _ => Err(DecodeError::BadResponse),
        }
    }
}

/// Read and validate the CONNECT variable header's protocol-name string and
/// version byte, common to both v3.1.1 and v5 so each can peek the version
/// before choosing which packet module decodes the rest.
///
/// # Errors
/// `DecodeError::BadResponse` if the protocol name is not the literal
/// `"MQTT"` or the version byte is neither `4` nor `5`.
pub fn decode_protocol_header(ba: &mut ByteArray) -> Result<ProtocolLevel, DecodeError> {
    let len = ba.read_u16()? as usize;
    let name = ba.read_str(len)?;
    if name != PROTOCOL_NAME {
        log::error!("base: unexpected protocol name {name:?}");
        return Err(DecodeError::BadResponse);
    }
    let level_byte = ba.read_byte()?;
    ProtocolLevel::try_from(level_byte)
}
