// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::base::{decode_protocol_header, Decode, Encode, ProtocolLevel, PROTOCOL_NAME, QoS};
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::connect_flags::ConnectFlags;
use crate::error::{DecodeError, EncodeError};
use crate::header::{FixedHeader, PacketType};
use crate::primitive::{BinaryData, StringData};
use crate::topic::PubTopic;
use crate::var_int::VarInt;

/// Last-will descriptor attached to a CONNECT packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Will<'a> {
    pub topic: PubTopic<'a>,
    pub message: &'a [u8],
    pub qos: QoS,
    pub retain: bool,
}

/// MQTT 3.1.1 CONNECT packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectPacket<'a> {
    clean_session: bool,
    keep_alive: u16,
    client_id: &'a str,
    will: Option<Will<'a>>,
    username: Option<&'a str>,
    password: Option<&'a [u8]>,
}

impl<'a> ConnectPacket<'a> {
    /// # Errors
    /// `EncodeError::BadParameter` if `client_id` is longer than 65,535
    /// bytes (MQTT-3.1.3-7 permits zero-length client ids, so emptiness is
    /// not itself rejected here).
    pub fn new(client_id: &'a str) -> Result<Self, EncodeError> {
        if client_id.len() > 65_535 {
            return Err(EncodeError::BadParameter);
        }
        Ok(Self {
            clean_session: true,
            keep_alive: 0,
            client_id,
            will: None,
            username: None,
            password: None,
        })
    }

    pub fn set_clean_session(&mut self, clean_session: bool) -> &mut Self {
        self.clean_session = clean_session;
        self
    }

    pub fn set_keep_alive(&mut self, keep_alive: u16) -> &mut Self {
        self.keep_alive = keep_alive;
        self
    }

    /// # Errors
    /// `EncodeError::BadParameter` if `message` is longer than 65,535 bytes.
    pub fn set_will(
        &mut self,
        topic: PubTopic<'a>,
        message: &'a [u8],
        qos: QoS,
        retain: bool,
    ) -> Result<&mut Self, EncodeError> {
        if message.len() > 65_535 {
            return Err(EncodeError::BadParameter);
        }
        self.will = Some(Will {
            topic,
            message,
            qos,
            retain,
        });
        Ok(self)
    }

    /// # Errors
    /// `EncodeError::BadParameter` if `username` is longer than 65,535
    /// bytes.
    pub fn set_username(&mut self, username: &'a str) -> Result<&mut Self, EncodeError> {
        if username.len() > 65_535 {
            return Err(EncodeError::BadParameter);
        }
        self.username = Some(username);
        Ok(self)
    }

    /// # Errors
    /// `EncodeError::BadParameter` if `password` is set without a username
    /// (MQTT-3.1.2-22) or is longer than 65,535 bytes.
    pub fn set_password(&mut self, password: &'a [u8]) -> Result<&mut Self, EncodeError> {
        if self.username.is_none() || password.len() > 65_535 {
            return Err(EncodeError::BadParameter);
        }
        self.password = Some(password);
        Ok(self)
    }

    fn connect_flags(&self) -> ConnectFlags {
        ConnectFlags {
            has_username: self.username.is_some(),
            has_password: self.password.is_some(),
            will_retain: self.will.map_or(false, |w| w.retain),
            will_qos: self.will.map_or(QoS::AtMostOnce, |w| w.qos),
            will: self.will.is_some(),
            clean_session: self.clean_session,
        }
    }

    /// Variable-header-plus-payload size, not counting the fixed header.
    ///
    /// # Errors
    /// `EncodeError::BadParameter` if the total would exceed
    /// `MAX_REMAINING_LENGTH`.
    pub fn encoded_len(&self) -> Result<(u32, u32), EncodeError> {
        let mut remaining: u32 = 6 + 1 + 1 + 2; // protocol name + level + flags + keep-alive
        remaining += 2 + u32::try_from(self.client_id.len()).map_err(|_| EncodeError::BadParameter)?;
        if let Some(will) = &self.will {
            remaining += will.topic.bytes();
            remaining += 2 + u32::try_from(will.message.len()).map_err(|_| EncodeError::BadParameter)?;
        }
        if let Some(username) = self.username {
            remaining += 2 + u32::try_from(username.len()).map_err(|_| EncodeError::BadParameter)?;
        }
        if let Some(password) = self.password {
            remaining += 2 + u32::try_from(password.len()).map_err(|_| EncodeError::BadParameter)?;
        }
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
        FixedHeader::new(PacketType::Connect, VarInt::new(remaining)?).encode(&mut bw)?;

        bw.write_u16(4)?;
        bw.write_bytes(PROTOCOL_NAME.as_bytes())?;
        bw.write_u8(ProtocolLevel::V311 as u8)?;
        self.connect_flags().encode(&mut bw)?;
        bw.write_u16(self.keep_alive)?;

        StringData::new(self.client_id)?.encode(&mut bw)?;
        if let Some(will) = &self.will {
            will.topic.encode(&mut bw)?;
            BinaryData::new(will.message)?.encode(&mut bw)?;
        }
        if let Some(username) = self.username {
            StringData::new(username)?.encode(&mut bw)?;
        }
        if let Some(password) = self.password {
            BinaryData::new(password)?.encode(&mut bw)?;
        }

        #[allow(clippy::cast_possible_truncation)]
        Ok(bw.len() as u32)
    }

    /// # Errors
    /// `DecodeError::BadResponse` on any CONNECT structural violation
    /// (bad protocol name, unsupported level, invalid flag combination).
    pub fn decode(remaining_data: &'a [u8]) -> Result<Self, DecodeError> {
        let mut ba = ByteArray::new(remaining_data);
        let level = decode_protocol_header(&mut ba)?;
        if level != ProtocolLevel::V311 {
            return Err(DecodeError::BadResponse);
        }
        let flags = ConnectFlags::decode(&mut ba)?;
        let keep_alive = ba.read_u16()?;
        let client_id_len = ba.read_u16()? as usize;
        let client_id = ba.read_str(client_id_len)?;

        // MQTT-3.1.3-7: a zero-length client id is only valid with a clean
        // session.
        if client_id.is_empty() && !flags.clean_session {
            log::error!("connect: empty client id requires clean session");
            return Err(DecodeError::BadResponse);
        }

        let will = if flags.will {
            let topic = PubTopic::decode(&mut ba).map_err(|_| DecodeError::BadResponse)?;
            let message = BinaryData::decode(&mut ba)
                .map_err(|_| DecodeError::BadResponse)?
                .as_slice();
            Some(Will {
                topic,
                message,
                qos: flags.will_qos,
                retain: flags.will_retain,
            })
        } else {
            None
        };

        let username = if flags.has_username {
            Some(
                StringData::decode(&mut ba)
                    .map_err(|_| DecodeError::BadResponse)?
                    .as_str(),
            )
        } else {
            None
        };
        let password = if flags.has_password {
            Some(
                BinaryData::decode(&mut ba)
                    .map_err(|_| DecodeError::BadResponse)?
                    .as_slice(),
            )
        } else {
            None
        };

        Ok(Self {
            clean_session: flags.clean_session,
            keep_alive,
            client_id,
            will,
            username,
            password,
        })
    }

    #[must_use]
    pub const fn client_id(&self) -> &'a str {
        self.client_id
    }

    #[must_use]
    pub const fn clean_session(&self) -> bool {
        self.clean_session
    }

    #[must_use]
    pub const fn keep_alive(&self) -> u16 {
        self.keep_alive
    }

    #[must_use]
    pub const fn will(&self) -> Option<Will<'a>> {
        self.will
    }

    #[must_use]
    pub const fn username(&self) -> Option<&'a str> {
        self.username
    }

    #[must_use]
    pub const fn password(&self) -> Option<&'a [u8]> {
        self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S3 — CONNECT v3.1.1, client id "ab", clean session, no will/user/pass,
    // keep-alive 60.
    #[test]
    fn encode_matches_scenario_s3() {
        let mut packet = ConnectPacket::new("ab").unwrap();
        packet.set_keep_alive(60);
        let (remaining, total) = packet.encoded_len().unwrap();
        assert_eq!(remaining, 14);

        let mut buf = vec![0u8; total as usize];
        let n = packet.encode_into(&mut buf).unwrap();
        assert_eq!(n, total);
        assert_eq!(
            buf,
            [
                0x10, 0x0e, 0x00, 0x04, 0x4d, 0x51, 0x54, 0x54, 0x04, 0x02, 0x00, 0x3c, 0x00,
                0x02, 0x61, 0x62,
            ]
        );
    }

    #[test]
    fn decode_round_trips_scenario_s3() {
        let wire: [u8; 14] = [
            0x00, 0x04, 0x4d, 0x51, 0x54, 0x54, 0x04, 0x02, 0x00, 0x3c, 0x00, 0x02, 0x61, 0x62,
        ];
        let packet = ConnectPacket::decode(&wire).unwrap();
        assert_eq!(packet.client_id(), "ab");
        assert!(packet.clean_session());
        assert_eq!(packet.keep_alive(), 60);
        assert!(packet.will().is_none());
    }

    #[test]
    fn empty_client_id_requires_clean_session() {
        let wire: [u8; 12] = [
            0x00, 0x04, 0x4d, 0x51, 0x54, 0x54, 0x04, 0x00, 0x00, 0x3c, 0x00, 0x00,
        ];
        assert_eq!(
            ConnectPacket::decode(&wire),
            Err(DecodeError::BadResponse)
        );
    }
}
