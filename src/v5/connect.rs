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
use crate::v5::property::{Properties, CONNECT_PROPERTIES, WILL_PROPERTIES};

/// Last-will descriptor attached to a v5 CONNECT packet. Unlike v3.1.1, the
/// will carries its own property block (delay interval, expiry, content
/// type, ...), encoded immediately before the will topic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Will<'a> {
    pub topic: PubTopic<'a>,
    pub message: &'a [u8],
    pub qos: QoS,
    pub retain: bool,
    pub properties: Properties<'a>,
}

/// MQTT 5 CONNECT packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectPacket<'a> {
    clean_start: bool,
    keep_alive: u16,
    properties: Properties<'a>,
    client_id: &'a str,
    will: Option<Will<'a>>,
    username: Option<&'a str>,
    password: Option<&'a [u8]>,
}

impl<'a> ConnectPacket<'a> {
    /// # Errors
    /// `EncodeError::BadParameter` if `client_id` is longer than 65,535
    /// bytes.
    pub fn new(client_id: &'a str) -> Result<Self, EncodeError> {
        if client_id.len() > 65_535 {
            return Err(EncodeError::BadParameter);
        }
        Ok(Self {
            clean_start: true,
            keep_alive: 0,
            properties: Properties::empty(),
            client_id,
            will: None,
            username: None,
            password: None,
        })
    }

    pub fn set_clean_start(&mut self, clean_start: bool) -> &mut Self {
        self.clean_start = clean_start;
        self
    }

    pub fn set_keep_alive(&mut self, keep_alive: u16) -> &mut Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn set_properties(&mut self, properties: Properties<'a>) -> &mut Self {
        self.properties = properties;
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
        properties: Properties<'a>,
    ) -> Result<&mut Self, EncodeError> {
        if message.len() > 65_535 {
            return Err(EncodeError::BadParameter);
        }
        self.will = Some(Will {
            topic,
            message,
            qos,
            retain,
            properties,
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
    /// or is longer than 65,535 bytes.
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
            clean_session: self.clean_start,
        }
    }

    /// # Errors
    /// `EncodeError::BadParameter` if the total would exceed
    /// `MAX_REMAINING_LENGTH`.
    pub fn encoded_len(&self) -> Result<(u32, u32), EncodeError> {
        let mut remaining: u32 = 6 + 1 + 1 + 2;
        remaining += self.properties.bytes();
        remaining += 2 + u32::try_from(self.client_id.len()).map_err(|_| EncodeError::BadParameter)?;
        if let Some(will) = &self.will {
            remaining += will.properties.bytes();
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
        bw.write_u8(ProtocolLevel::V5 as u8)?;
        self.connect_flags().encode(&mut bw)?;
        bw.write_u16(self.keep_alive)?;
        self.properties.encode(&mut bw)?;

        StringData::new(self.client_id)?.encode(&mut bw)?;
        if let Some(will) = &self.will {
            will.properties.encode(&mut bw)?;
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
    /// `DecodeError::BadResponse` on a structural v5 CONNECT violation;
    /// `DecodeError::ProtocolError`/`MalformedPacket` bubbled up from the
    /// property block.
    pub fn decode(remaining_data: &'a [u8]) -> Result<Self, DecodeError> {
        let mut ba = ByteArray::new(remaining_data);
        let level = decode_protocol_header(&mut ba)?;
        if level != ProtocolLevel::V5 {
            return Err(DecodeError::BadResponse);
        }
        let flags = ConnectFlags::decode(&mut ba)?;
        let keep_alive = ba.read_u16()?;
        let properties = Properties::decode(&mut ba)?;
        properties.validate(CONNECT_PROPERTIES)?;

        let client_id_len = ba.read_u16()? as usize;
        let client_id = ba.read_str(client_id_len)?;
        if client_id.is_empty() && !flags.clean_session {
            log::error!("v5/connect: empty client id requires clean start");
            return Err(DecodeError::BadResponse);
        }

        let will = if flags.will {
            let will_properties = Properties::decode(&mut ba)?;
            will_properties.validate(WILL_PROPERTIES)?;
            let topic = PubTopic::decode(&mut ba).map_err(|_| DecodeError::BadResponse)?;
            let message = BinaryData::decode(&mut ba)
                .map_err(|_| DecodeError::BadResponse)?
                .as_slice();
            Some(Will {
                topic,
                message,
                qos: flags.will_qos,
                retain: flags.will_retain,
                properties: will_properties,
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
            clean_start: flags.clean_session,
            keep_alive,
            properties,
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
    pub const fn clean_start(&self) -> bool {
        self.clean_start
    }

    #[must_use]
    pub const fn keep_alive(&self) -> u16 {
        self.keep_alive
    }

    #[must_use]
    pub const fn properties(&self) -> Properties<'a> {
        self.properties
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

    /// Whether this CONNECT negotiated authentication, used by the v5
    /// CONNACK decoder to validate Authentication-Data.
    #[must_use]
    pub fn has_authentication_method(&self) -> bool {
        self.properties
            .iter()
            .any(|p| matches!(p, Ok(crate::v5::property::Property::AuthenticationMethod(_))))
    }

    /// Whether this CONNECT requested Response-Information, used by the v5
    /// CONNACK decoder to validate the broker's Response-Information reply.
    #[must_use]
    pub fn requested_response_information(&self) -> bool {
        self.properties.iter().any(|p| {
            matches!(
                p,
                Ok(crate::v5::property::Property::RequestResponseInformation(v)) if v.value()
            )
        })
    }
}
