// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;

use crate::base::{Decode, Encode, PacketId, QoS};
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};
use crate::header::{FixedHeader, PacketType};
use crate::topic::SubTopic;
use crate::var_int::VarInt;
use crate::v5::property::{Properties, Property, SUBSCRIBE_PROPERTIES};

/// Whether retained messages are sent when a subscription is (re-)
/// established. It is a Protocol Error to decode the reserved value 3.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RetainHandling {
    #[default]
    Send = 0,
    SendFirst = 1,
    NoSend = 2,
}

impl TryFrom<u8> for RetainHandling {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Send),
            1 => Ok(Self::SendFirst),
            2 => Ok(Self::NoSend),
            _ => {
                log::error!("v5/subscribe: reserved retain-handling value {v}");
                Err(DecodeError::ProtocolError)
            }
        }
    }
}

/// One `(filter, options)` entry in a v5 SUBSCRIBE packet. The single
/// Subscription Options byte packs maximum QoS, no-local, retain-as-
/// published and retain-handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscribeTopic<'a> {
    pub topic: SubTopic<'a>,
    pub qos: QoS,
    pub no_local: bool,
    pub retain_as_published: bool,
    pub retain_handling: RetainHandling,
}

impl<'a> SubscribeTopic<'a> {
    #[must_use]
    pub const fn bytes(&self) -> u32 {
        self.topic.bytes() + 1
    }

    fn options_byte(&self) -> u8 {
        let mut flag = self.qos as u8;
        if self.no_local {
            flag |= 0b0000_0100;
        }
        if self.retain_as_published {
            flag |= 0b0000_1000;
        }
        flag |= (self.retain_handling as u8) << 4;
        flag
    }
}

/// MQTT 5 SUBSCRIBE packet: a nonempty ordered list of topic filters plus
/// a property block (most notably an optional Subscription Identifier).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscribePacket<'a> {
    packet_id: PacketId,
    properties: Properties<'a>,
    topics: &'a [SubscribeTopic<'a>],
}

impl<'a> SubscribePacket<'a> {
    /// # Errors
    /// `EncodeError::BadParameter` if `packet_id` is zero or `topics` is
    /// empty.
    pub fn new(
        packet_id: PacketId,
        properties: Properties<'a>,
        topics: &'a [SubscribeTopic<'a>],
    ) -> Result<Self, EncodeError> {
        if packet_id == 0 || topics.is_empty() {
            return Err(EncodeError::BadParameter);
        }
        Ok(Self {
            packet_id,
            properties,
            topics,
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
    pub const fn topics(&self) -> &'a [SubscribeTopic<'a>] {
        self.topics
    }

    /// # Errors
    /// `EncodeError::BadParameter` if the total would exceed
    /// `MAX_REMAINING_LENGTH`.
    pub fn encoded_len(&self) -> Result<(u32, u32), EncodeError> {
        let mut remaining: u32 = 2 + self.properties.bytes();
        for t in self.topics {
            remaining += t.bytes();
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
        FixedHeader::new(PacketType::Subscribe, VarInt::new(remaining)?).encode(&mut bw)?;
        bw.write_u16(self.packet_id)?;
        self.properties.encode(&mut bw)?;
        for t in self.topics {
            t.topic.encode(&mut bw)?;
            bw.write_u8(t.options_byte())?;
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(bw.len() as u32)
    }

    /// Decode into a caller-supplied scratch array (zero allocation).
    ///
    /// # Errors
    /// `DecodeError::BadResponse` if the packet id is zero, there are no
    /// topic filters, or more filters are present than `out` can hold.
    /// `ProtocolError` on reserved-bit violations in an options byte or a
    /// disallowed/repeated property.
    pub fn decode(
        remaining_data: &'a [u8],
        out: &mut [SubscribeTopic<'a>],
    ) -> Result<(PacketId, usize), DecodeError> {
        let mut ba = ByteArray::new(remaining_data);
        let packet_id = ba.read_u16()?;
        if packet_id == 0 {
            return Err(DecodeError::BadResponse);
        }

        let properties = Properties::decode(&mut ba)?;
        properties.validate(SUBSCRIBE_PROPERTIES)?;
        let subscription_ids = properties
            .iter()
            .filter(|p| matches!(p, Ok(Property::SubscriptionIdentifier(_))))
            .count();
        if subscription_ids > 1 {
            log::error!("v5/subscribe: subscription identifier repeated");
            return Err(DecodeError::ProtocolError);
        }

        let mut count = 0;
        while ba.remaining_bytes() > 0 {
            let topic = SubTopic::decode(&mut ba)?;
            let flag = ba.read_byte()?;
            if flag & 0b1100_0000 != 0 {
                log::error!("v5/subscribe: reserved options bits set");
                return Err(DecodeError::ProtocolError);
            }
            let qos = QoS::try_from(flag & 0b0000_0011)?;
            let no_local = flag & 0b0000_0100 != 0;
            let retain_as_published = flag & 0b0000_1000 != 0;
            let retain_handling = RetainHandling::try_from((flag & 0b0011_0000) >> 4)?;

            if count >= out.len() {
                log::error!("v5/subscribe: more topic filters than scratch space");
                return Err(DecodeError::BadResponse);
            }
            out[count] = SubscribeTopic {
                topic,
                qos,
                no_local,
                retain_as_published,
                retain_handling,
            };
            count += 1;
        }

        if count == 0 {
            return Err(DecodeError::BadResponse);
        }

        Ok((packet_id, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let topics = [SubscribeTopic {
            topic: SubTopic::new("sport/tennis/#").unwrap(),
            qos: QoS::AtLeastOnce,
            no_local: true,
            retain_as_published: false,
            retain_handling: RetainHandling::SendFirst,
        }];
        let packet = SubscribePacket::new(1, Properties::empty(), &topics).unwrap();
        let (_remaining, total) = packet.encoded_len().unwrap();
        let mut buf = vec![0u8; total as usize];
        packet.encode_into(&mut buf).unwrap();

        let mut out = [SubscribeTopic {
            topic: SubTopic::new("x").unwrap(),
            qos: QoS::AtMostOnce,
            no_local: false,
            retain_as_published: false,
            retain_handling: RetainHandling::Send,
        }; 4];
        let (packet_id, count) = SubscribePacket::decode(&buf[2..], &mut out).unwrap();
        assert_eq!(packet_id, 1);
        assert_eq!(count, 1);
        assert_eq!(out[0].topic.as_str(), "sport/tennis/#");
        assert!(out[0].no_local);
        assert_eq!(out[0].retain_handling, RetainHandling::SendFirst);
    }

    #[test]
    fn decode_rejects_reserved_retain_handling() {
        let wire = [0x00, 0x01, 0x00, 0x00, 0x01, 0x61, 0b0011_0000];
        let mut out = [SubscribeTopic {
            topic: SubTopic::new("x").unwrap(),
            qos: QoS::AtMostOnce,
            no_local: false,
            retain_as_published: false,
            retain_handling: RetainHandling::Send,
        }; 4];
        assert_eq!(
            SubscribePacket::decode(&wire, &mut out),
            Err(DecodeError::ProtocolError)
        );
    }
}
