// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::base::{Decode, Encode, PacketId, QoS};
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};
use crate::header::{FixedHeader, PacketType};
use crate::topic::PubTopic;
use crate::var_int::{VarInt, MAX_REMAINING_LENGTH};

/// MQTT 3.1.1 PUBLISH packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublishPacket<'a> {
    dup: bool,
    qos: QoS,
    retain: bool,
    topic: PubTopic<'a>,
    packet_id: Option<PacketId>,
    payload: &'a [u8],
}

impl<'a> PublishPacket<'a> {
    #[must_use]
    pub const fn new(topic: PubTopic<'a>, payload: &'a [u8], qos: QoS) -> Self {
        Self {
            dup: false,
            qos,
            retain: false,
            topic,
            packet_id: None,
            payload,
        }
    }

    /// # Errors
    /// `EncodeError::BadParameter` if `dup` is set while QoS is
    /// at-most-once (DUP only makes sense on a retransmission of a
    /// packet the peer must acknowledge).
    pub fn set_dup(&mut self, dup: bool) -> Result<&mut Self, EncodeError> {
        if dup && self.qos == QoS::AtMostOnce {
            return Err(EncodeError::BadParameter);
        }
        self.dup = dup;
        Ok(self)
    }

    pub fn set_retain(&mut self, retain: bool) -> &mut Self {
        self.retain = retain;
        self
    }

    /// # Errors
    /// `EncodeError::BadParameter` if `packet_id` is zero, or if QoS is
    /// at-most-once (no packet id is carried at QoS 0).
    pub fn set_packet_id(&mut self, packet_id: PacketId) -> Result<&mut Self, EncodeError> {
        if packet_id == 0 || self.qos == QoS::AtMostOnce {
            return Err(EncodeError::BadParameter);
        }
        self.packet_id = Some(packet_id);
        Ok(self)
    }

    #[must_use]
    pub const fn dup(&self) -> bool {
        self.dup
    }

    #[must_use]
    pub const fn qos(&self) -> QoS {
        self.qos
    }

    #[must_use]
    pub const fn retain(&self) -> bool {
        self.retain
    }

    #[must_use]
    pub const fn topic(&self) -> PubTopic<'a> {
        self.topic
    }

    #[must_use]
    pub const fn packet_id(&self) -> Option<PacketId> {
        self.packet_id
    }

    #[must_use]
    pub const fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Two-pass Remaining Length computation: the Remaining Length field's
    /// own wire size depends on the value it encodes, so the payload limit
    /// must be rechecked once that size is known.
    ///
    /// # Errors
    /// `EncodeError::BadParameter` if the resulting Remaining Length would
    /// exceed `MAX_REMAINING_LENGTH`, if QoS requires a packet id but none
    /// is set, or if the payload does not fit within the recomputed limit.
    pub fn encoded_len(&self) -> Result<(u32, u32), EncodeError> {
        if self.qos != QoS::AtMostOnce && self.packet_id.is_none() {
            return Err(EncodeError::BadParameter);
        }

        let mut base = self.topic.bytes();
        if self.qos != QoS::AtMostOnce {
            base += 2;
        }

        let payload_len = u32::try_from(self.payload.len()).map_err(|_| EncodeError::BadParameter)?;
        let payload_limit_pass1 = MAX_REMAINING_LENGTH
            .checked_sub(base + 1)
            .ok_or(EncodeError::BadParameter)?;
        if payload_len > payload_limit_pass1 {
            return Err(EncodeError::BadParameter);
        }

        let remaining = base + payload_len;
        let remaining_size = VarInt::size(remaining);
        let payload_limit_pass2 = MAX_REMAINING_LENGTH
            .checked_sub(base + remaining_size)
            .ok_or(EncodeError::BadParameter)?;
        if payload_len > payload_limit_pass2 {
            return Err(EncodeError::BadParameter);
        }

        let total = 1 + remaining_size + remaining;
        Ok((remaining, total))
    }

    /// Write everything up to and including the packet id, if any,
    /// omitting the payload. Lets a scatter-gather transport send the
    /// payload separately without copying it next to the header.
    ///
    /// # Errors
    /// `EncodeError::NoMemory` if `buf` is too small for the header.
    pub fn encode_header(&self, buf: &mut [u8]) -> Result<u32, EncodeError> {
        let (remaining, _total) = self.encoded_len()?;
        let mut bw = ByteWriter::new(buf);
        let packet_type = PacketType::Publish {
            dup: self.dup,
            qos: self.qos,
            retain: self.retain,
        };
        FixedHeader::new(packet_type, VarInt::new(remaining)?).encode(&mut bw)?;
        self.topic.encode(&mut bw)?;
        if let Some(packet_id) = self.packet_id {
            bw.write_u16(packet_id)?;
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(bw.len() as u32)
    }

    /// # Errors
    /// `EncodeError::NoMemory` if `buf` is smaller than the reported total
    /// size.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<u32, EncodeError> {
        let header_len = self.encode_header(buf)?;
        let mut bw = ByteWriter::new(&mut buf[header_len as usize..]);
        bw.write_bytes(self.payload)?;
        Ok(header_len + self.payload.len() as u32)
    }

    /// # Errors
    /// `DecodeError::BadResponse` if the Remaining Length is too short for
    /// the declared topic and packet id, or the packet id is zero when
    /// QoS requires one.
    pub fn decode(
        dup: bool,
        qos: QoS,
        retain: bool,
        remaining_data: &'a [u8],
    ) -> Result<Self, DecodeError> {
        let mut ba = ByteArray::new(remaining_data);
        let topic = PubTopic::decode(&mut ba)?;

        let packet_id = if qos == QoS::AtMostOnce {
            None
        } else {
            let id = ba.read_u16()?;
            if id == 0 {
                log::error!("publish: zero packet id with qos > 0");
                return Err(DecodeError::BadResponse);
            }
            Some(id)
        };

        let payload = ba.read_bytes(ba.remaining_bytes())?;

        Ok(Self {
            dup,
            qos,
            retain,
            topic,
            packet_id,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S4 — PUBLISH QoS 0, topic "a/b", payload "hi", retain=true.
    #[test]
    fn encode_matches_scenario_s4() {
        let topic = PubTopic::new("a/b").unwrap();
        let mut packet = PublishPacket::new(topic, b"hi", QoS::AtMostOnce);
        packet.set_retain(true);
        let (remaining, total) = packet.encoded_len().unwrap();
        assert_eq!(remaining, 7);

        let mut buf = vec![0u8; total as usize];
        let n = packet.encode_into(&mut buf).unwrap();
        assert_eq!(n, total);
        assert_eq!(
            buf,
            [0x31, 0x07, 0x00, 0x03, 0x61, 0x2f, 0x62, 0x68, 0x69]
        );
    }

    #[test]
    fn dup_without_qos_is_rejected() {
        let topic = PubTopic::new("a").unwrap();
        let mut packet = PublishPacket::new(topic, b"", QoS::AtMostOnce);
        assert_eq!(packet.set_dup(true), Err(EncodeError::BadParameter));
    }

    #[test]
    fn qos_without_packet_id_is_rejected_at_size_time() {
        let topic = PubTopic::new("a").unwrap();
        let packet = PublishPacket::new(topic, b"", QoS::AtLeastOnce);
        assert_eq!(packet.encoded_len(), Err(EncodeError::BadParameter));
    }

    #[test]
    fn decode_rejects_zero_packet_id() {
        let wire = [0x00, 0x01, 0x61, 0x00, 0x00];
        assert_eq!(
            PublishPacket::decode(false, QoS::AtLeastOnce, false, &wire),
            Err(DecodeError::BadResponse)
        );
    }
}
