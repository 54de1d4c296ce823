// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::base::{Decode, Encode, PacketId};
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};
use crate::header::{FixedHeader, PacketType};
use crate::topic::SubTopic;
use crate::var_int::VarInt;

/// MQTT 3.1.1 UNSUBSCRIBE packet: a nonempty ordered list of topic filters
/// to remove. Unlike SUBSCRIBE, no QoS byte accompanies each filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsubscribePacket<'a> {
    packet_id: PacketId,
    topics: &'a [SubTopic<'a>],
}

impl<'a> UnsubscribePacket<'a> {
    /// # Errors
    /// `EncodeError::BadParameter` if `packet_id` is zero or `topics` is
    /// empty.
    pub fn new(packet_id: PacketId, topics: &'a [SubTopic<'a>]) -> Result<Self, EncodeError> {
        if packet_id == 0 || topics.is_empty() {
            return Err(EncodeError::BadParameter);
        }
        Ok(Self { packet_id, topics })
    }

    #[must_use]
    pub const fn packet_id(&self) -> PacketId {
        self.packet_id
    }

    #[must_use]
    pub const fn topics(&self) -> &'a [SubTopic<'a>] {
        self.topics
    }

    /// # Errors
    /// `EncodeError::BadParameter` if the total would exceed
    /// `MAX_REMAINING_LENGTH`.
    pub fn encoded_len(&self) -> Result<(u32, u32), EncodeError> {
        let mut remaining: u32 = 2;
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
        FixedHeader::new(PacketType::Unsubscribe, VarInt::new(remaining)?).encode(&mut bw)?;
        bw.write_u16(self.packet_id)?;
        for t in self.topics {
            t.encode(&mut bw)?;
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(bw.len() as u32)
    }

    /// Decode into a caller-supplied scratch array (zero allocation): the
    /// number of entries decoded is returned alongside the packet id.
    ///
    /// # Errors
    /// `DecodeError::BadResponse` if the packet id is zero, there are no
    /// topic filters, or more filters are present than `out` can hold.
    pub fn decode(
        remaining_data: &'a [u8],
        out: &mut [SubTopic<'a>],
    ) -> Result<(PacketId, usize), DecodeError> {
        let mut ba = ByteArray::new(remaining_data);
        let packet_id = ba.read_u16()?;
        if packet_id == 0 {
            return Err(DecodeError::BadResponse);
        }

        let mut count = 0;
        while ba.remaining_bytes() > 0 {
            let topic = SubTopic::decode(&mut ba)?;
            if count >= out.len() {
                log::error!("unsubscribe: more topic filters than scratch space");
                return Err(DecodeError::BadResponse);
            }
            out[count] = topic;
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
        let topics = [SubTopic::new("sport/tennis/#").unwrap()];
        let packet = UnsubscribePacket::new(1, &topics).unwrap();
        let (_remaining, total) = packet.encoded_len().unwrap();
        let mut buf = vec![0u8; total as usize];
        packet.encode_into(&mut buf).unwrap();

        let mut out = [SubTopic::new("x").unwrap(); 4];
        let (packet_id, count) = UnsubscribePacket::decode(&buf[2..], &mut out).unwrap();
        assert_eq!(packet_id, 1);
        assert_eq!(count, 1);
        assert_eq!(out[0].as_str(), "sport/tennis/#");
    }

    #[test]
    fn empty_topic_list_is_rejected() {
        let topics: [SubTopic; 0] = [];
        assert_eq!(
            UnsubscribePacket::new(1, &topics),
            Err(EncodeError::BadParameter)
        );
    }

    #[test]
    fn decode_rejects_zero_packet_id() {
        let wire = [0x00, 0x00, 0x00, 0x01, 0x61];
        let mut out = [SubTopic::new("x").unwrap(); 4];
        assert_eq!(
            UnsubscribePacket::decode(&wire, &mut out),
            Err(DecodeError::BadResponse)
        );
    }
}
