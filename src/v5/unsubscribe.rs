// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::base::{Decode, Encode, PacketId};
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};
use crate::header::{FixedHeader, PacketType};
use crate::topic::SubTopic;
use crate::var_int::VarInt;
use crate::v5::property::{Properties, UNSUBSCRIBE_PROPERTIES};

/// MQTT 5 UNSUBSCRIBE packet: a nonempty ordered list of topic filters to
/// remove, preceded by a property block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsubscribePacket<'a> {
    packet_id: PacketId,
    properties: Properties<'a>,
    topics: &'a [SubTopic<'a>],
}

impl<'a> UnsubscribePacket<'a> {
    /// # Errors
    /// `EncodeError::BadParameter` if `packet_id` is zero or `topics` is
    /// empty.
    pub fn new(
        packet_id: PacketId,
        properties: Properties<'a>,
        topics: &'a [SubTopic<'a>],
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
    pub const fn topics(&self) -> &'a [SubTopic<'a>] {
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
        FixedHeader::new(PacketType::Unsubscribe, VarInt::new(remaining)?).encode(&mut bw)?;
        bw.write_u16(self.packet_id)?;
        self.properties.encode(&mut bw)?;
        for t in self.topics {
            t.encode(&mut bw)?;
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(bw.len() as u32)
    }

    /// Decode into a caller-supplied scratch array (zero allocation).
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

        let properties = Properties::decode(&mut ba)?;
        properties.validate(UNSUBSCRIBE_PROPERTIES)?;

        let mut count = 0;
        while ba.remaining_bytes() > 0 {
            let topic = SubTopic::decode(&mut ba)?;
            if count >= out.len() {
                log::error!("v5/unsubscribe: more topic filters than scratch space");
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
