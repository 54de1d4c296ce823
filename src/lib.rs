// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Wire-format codec for MQTT 3.1.1 and MQTT 5.0 control packets.
//!
//! Computes exact on-wire sizes for outgoing packets and writes them into
//! caller-supplied buffers; recognizes packet boundaries in inbound byte
//! streams and returns typed, borrowing views over decoded fields. No
//! dynamic allocation, no ownership of topic/payload buffers, no network
//! I/O, no session state.

mod api;
mod base;
mod byte_cursor;
mod connect_flags;
mod error;
mod header;
mod packet_info;
mod primitive;
mod topic;
mod var_int;
pub mod v3;
pub mod v5;

pub use api::{
    deserialize_ack, deserialize_connect_ack, deserialize_publish, get_ack_packet_size,
    get_connect_ack_packet_size, get_connect_packet_size, get_publish_packet_size,
    serialize_ack, serialize_connect, serialize_connect_ack, serialize_publish,
    serialize_publish_header, AnyConnectAckPacket, AnyPublishPacket,
};
pub use base::{decode_protocol_header, Decode, Encode, PacketId, ProtocolLevel, QoS, PROTOCOL_NAME};
pub use byte_cursor::{ByteArray, ByteWriter};
pub use connect_flags::ConnectFlags;
pub use error::{DecodeError, EncodeError};
pub use header::{FixedHeader, PacketType};
pub use packet_info::{
    get_incoming_packet_type_and_length, process_incoming_packet_type_and_length, IncomingHeader,
    PacketInfo,
};
pub use primitive::{BinaryData, BoolData, StringData, StringPairData, MAX_STRING_LEN};
pub use topic::{PubTopic, SubTopic};
pub use var_int::{VarInt, MAX_REMAINING_LENGTH};
