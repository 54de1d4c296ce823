// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Protocol-version-dispatching entry points. Every per-packet module
//! already does the real work (sizing, encoding, decoding); this module
//! only picks the v3.1.1 or v5 implementation based on [`ProtocolLevel`]
//! and, for PUBLISH and the simple ack family, folds the two protocol
//! versions' distinct packet types behind one enum so a caller that
//! doesn't care which version it's talking can stay generic.

use crate::base::{PacketId, ProtocolLevel};
use crate::error::{DecodeError, EncodeError};
use crate::header::PacketType;
use crate::packet_info::PacketInfo;
use crate::v3;
use crate::v5;
use crate::v5::ConnectContext;

/// A decoded PUBLISH packet, tagged by the protocol version it was read
/// with. v5's variant carries a property block; v3.1.1's does not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnyPublishPacket<'a> {
    V3(v3::PublishPacket<'a>),
    V5(v5::PublishPacket<'a>),
}

/// A decoded CONNACK packet, tagged by protocol version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnyConnectAckPacket<'a> {
    V3(v3::ConnectAckPacket),
    V5(v5::ConnectAckPacket<'a>),
}

/// # Errors
/// `EncodeError::BadParameter` if the total would exceed
/// `MAX_REMAINING_LENGTH`.
pub fn get_publish_packet_size(packet: &AnyPublishPacket) -> Result<(u32, u32), EncodeError> {
    match packet {
        AnyPublishPacket::V3(p) => p.encoded_len(),
        AnyPublishPacket::V5(p) => p.encoded_len(),
    }
}

/// # Errors
/// `EncodeError::NoMemory` if `buf` is smaller than the reported total size.
pub fn serialize_publish(packet: &AnyPublishPacket, buf: &mut [u8]) -> Result<u32, EncodeError> {
    match packet {
        AnyPublishPacket::V3(p) => p.encode_into(buf),
        AnyPublishPacket::V5(p) => p.encode_into(buf),
    }
}

/// Write everything up to and including the property block (v5) or packet
/// id (v3.1.1), letting the caller write the payload separately — for
/// scatter-gather transports that don't want to copy the payload into the
/// same buffer as the header.
///
/// # Errors
/// `EncodeError::NoMemory` if `buf` is smaller than the header.
pub fn serialize_publish_header(packet: &AnyPublishPacket, buf: &mut [u8]) -> Result<u32, EncodeError> {
    match packet {
        AnyPublishPacket::V3(p) => p.encode_header(buf),
        AnyPublishPacket::V5(p) => p.encode_header(buf),
    }
}

/// # Errors
/// `DecodeError::BadResponse`/`MalformedPacket`/`ProtocolError` per the
/// underlying per-version decoder; `DecodeError::BadResponse` if `info`
/// was not recognized as PUBLISH.
pub fn deserialize_publish<'a>(
    info: &PacketInfo<'a>,
    level: ProtocolLevel,
) -> Result<(Option<PacketId>, AnyPublishPacket<'a>), DecodeError> {
    let PacketType::Publish { dup, qos, retain } = info.packet_type else {
        return Err(DecodeError::BadResponse);
    };
    match level {
        ProtocolLevel::V311 => {
            let packet = v3::PublishPacket::decode(dup, qos, retain, info.remaining_data)?;
            let packet_id = packet.packet_id();
            Ok((packet_id, AnyPublishPacket::V3(packet)))
        }
        ProtocolLevel::V5 => {
            let packet = v5::PublishPacket::decode(dup, qos, retain, info.remaining_data)?;
            let packet_id = packet.packet_id();
            Ok((packet_id, AnyPublishPacket::V5(packet)))
        }
    }
}

fn ack_packet_type(level: ProtocolLevel, kind: PacketType) -> Result<(), DecodeError> {
    let _ = level;
    match kind {
        PacketType::PublishAck
        | PacketType::PublishReceived
        | PacketType::PublishRelease
        | PacketType::PublishComplete => Ok(()),
        _ => Err(DecodeError::BadResponse),
    }
}

/// Size of one of the four simple-ack packets (PUBACK/PUBREC/PUBREL/
/// PUBCOMP). v3.1.1 acks are always 4 bytes; v5 acks are sized by their own
/// shorthand rule.
///
/// # Errors
/// `EncodeError::BadParameter` if `packet_id` is zero.
pub fn get_ack_packet_size(
    level: ProtocolLevel,
    kind: PacketType,
    packet_id: PacketId,
    reason: Option<v5::ReasonCode>,
    properties: v5::Properties,
) -> Result<(u32, u32), EncodeError> {
    if packet_id == 0 {
        return Err(EncodeError::BadParameter);
    }
    match level {
        ProtocolLevel::V311 => Ok(v3::PublishAckPacket::encoded_len()),
        ProtocolLevel::V5 => {
            let reason = reason.unwrap_or(v5::ReasonCode::Success);
            match kind {
                PacketType::PublishAck => {
                    v5::PublishAckPacket::new(packet_id, reason, properties)?.encoded_len()
                }
                PacketType::PublishReceived => {
                    v5::PublishReceivedPacket::new(packet_id, reason, properties)?.encoded_len()
                }
                PacketType::PublishRelease => {
                    v5::PublishReleasePacket::new(packet_id, reason, properties)?.encoded_len()
                }
                PacketType::PublishComplete => {
                    v5::PublishCompletePacket::new(packet_id, reason, properties)?.encoded_len()
                }
                _ => Err(EncodeError::BadParameter),
            }
        }
    }
}

/// Serialize one of the four simple-ack packets.
///
/// # Errors
/// `EncodeError::BadParameter` if `packet_id` is zero; `NoMemory` if `buf`
/// is too small.
pub fn serialize_ack(
    level: ProtocolLevel,
    kind: PacketType,
    packet_id: PacketId,
    reason: Option<v5::ReasonCode>,
    properties: v5::Properties,
    buf: &mut [u8],
) -> Result<u32, EncodeError> {
    if packet_id == 0 {
        return Err(EncodeError::BadParameter);
    }
    match level {
        ProtocolLevel::V311 => v3::PublishAckPacket::new(packet_id)?.encode_into(buf),
        ProtocolLevel::V5 => {
            let reason = reason.unwrap_or(v5::ReasonCode::Success);
            match kind {
                PacketType::PublishAck => {
                    v5::PublishAckPacket::new(packet_id, reason, properties)?.encode_into(buf)
                }
                PacketType::PublishReceived => {
                    v5::PublishReceivedPacket::new(packet_id, reason, properties)?.encode_into(buf)
                }
                PacketType::PublishRelease => {
                    v5::PublishReleasePacket::new(packet_id, reason, properties)?.encode_into(buf)
                }
                PacketType::PublishComplete => {
                    v5::PublishCompletePacket::new(packet_id, reason, properties)?.encode_into(buf)
                }
                _ => Err(EncodeError::BadParameter),
            }
        }
    }
}

/// Decode one of the four simple-ack packets (PUBACK/PUBREC/PUBREL/PUBCOMP),
/// returning the packet id and, for v5, whether the reason code reported
/// success. v3.1.1 acks carry no reason code and are always treated as
/// success.
///
/// # Errors
/// `DecodeError::BadResponse` if `info` is not one of the four ack types;
/// per-version decode errors otherwise.
pub fn deserialize_ack(
    info: &PacketInfo,
    level: ProtocolLevel,
) -> Result<(PacketId, Option<bool>), DecodeError> {
    ack_packet_type(level, info.packet_type)?;
    match level {
        ProtocolLevel::V311 => match info.packet_type {
            PacketType::PublishAck => {
                Ok((v3::PublishAckPacket::decode(info.remaining_data)?.packet_id(), None))
            }
            PacketType::PublishReceived => Ok((
                v3::PublishReceivedPacket::decode(info.remaining_data)?.packet_id(),
                None,
            )),
            PacketType::PublishRelease => Ok((
                v3::PublishReleasePacket::decode(info.remaining_data)?.packet_id(),
                None,
            )),
            PacketType::PublishComplete => Ok((
                v3::PublishCompletePacket::decode(info.remaining_data)?.packet_id(),
                None,
            )),
            _ => Err(DecodeError::BadResponse),
        },
        ProtocolLevel::V5 => match info.packet_type {
            PacketType::PublishAck => {
                let p = v5::PublishAckPacket::decode(info.remaining_data)?;
                Ok((p.packet_id(), Some(p.reason_code().is_success())))
            }
            PacketType::PublishReceived => {
                let p = v5::PublishReceivedPacket::decode(info.remaining_data)?;
                Ok((p.packet_id(), Some(p.reason_code().is_success())))
            }
            PacketType::PublishRelease => {
                let p = v5::PublishReleasePacket::decode(info.remaining_data)?;
                Ok((p.packet_id(), Some(p.reason_code().is_success())))
            }
            PacketType::PublishComplete => {
                let p = v5::PublishCompletePacket::decode(info.remaining_data)?;
                Ok((p.packet_id(), Some(p.reason_code().is_success())))
            }
            _ => Err(DecodeError::BadResponse),
        },
    }
}

/// # Errors
/// `EncodeError::BadParameter` if `client_id` validation fails in the
/// underlying packet.
pub fn get_connect_packet_size(packet: &v3::ConnectPacket) -> Result<(u32, u32), EncodeError> {
    packet.encoded_len()
}

/// # Errors
/// `EncodeError::NoMemory` if `buf` is smaller than the reported total size.
pub fn serialize_connect(packet: &v3::ConnectPacket, buf: &mut [u8]) -> Result<u32, EncodeError> {
    packet.encode_into(buf)
}

/// # Errors
/// `EncodeError::BadParameter` if the total would exceed
/// `MAX_REMAINING_LENGTH`.
pub fn get_connect_ack_packet_size(packet: &AnyConnectAckPacket) -> Result<(u32, u32), EncodeError> {
    match packet {
        AnyConnectAckPacket::V3(_) => Ok(v3::ConnectAckPacket::encoded_len()),
        AnyConnectAckPacket::V5(p) => p.encoded_len(),
    }
}

/// # Errors
/// `EncodeError::NoMemory` if `buf` is smaller than the reported total size.
pub fn serialize_connect_ack(packet: &AnyConnectAckPacket, buf: &mut [u8]) -> Result<u32, EncodeError> {
    match packet {
        AnyConnectAckPacket::V3(p) => p.encode_into(buf),
        AnyConnectAckPacket::V5(p) => p.encode_into(buf),
    }
}

/// # Errors
/// `DecodeError::BadResponse` if `info` was not recognized as CONNACK;
/// per-version decode errors (including v5's cross-field validation against
/// `connect_sent`) otherwise.
pub fn deserialize_connect_ack<'a>(
    info: &PacketInfo<'a>,
    level: ProtocolLevel,
    connect_sent: &ConnectContext,
) -> Result<AnyConnectAckPacket<'a>, DecodeError> {
    if info.packet_type != PacketType::ConnectAck {
        return Err(DecodeError::BadResponse);
    }
    match level {
        ProtocolLevel::V311 => Ok(AnyConnectAckPacket::V3(v3::ConnectAckPacket::decode(
            info.remaining_data,
        )?)),
        ProtocolLevel::V5 => Ok(AnyConnectAckPacket::V5(v5::ConnectAckPacket::decode(
            info.remaining_data,
            *connect_sent,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::QoS;
    use crate::packet_info::process_incoming_packet_type_and_length;
    use crate::topic::PubTopic;

    #[test]
    fn deserialize_publish_dispatches_by_level() {
        let payload = b"hi";
        let topic = PubTopic::new("a/b").unwrap();
        let packet = v3::PublishPacket::new(topic, payload, QoS::AtMostOnce);
        let (_remaining, total) = packet.encoded_len().unwrap();
        let mut buf = vec![0u8; total as usize];
        packet.encode_into(&mut buf).unwrap();

        let info = process_incoming_packet_type_and_length(&buf, buf.len()).unwrap();
        let (packet_id, decoded) = deserialize_publish(&info, ProtocolLevel::V311).unwrap();
        assert_eq!(packet_id, None);
        match decoded {
            AnyPublishPacket::V3(p) => assert_eq!(p.topic().as_str(), "a/b"),
            AnyPublishPacket::V5(_) => panic!("expected v3"),
        }
    }

    #[test]
    fn deserialize_ack_reports_v5_reason() {
        let packet =
            v5::PublishAckPacket::new(3, v5::ReasonCode::NotAuthorized, v5::Properties::empty())
                .unwrap();
        let (_remaining, total) = packet.encoded_len().unwrap();
        let mut buf = vec![0u8; total as usize];
        packet.encode_into(&mut buf).unwrap();

        let info = process_incoming_packet_type_and_length(&buf, buf.len()).unwrap();
        let (packet_id, success) = deserialize_ack(&info, ProtocolLevel::V5).unwrap();
        assert_eq!(packet_id, 3);
        assert_eq!(success, Some(false));
    }
}
