// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Cross-module round-trip and sizer/serializer agreement tests driven
//! through the crate's public API rather than any single packet module.

use mqtt_codec::v3::{ConnectAckPacket, ConnectReturnCode, PingResponsePacket, PublishPacket as V3Publish};
use mqtt_codec::v5::{self, ReasonCode};
use mqtt_codec::{process_incoming_packet_type_and_length, DecodeError, EncodeError, PubTopic, QoS};

// Property 3 — sizer/serializer agreement: an exact-size buffer succeeds and
// consumes all of it; one byte short returns NoMemory.
#[test]
fn sizer_and_serializer_agree_on_buffer_size() {
    let topic = PubTopic::new("a/b").unwrap();
    let mut packet = V3Publish::new(topic, b"hello", QoS::AtLeastOnce);
    packet.set_packet_id(9).unwrap();
    let (_remaining, total) = packet.encoded_len().unwrap();

    let mut exact = vec![0u8; total as usize];
    let n = packet.encode_into(&mut exact).unwrap();
    assert_eq!(n, total);

    let mut short = vec![0u8; total as usize - 1];
    assert_eq!(packet.encode_into(&mut short), Err(EncodeError::NoMemory));
}

// Property 4 — round-trip for CONNACK, PUBLISH, ACK, SUBACK, PINGRESP: each
// serializes and deserializes back to a structurally equal descriptor.
#[test]
fn round_trip_connect_ack() {
    let packet = ConnectAckPacket::new(ConnectReturnCode::Accepted, true);
    let (_remaining, total) = ConnectAckPacket::encoded_len();
    let mut buf = vec![0u8; total as usize];
    packet.encode_into(&mut buf).unwrap();
    let decoded = ConnectAckPacket::decode(&buf[2..]).unwrap();
    assert_eq!(decoded.return_code(), packet.return_code());
    assert_eq!(decoded.session_present(), packet.session_present());
}

#[test]
fn round_trip_publish() {
    let topic = PubTopic::new("sensors/temp").unwrap();
    let mut packet = V3Publish::new(topic, b"21.5", QoS::ExactlyOnce);
    packet.set_packet_id(100).unwrap();
    let (_remaining, total) = packet.encoded_len().unwrap();
    let mut buf = vec![0u8; total as usize];
    packet.encode_into(&mut buf).unwrap();

    let info = process_incoming_packet_type_and_length(&buf, buf.len()).unwrap();
    let mqtt_codec::PacketType::Publish { dup, qos, retain } = info.packet_type else {
        panic!("expected Publish packet type");
    };
    let decoded = V3Publish::decode(dup, qos, retain, info.remaining_data).unwrap();
    assert_eq!(decoded, packet);
}

#[test]
fn round_trip_publish_ack() {
    let packet = mqtt_codec::v3::PublishAckPacket::new(42).unwrap();
    let mut buf = [0u8; 4];
    packet.encode_into(&mut buf).unwrap();
    assert_eq!(mqtt_codec::v3::PublishAckPacket::decode(&buf[2..]).unwrap(), packet);
}

#[test]
fn round_trip_subscribe_ack() {
    use mqtt_codec::v3::{SubscribeAckPacket, SubscribeReturnCode};

    let codes = [
        SubscribeReturnCode::Granted(QoS::AtLeastOnce),
        SubscribeReturnCode::Granted(QoS::ExactlyOnce),
    ];
    let packet = SubscribeAckPacket::new(7, &codes).unwrap();
    let (_remaining, total) = packet.encoded_len().unwrap();
    let mut buf = vec![0u8; total as usize];
    packet.encode_into(&mut buf).unwrap();

    let mut packet_id = 0;
    let mut out = [SubscribeReturnCode::Failure; 2];
    let count = SubscribeAckPacket::decode(&buf[2..], &mut packet_id, &mut out).unwrap();
    assert_eq!(packet_id, 7);
    assert_eq!(count, 2);
    assert_eq!(&out[..count], &codes[..]);
}

#[test]
fn round_trip_ping_response() {
    let packet = PingResponsePacket::new();
    let mut buf = [0u8; 2];
    packet.encode_into(&mut buf).unwrap();
    assert_eq!(PingResponsePacket::decode(&[]).unwrap(), packet);
}

// Property 7 — every serialize/deserialize path that carries a packet
// identifier rejects zero, v3 and v5 alike.
#[test]
fn packet_id_zero_is_rejected_everywhere() {
    let topic = PubTopic::new("a").unwrap();
    let mut packet = V3Publish::new(topic, b"", QoS::AtLeastOnce);
    assert_eq!(packet.set_packet_id(0), Err(EncodeError::BadParameter));

    assert_eq!(
        mqtt_codec::v3::PublishAckPacket::new(0),
        Err(EncodeError::BadParameter)
    );
    assert_eq!(
        mqtt_codec::v3::PublishAckPacket::decode(&[0x00, 0x00]),
        Err(DecodeError::BadResponse)
    );

    assert_eq!(
        v5::PublishAckPacket::new(0, ReasonCode::Success, v5::Properties::empty()),
        Err(EncodeError::BadParameter)
    );
}

// Property 5 — a PUBLISH whose Remaining Length would exceed the varint
// range is rejected by the sizer, without ever touching a buffer.
#[test]
fn oversize_publish_is_rejected_by_sizer() {
    let topic = PubTopic::new("t").unwrap();
    let huge = vec![0u8; mqtt_codec::MAX_REMAINING_LENGTH as usize];
    let packet = V3Publish::new(topic, &huge, QoS::AtMostOnce);
    assert_eq!(packet.encoded_len(), Err(EncodeError::BadParameter));
}
