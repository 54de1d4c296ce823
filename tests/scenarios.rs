// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Generative and literal-scenario tests that span more than one module:
//! VarInt round-trip/canonicity, PUBLISH flag validity, v5 property
//! uniqueness/bounds, and byte-at-a-time streaming parse.

use proptest::prelude::*;

use mqtt_codec::v5::{ConnectAckPacket, ConnectContext, Properties, Property};
use mqtt_codec::{
    process_incoming_packet_type_and_length, ByteArray, ByteWriter, DecodeError, Decode, Encode,
    PacketType, VarInt, MAX_REMAINING_LENGTH,
};

proptest! {
    // Property 1 — VarInt round-trip for every value in range, with the
    // expected wire size.
    #[test]
    fn var_int_round_trips(value in 0u32..=MAX_REMAINING_LENGTH) {
        let mut buf = [0u8; 4];
        let mut bw = ByteWriter::new(&mut buf);
        let v = VarInt::new(value).unwrap();
        let written = v.encode(&mut bw).unwrap();
        prop_assert!((1..=4).contains(&written));
        prop_assert_eq!(written, VarInt::size(value));

        let mut ba = ByteArray::new(&buf[..written as usize]);
        let decoded = VarInt::decode(&mut ba).unwrap();
        prop_assert_eq!(decoded.value(), value);
    }

    // Property 2 — a non-minimal (padded) varint encoding is rejected.
    #[test]
    fn var_int_rejects_non_canonical_padding(value in 0u32..0x80) {
        // Re-encode a value that fits in one byte using the two-byte form.
        let padded = [(value as u8) | 0x80, 0x00];
        let mut ba = ByteArray::new(&padded);
        prop_assert_eq!(VarInt::decode(&mut ba), Err(DecodeError::MalformedPacket));
    }
}

fn encode_properties(props: &[Property]) -> Vec<u8> {
    let mut raw = vec![0u8; 256];
    let mut bw = ByteWriter::new(&mut raw);
    for p in props {
        p.encode(&mut bw).unwrap();
    }
    let raw_len = bw.len();

    let mut len_buf = [0u8; 4];
    let mut len_bw = ByteWriter::new(&mut len_buf);
    #[allow(clippy::cast_possible_truncation)]
    let len_n = VarInt::new(raw_len as u32).unwrap().encode(&mut len_bw).unwrap();

    let mut wire = Vec::new();
    wire.extend_from_slice(&len_buf[..len_n as usize]);
    wire.extend_from_slice(&raw[..raw_len]);
    wire
}

// Property 8 — a CONNACK property block with two Maximum-QoS entries is
// rejected; two User-Property entries are accepted.
#[test]
fn connect_ack_rejects_duplicate_maximum_qos() {
    let wire = encode_properties(&[Property::MaximumQoS(1), Property::MaximumQoS(0)]);
    let mut ba = ByteArray::new(&wire);
    let properties = Properties::decode(&mut ba).unwrap();
    assert_eq!(
        properties.validate(mqtt_codec::v5::CONNECT_ACK_PROPERTIES),
        Err(DecodeError::ProtocolError)
    );
}

#[test]
fn connect_ack_accepts_repeated_user_property() {
    use mqtt_codec::StringPairData;

    let pair_a = StringPairData::new("k1", "v1").unwrap();
    let pair_b = StringPairData::new("k2", "v2").unwrap();
    let wire = encode_properties(&[Property::UserProperty(pair_a), Property::UserProperty(pair_b)]);
    let mut ba = ByteArray::new(&wire);
    let properties = Properties::decode(&mut ba).unwrap();
    assert_eq!(properties.validate(mqtt_codec::v5::CONNECT_ACK_PROPERTIES), Ok(()));
}

// Property 9 — a CONNACK with Receive-Maximum = 0 or Maximum-Packet-Size = 0
// is rejected with ProtocolError.
#[test]
fn connect_ack_rejects_zero_receive_maximum() {
    let mut header = vec![0x00u8, 0x00]; // ack flags, reason code (success)
    header.extend_from_slice(&encode_properties(&[Property::ReceiveMaximum(0)]));
    let decoded = ConnectAckPacket::decode(&header, ConnectContext::default());
    assert_eq!(decoded, Err(DecodeError::ProtocolError));
}

// Property 6 — a deserialized PUBLISH with QoS bits == 0b11 is rejected at
// the fixed-header level, regardless of which packet follows.
#[test]
fn fixed_header_rejects_reserved_qos_bits() {
    let wire = [0b0011_0110u8, 0x00];
    assert_eq!(
        process_incoming_packet_type_and_length(&wire, wire.len()),
        Err(DecodeError::BadResponse)
    );
}

// Property 10 — streaming parse, one byte at a time: every strictly-short
// prefix reports NeedMoreBytes, and the exact prefix length succeeds. Uses a
// two-byte Remaining Length to exercise more than the minimal header.
#[test]
fn streaming_parse_one_byte_at_a_time_with_two_byte_remaining_length() {
    // PUBLISH, qos=0, topic "a" (3 bytes) + payload of 130 bytes -> remaining
    // length 134, which needs two varint bytes.
    let mut payload = vec![0u8; 130];
    payload.fill(0xab);
    let topic = mqtt_codec::PubTopic::new("a").unwrap();
    let packet = mqtt_codec::v3::PublishPacket::new(topic, &payload, mqtt_codec::QoS::AtMostOnce);
    let (remaining, total) = packet.encoded_len().unwrap();
    assert_eq!(VarInt::size(remaining), 2);

    let mut buf = vec![0u8; total as usize];
    packet.encode_into(&mut buf).unwrap();

    let full_header_len = 1 + VarInt::size(remaining) as usize;
    for index in 0..full_header_len + remaining as usize {
        if index < full_header_len {
            assert_eq!(
                process_incoming_packet_type_and_length(&buf, index),
                Err(DecodeError::NeedMoreBytes),
                "expected NeedMoreBytes at prefix length {index}"
            );
        }
    }
    let info = process_incoming_packet_type_and_length(&buf, buf.len()).unwrap();
    assert_eq!(info.packet_type, PacketType::Publish {
        dup: false,
        qos: mqtt_codec::QoS::AtMostOnce,
        retain: false,
    });
    assert_eq!(info.remaining_length, remaining);
}
