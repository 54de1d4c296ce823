// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;

use crate::byte_cursor::ByteArray;
use crate::error::DecodeError;
use crate::header::PacketType;
use crate::var_int::VarInt;

/// Packet type and Remaining Length recognized from a transport callback,
/// before any of the packet's own bytes have been read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IncomingHeader {
    pub packet_type: PacketType,
    pub remaining_length: u32,
    pub header_length: u32,
}

/// Packet type, Remaining Length and a borrowed view over the packet's
/// remaining bytes, recognized from a caller-owned buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketInfo<'a> {
    pub packet_type: PacketType,
    pub remaining_length: u32,
    pub header_length: u32,
    pub remaining_data: &'a [u8],
}

/// Entry point 1 (transport-driven): read the fixed header one byte at a
/// time from `recv`, a closure shaped like the C `receive(ctx, buf, len)`
/// callback spec.md describes — a Rust closure already carries its own
/// context, so no `ctx` pointer is threaded through separately.
///
/// # Errors
/// `NoDataAvailable` if `recv` reports zero bytes ready; `RecvFailed` if it
/// returns anything else short of a full read; `MalformedPacket` if the
/// varint would need a fifth continuation byte or is non-canonical;
/// `BadResponse` for an invalid type/flags combination.
pub fn get_incoming_packet_type_and_length(
    mut recv: impl FnMut(&mut [u8]) -> i32,
) -> Result<IncomingHeader, DecodeError> {
    let mut byte0 = [0u8; 1];
    read_exact(&mut recv, &mut byte0)?;
    let packet_type = PacketType::try_from(byte0[0])?;

    let mut value: u32 = 0;
    let mut multiplier: u32 = 1;
    let mut consumed: u32 = 1;

    loop {
        let mut b = [0u8; 1];
        read_exact(&mut recv, &mut b)?;
        value += u32::from(b[0] & 0x7f) * multiplier;
        consumed += 1;

        if b[0] & 0x80 == 0 {
            break;
        }
        if consumed == 5 {
            log::error!("packet_info: fifth continuation byte from transport");
            return Err(DecodeError::MalformedPacket);
        }
        multiplier *= 128;
    }

    if consumed - 1 != VarInt::size(value) {
        log::error!("packet_info: non-canonical remaining length from transport");
        return Err(DecodeError::MalformedPacket);
    }

    Ok(IncomingHeader {
        packet_type,
        remaining_length: value,
        header_length: consumed,
    })
}

fn read_exact(recv: &mut impl FnMut(&mut [u8]) -> i32, buf: &mut [u8]) -> Result<(), DecodeError> {
    #[allow(clippy::cast_possible_wrap)]
    let want = buf.len() as i32;
    match recv(buf) {
        0 => Err(DecodeError::NoDataAvailable),
        n if n == want => Ok(()),
        _ => Err(DecodeError::RecvFailed),
    }
}

/// Entry point 2 (buffer-driven): idempotently re-parse the fixed header
/// from the start of `buffer[..index]`. Returns `NeedMoreBytes` until a
/// complete fixed header, and then the full Remaining Length payload, is
/// available — the caller simply re-invokes this with a longer prefix as
/// more bytes arrive, rather than the codec retaining any state of its own.
///
/// # Errors
/// Same as [`get_incoming_packet_type_and_length`], plus `NeedMoreBytes`
/// when `buffer[..index]` does not yet hold a complete packet.
pub fn process_incoming_packet_type_and_length(
    buffer: &[u8],
    index: usize,
) -> Result<PacketInfo<'_>, DecodeError> {
    let available = &buffer[..index];
    let mut ba = ByteArray::new(available);

    let byte0 = ba.read_byte()?;
    let packet_type = PacketType::try_from(byte0)?;
    let remaining_length = VarInt::decode(&mut ba)?;
    #[allow(clippy::cast_possible_truncation)]
    let header_length = ba.offset() as u32;

    let value = remaining_length.value();
    let total = header_length as usize + value as usize;
    if total > available.len() {
        return Err(DecodeError::NeedMoreBytes);
    }

    Ok(PacketInfo {
        packet_type,
        remaining_length: value,
        header_length,
        remaining_data: &available[header_length as usize..total],
    })
}
