// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use thiserror::Error;

/// Errors returned while sizing or serializing an outgoing packet.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// Caller-supplied arguments violate an API precondition: a zero packet
    /// identifier where one is required, an empty client id, a string or
    /// binary field longer than 65,535 bytes, a payload that would push
    /// Remaining Length past 268,435,455, and the like.
    #[error("bad parameter")]
    BadParameter,

    /// The caller-supplied buffer is too small to hold the packet.
    #[error("buffer too small")]
    NoMemory,
}

/// Errors returned while recognizing or decoding an incoming packet.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Incoming bytes violate MQTT 3.1.1 fixed structure (bad fixed header,
    /// wrong Remaining Length, zero packet id where one is required, ...).
    #[error("bad response")]
    BadResponse,

    /// (v5) Structural violation: truncated field, length overrun, a
    /// non-canonical variable byte integer.
    #[error("malformed packet")]
    MalformedPacket,

    /// (v5) Semantic violation: a repeated single-occurrence property, a
    /// value outside its allowed range, a property not allowed for this
    /// packet type.
    #[error("protocol error")]
    ProtocolError,

    /// A structurally valid CONNACK or SUBACK reports a refusal reason.
    #[error("server refused")]
    ServerRefused,

    /// The transport had zero bytes ready.
    #[error("no data available")]
    NoDataAvailable,

    /// The transport returned an unexpected short or negative read.
    #[error("recv failed")]
    RecvFailed,

    /// Only part of the packet is available yet; the caller should read more
    /// bytes and retry from the same starting offset.
    #[error("need more bytes")]
    NeedMoreBytes,
}
