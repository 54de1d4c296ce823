// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;

use crate::base::{Decode, Encode, QoS};
use crate::byte_cursor::{ByteArray, ByteWriter};
use crate::error::{DecodeError, EncodeError};

/// The CONNECT variable header's Connect Flags byte.
///
/// Bit layout, high to low: username(7), password(6), will-retain(5),
/// will-qos(4-3), will(2), clean-session/clean-start(1), reserved(0).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectFlags {
    pub has_username: bool,
    pub has_password: bool,
    pub will_retain: bool,
    pub will_qos: QoS,
    pub will: bool,
    pub clean_session: bool,
}

const USERNAME_MASK: u8 = 0b1000_0000;
const PASSWORD_MASK: u8 = 0b0100_0000;
const WILL_RETAIN_MASK: u8 = 0b0010_0000;
const WILL_QOS_MASK: u8 = 0b0001_1000;
const WILL_MASK: u8 = 0b0000_0100;
const CLEAN_SESSION_MASK: u8 = 0b0000_0010;
const RESERVED_MASK: u8 = 0b0000_0001;

impl ConnectFlags {
    #[must_use]
    pub const fn bytes() -> u32 {
        1
    }
}

impl Encode for ConnectFlags {
    fn encode(&self, bw: &mut ByteWriter) -> Result<u32, EncodeError> {
        let mut v = 0u8;
        if self.has_username {
            v |= USERNAME_MASK;
        }
        if self.has_password {
            v |= PASSWORD_MASK;
        }
        if self.will_retain {
            v |= WILL_RETAIN_MASK;
        }
        v |= (self.will_qos as u8) << 3;
        if self.will {
            v |= WILL_MASK;
        }
        if self.clean_session {
            v |= CLEAN_SESSION_MASK;
        }
        bw.write_u8(v)?;
        Ok(1)
    }
}

impl<'a> Decode<'a> for ConnectFlags {
    fn decode(ba: &mut ByteArray<'a>) -> Result<Self, DecodeError> {
        let v = ba.read_byte()?;

        if v & RESERVED_MASK != 0 {
            log::error!("connect_flags: reserved bit set");
            return Err(DecodeError::BadResponse);
        }

        let has_username = v & USERNAME_MASK != 0;
        let has_password = v & PASSWORD_MASK != 0;
        let will = v & WILL_MASK != 0;
        let will_retain = v & WILL_RETAIN_MASK != 0;
        let will_qos = QoS::try_from((v & WILL_QOS_MASK) >> 3)?;
        let clean_session = v & CLEAN_SESSION_MASK != 0;

        // MQTT-3.1.2-22: password present requires username present.
        if has_password && !has_username {
            log::error!("connect_flags: password set without username");
            return Err(DecodeError::BadResponse);
        }

        // MQTT-3.1.2-11/13/14: will-retain / will-qos only make sense when
        // the will flag is set.
        if !will && (will_retain || will_qos != QoS::AtMostOnce) {
            log::error!("connect_flags: will-retain/will-qos set without will flag");
            return Err(DecodeError::BadResponse);
        }

        Ok(Self {
            has_username,
            has_password,
            will_retain,
            will_qos,
            will,
            clean_session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let flags = ConnectFlags {
            has_username: true,
            has_password: true,
            will_retain: false,
            will_qos: QoS::AtLeastOnce,
            will: true,
            clean_session: true,
        };
        let mut buf = [0u8; 1];
        let mut bw = ByteWriter::new(&mut buf);
        flags.encode(&mut bw).unwrap();

        let mut ba = ByteArray::new(&buf);
        let decoded = ConnectFlags::decode(&mut ba).unwrap();
        assert_eq!(decoded, flags);
    }

    #[test]
    fn reserved_bit_rejected() {
        let buf = [0b0000_0001];
        let mut ba = ByteArray::new(&buf);
        assert_eq!(
            ConnectFlags::decode(&mut ba),
            Err(DecodeError::BadResponse)
        );
    }

    #[test]
    fn password_without_username_rejected() {
        let buf = [PASSWORD_MASK];
        let mut ba = ByteArray::new(&buf);
        assert_eq!(
            ConnectFlags::decode(&mut ba),
            Err(DecodeError::BadResponse)
        );
    }

    #[test]
    fn will_qos_without_will_rejected() {
        let buf = [WILL_QOS_MASK & (1 << 3)];
        let mut ba = ByteArray::new(&buf);
        assert_eq!(
            ConnectFlags::decode(&mut ba),
            Err(DecodeError::BadResponse)
        );
    }
}
