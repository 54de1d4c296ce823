// Copyright (c) 2021 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! MQTT 5.0 packet serialization and deserialization.

mod auth;
mod connect;
mod connect_ack;
mod disconnect;
mod property;
mod publish;
mod publish_ack;
mod publish_complete;
mod publish_received;
mod publish_release;
mod reason_code;
mod subscribe;
mod subscribe_ack;
mod unsubscribe;
mod unsubscribe_ack;

pub use crate::v3::{PingRequestPacket, PingResponsePacket};
pub use auth::AuthPacket;
pub use connect::{ConnectPacket, Will};
pub use connect_ack::{ConnectAckPacket, ConnectContext};
pub use disconnect::DisconnectPacket;
pub use property::{
    Properties, Property, PropertyType, ACK_PROPERTIES, AUTH_PROPERTIES, CONNECT_ACK_PROPERTIES,
    CONNECT_PROPERTIES, DISCONNECT_PROPERTIES, PUBLISH_PROPERTIES, SUBSCRIBE_ACK_PROPERTIES,
    SUBSCRIBE_PROPERTIES, UNSUBSCRIBE_ACK_PROPERTIES, UNSUBSCRIBE_PROPERTIES, WILL_PROPERTIES,
};
pub use publish::PublishPacket;
pub use publish_ack::PublishAckPacket;
pub use publish_complete::PublishCompletePacket;
pub use publish_received::PublishReceivedPacket;
pub use publish_release::PublishReleasePacket;
pub use reason_code::{
    ReasonCode, AUTH_REASONS, CONNECT_REASONS, DISCONNECT_REASONS, PUBLISH_ACK_REASONS,
    PUBLISH_RELEASE_REASONS, SUBSCRIBE_REASONS, UNSUBSCRIBE_REASONS,
};
pub use subscribe::{RetainHandling, SubscribePacket, SubscribeTopic};
pub use subscribe_ack::SubscribeAckPacket;
pub use unsubscribe::UnsubscribePacket;
pub use unsubscribe_ack::UnsubscribeAckPacket;
