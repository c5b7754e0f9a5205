//!
//! This module defines the wire schema of attribute-carrying payloads and converts between it and [`Message`].
//!
//! The schema is wire compatible with `google.pubsub.v1.PubsubMessage`: field 1 is the data and field 2 the
//! attribute map. Other fields a broker may set, such as the message id, are skipped when decoding.
//!
use crate::error::{PubSubError, Result};
use crate::message::Message;
use bytes::Bytes;
use prost::Message as _;
use std::collections::BTreeMap;

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct WireMessage {
    // Raw payload bytes. Presence is tracked so that empty data survives a round trip.
    #[prost(bytes = "bytes", optional, tag = "1")]
    pub(crate) data: Option<Bytes>,

    // Sorted, so equal messages always encode to equal bytes.
    #[prost(btree_map = "string, string", tag = "2")]
    pub(crate) attributes: BTreeMap<String, String>,
}

/// Serialize a message into its wire form.
pub fn encode(message: &Message) -> Bytes {
    let wire = WireMessage {
        data: message.data().cloned(),
        attributes: message.attributes().clone(),
    };
    Bytes::from(wire.encode_to_vec())
}

/// Parse a message from its wire form.
///
/// # Errors
/// Returns [`PubSubError::MalformedPayload`] if `buf` is not a valid encoding, or if it decodes to a message
/// with neither data nor attributes.
pub fn decode(buf: &[u8]) -> Result<Message> {
    let wire = WireMessage::decode(buf).map_err(|e| PubSubError::MalformedPayload(e.to_string()))?;
    Message::new(wire.data, wire.attributes).map_err(|_e| {
        PubSubError::MalformedPayload(format!(
            "payload of {} bytes carries neither data nor attributes",
            buf.len()
        ))
    })
}
