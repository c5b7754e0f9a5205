use crate::binding::UnboundedSink;
use crate::codec;
use crate::config::SinkConfig;
use crate::element::{Element, ElementStream};
use crate::error::Result;
use crate::portable::BYTES_CODER_ID;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tracing::debug;

/// Writes to a topic.
///
/// Takes [`Element::Bytes`] as message data, or [`Element::Message`] when configured `with_attributes`, in which
/// case data and attributes travel to the binding in their wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTransform {
    config: SinkConfig,

    /// Identifier of the coder the binding applies to outgoing payloads.
    wire_coder_id: String,
}

impl WriteTransform {
    pub fn new(config: SinkConfig) -> Self {
        WriteTransform {
            config,
            wire_coder_id: BYTES_CODER_ID.to_owned(),
        }
    }

    pub fn builder(topic: impl Into<String>) -> WriteBuilder {
        WriteBuilder {
            topic: topic.into(),
            dedup_attribute: None,
            with_attributes: false,
            timestamp_attribute: None,
            wire_coder_id: None,
        }
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    pub fn wire_coder_id(&self) -> &str {
        &self.wire_coder_id
    }

    /// Convert one input element into the payload handed to the binding.
    ///
    /// # Errors
    /// Returns [`PubSubError::TypeMismatch`](crate::PubSubError::TypeMismatch) naming the element's type
    /// and value if it is not a message (with attributes) or bytes (without).
    pub fn to_wire(&self, element: Element) -> Result<Bytes> {
        match element {
            Element::Message(message) if self.config.with_attributes() => Ok(codec::encode(&message)),
            Element::Bytes(data) if !self.config.with_attributes() => Ok(data),
            other if self.config.with_attributes() => Err(other.mismatch("Message")),
            other => Err(other.mismatch("bytes")),
        }
    }

    /// Forward every element of `input` to the topic and return how many were written.
    ///
    /// # Errors
    /// Stops at the first failing element, or the first failure of the binding.
    pub async fn expand(&self, sink: &dyn UnboundedSink, mut input: ElementStream) -> Result<u64> {
        let mut writer = sink.open(&self.config)?;
        debug!(
            topic = %self.config.topic(),
            with_attributes = self.config.with_attributes(),
            "Expanded PubSub write"
        );

        let mut written = 0u64;
        while let Some(element) = input.next().await {
            let payload = self.to_wire(element?)?;
            writer.send(payload).await?;
            written += 1;
        }
        writer.close().await?;
        Ok(written)
    }
}

#[derive(Debug, Clone)]
pub struct WriteBuilder {
    topic: String,
    dedup_attribute: Option<String>,
    with_attributes: bool,
    timestamp_attribute: Option<String>,
    wire_coder_id: Option<String>,
}

impl WriteBuilder {
    /// Attribute set on every message to a unique value, so that readers may deduplicate on it.
    pub fn dedup_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.dedup_attribute = Some(attribute.into());
        self
    }

    pub fn with_attributes(mut self, with_attributes: bool) -> Self {
        self.with_attributes = with_attributes;
        self
    }

    /// Attribute set on every message to its publish time.
    pub fn timestamp_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.timestamp_attribute = Some(attribute.into());
        self
    }

    pub fn wire_coder_id(mut self, id: impl Into<String>) -> Self {
        self.wire_coder_id = Some(id.into());
        self
    }

    pub fn build(self) -> Result<WriteTransform> {
        let config = SinkConfig::new(
            self.topic,
            self.dedup_attribute,
            self.with_attributes,
            self.timestamp_attribute,
        )?;
        let mut transform = WriteTransform::new(config);
        if let Some(id) = self.wire_coder_id.filter(|id| !id.is_empty()) {
            transform.wire_coder_id = id;
        }
        Ok(transform)
    }
}
