use crate::binding::UnboundedSource;
use crate::codec;
use crate::config::SourceConfig;
use crate::element::{Boundedness, Element, ElementStream};
use crate::error::Result;
use futures::StreamExt;
use tracing::debug;

/// Reads from a topic or a subscription.
///
/// Emits message data as [`Element::Bytes`], or whole messages as [`Element::Message`] when configured
/// `with_attributes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadTransform {
    config: SourceConfig,
}

impl ReadTransform {
    pub fn new(config: SourceConfig) -> Self {
        ReadTransform { config }
    }

    pub fn builder() -> ReadBuilder {
        ReadBuilder::default()
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn is_bounded(&self) -> bool {
        self.config.is_bounded()
    }

    pub fn output_type(&self) -> &'static str {
        if self.config.with_attributes() {
            "Message"
        } else {
            "bytes"
        }
    }

    /// Open the source and produce its element stream.
    ///
    /// # Errors
    /// Returns the binding's error if the source cannot be opened. Each element of the stream fails with
    /// [`PubSubError::MalformedPayload`](crate::PubSubError::MalformedPayload) if a payload expected to
    /// carry attributes does not decode.
    pub fn expand(&self, source: &dyn UnboundedSource) -> Result<ElementStream> {
        let raw = source.open(&self.config)?;
        debug!(
            endpoint = %self.config.endpoint().full_name(),
            output = self.output_type(),
            "Expanded PubSub read"
        );

        let elements = if self.config.with_attributes() {
            raw.map(|item| item.and_then(|payload| codec::decode(&payload).map(Element::Message)))
                .boxed()
        } else {
            raw.map(|item| item.map(Element::Bytes)).boxed()
        };
        Ok(ElementStream::new(elements, Boundedness::Unbounded))
    }
}

#[derive(Debug, Default, Clone)]
pub struct ReadBuilder {
    topic: Option<String>,
    subscription: Option<String>,
    dedup_attribute: Option<String>,
    with_attributes: bool,
    timestamp_attribute: Option<String>,
}

impl ReadBuilder {
    /// Topic in the form `projects/<project>/topics/<topic>`. Excludes a subscription.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Existing subscription in the form `projects/<project>/subscriptions/<subscription>`. Excludes a topic.
    pub fn subscription(mut self, subscription: impl Into<String>) -> Self {
        self.subscription = Some(subscription.into());
        self
    }

    pub fn dedup_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.dedup_attribute = Some(attribute.into());
        self
    }

    pub fn with_attributes(mut self, with_attributes: bool) -> Self {
        self.with_attributes = with_attributes;
        self
    }

    /// Attribute holding the event time, as epoch milliseconds or RFC 3339. Publish time is used otherwise.
    pub fn timestamp_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.timestamp_attribute = Some(attribute.into());
        self
    }

    pub fn build(self) -> Result<ReadTransform> {
        let config = SourceConfig::new(
            self.topic,
            self.subscription,
            self.dedup_attribute,
            self.with_attributes,
            self.timestamp_attribute,
        )?;
        Ok(ReadTransform::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PubSubError;
    use crate::message::Message;
    use crate::testing::MemoryBroker;
    use bytes::Bytes;
    use std::collections::BTreeMap;

    const TOPIC: &str = "projects/fake-project/topics/a_topic";

    fn message_with(data: &str, key: &str, value: &str) -> Message {
        let mut attributes = BTreeMap::new();
        attributes.insert(key.to_owned(), value.to_owned());
        Message::new(Some(Bytes::from(data.to_owned())), attributes).unwrap()
    }

    #[test]
    fn test_builder_validates_eagerly() {
        assert!(matches!(
            ReadTransform::builder().build(),
            Err(PubSubError::MissingAddress)
        ));
        assert!(matches!(
            ReadTransform::builder()
                .topic(TOPIC)
                .subscription("projects/fake-project/subscriptions/s")
                .build(),
            Err(PubSubError::ConflictingAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_data_only() -> Result<()> {
        let broker = MemoryBroker::new();
        broker.publish(TOPIC, &message_with("data", "k", "v"))?;

        let read = ReadTransform::builder().topic(TOPIC).build()?;
        assert_eq!(read.output_type(), "bytes");
        let stream = read.expand(&broker)?;
        assert!(!stream.is_bounded());

        let elements: Vec<_> = stream.collect().await;
        assert_eq!(elements.len(), 1);
        assert!(matches!(&elements[0], Ok(Element::Bytes(b)) if b.as_ref() == b"data"));
        Ok(())
    }

    #[tokio::test]
    async fn test_read_with_attributes() -> Result<()> {
        let broker = MemoryBroker::new();
        let expected = message_with("data", "k", "v");
        broker.publish(TOPIC, &expected)?;

        let read = ReadTransform::builder()
            .topic(TOPIC)
            .with_attributes(true)
            .build()?;
        assert_eq!(read.output_type(), "Message");

        let elements = read
            .expand(&broker)?
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(elements, vec![Element::Message(expected)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_payload_is_fatal() -> Result<()> {
        let broker = MemoryBroker::new();
        broker.publish_raw(TOPIC, Bytes::from_static(&[0x0a, 0x05, b'a']))?;

        let read = ReadTransform::builder()
            .topic(TOPIC)
            .with_attributes(true)
            .build()?;
        let elements: Vec<_> = read.expand(&broker)?.collect().await;
        assert!(matches!(
            elements.as_slice(),
            [Err(PubSubError::MalformedPayload(_))]
        ));
        Ok(())
    }
}
