//!
//! This module provides an in-memory broker binding.
//!
//! Payloads are kept in their wire encoding per full topic or subscription name, and handed out the way a real
//! binding would: wire encoded for sources configured with attributes, message data otherwise.
//!
use crate::binding::{ByteSink, ByteStream, UnboundedSink, UnboundedSource};
use crate::codec;
use crate::config::{SinkConfig, SourceConfig};
use crate::error::{PubSubError, Result};
use crate::message::Message;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone, Default)]
pub struct MemoryBroker {
    payloads: Arc<Mutex<HashMap<String, Vec<Bytes>>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to a topic or subscription.
    pub fn publish(&self, address: &str, message: &Message) -> Result<()> {
        self.publish_raw(address, codec::encode(message))
    }

    /// Append a payload that is stored as is, valid encoding or not.
    pub fn publish_raw(&self, address: &str, payload: Bytes) -> Result<()> {
        lock(&self.payloads)?
            .entry(address.to_owned())
            .or_default()
            .push(payload);
        Ok(())
    }

    /// Messages stored under a topic or subscription, oldest first.
    pub fn published(&self, address: &str) -> Result<Vec<Message>> {
        lock(&self.payloads)?
            .get(address)
            .map(|payloads| payloads.iter().map(|p| codec::decode(p)).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

impl UnboundedSource for MemoryBroker {
    fn open(&self, source: &SourceConfig) -> Result<ByteStream> {
        let payloads = lock(&self.payloads)?
            .get(source.endpoint().full_name())
            .cloned()
            .unwrap_or_default();

        if source.with_attributes() {
            return Ok(futures::stream::iter(payloads.into_iter().map(Ok)).boxed());
        }
        let data = payloads.into_iter().map(|payload| {
            codec::decode(&payload)
                .map(|message| message.data().cloned().unwrap_or_default())
                .map_err(|e| PubSubError::Binding(e.to_string()))
        });
        Ok(futures::stream::iter(data).boxed())
    }
}

impl UnboundedSink for MemoryBroker {
    fn open(&self, sink: &SinkConfig) -> Result<ByteSink> {
        let payloads = Arc::clone(&self.payloads);
        let topic = sink.topic().to_owned();
        let with_attributes = sink.with_attributes();

        let writer = futures::sink::unfold((), move |(), payload: Bytes| {
            let payloads = Arc::clone(&payloads);
            let topic = topic.clone();
            async move {
                let payload = if with_attributes {
                    payload
                } else {
                    codec::encode(&Message::from_data(payload))
                };
                lock(&payloads)?.entry(topic).or_default().push(payload);
                Ok::<_, PubSubError>(())
            }
        });
        Ok(Box::pin(writer))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| PubSubError::Binding(format!("Lock is poisoned. Cause: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::SinkExt;

    const TOPIC: &str = "projects/fake-project/topics/a_topic";

    #[tokio::test]
    async fn test_sink_wraps_data() -> Result<()> {
        let broker = MemoryBroker::new();
        let config = SinkConfig::new(TOPIC, None, false, None)?;
        let mut sink = UnboundedSink::open(&broker, &config)?;
        sink.send(Bytes::from("payload")).await?;
        sink.close().await?;

        assert_eq!(broker.published(TOPIC)?, vec![Message::from_data("payload")]);
        assert!(broker.published("projects/fake-project/topics/other")?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_source_data_only() -> Result<()> {
        let broker = MemoryBroker::new();
        broker.publish(TOPIC, &Message::from_data("payload"))?;
        let config = SourceConfig::new(Some(TOPIC.to_owned()), None, None, false, None)?;
        let payloads: Vec<_> = UnboundedSource::open(&broker, &config)?.collect().await;
        assert!(matches!(payloads.as_slice(), [Ok(p)] if p.as_ref() == b"payload"));
        Ok(())
    }
}
