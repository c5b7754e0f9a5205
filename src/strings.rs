//!
//! UTF-8 string reads and writes, layered over [`ReadTransform`] and [`WriteTransform`].
//!
#![allow(deprecated)]

use crate::binding::{UnboundedSink, UnboundedSource};
use crate::element::{Element, ElementStream};
use crate::error::{PubSubError, Result};
use crate::read::ReadTransform;
use crate::write::WriteTransform;
use bytes::Bytes;

/// Reads message data as [`Element::Text`].
#[deprecated(since = "0.1.0", note = "use ReadTransform and decode message data instead")]
#[derive(Debug, Clone)]
pub struct ReadStrings {
    read: ReadTransform,
}

impl ReadStrings {
    pub fn new(
        topic: Option<String>,
        subscription: Option<String>,
        dedup_attribute: Option<String>,
    ) -> Result<Self> {
        let mut builder = ReadTransform::builder();
        if let Some(topic) = topic {
            builder = builder.topic(topic);
        }
        if let Some(subscription) = subscription {
            builder = builder.subscription(subscription);
        }
        if let Some(attribute) = dedup_attribute {
            builder = builder.dedup_attribute(attribute);
        }
        Ok(ReadStrings {
            read: builder.build()?,
        })
    }

    pub fn read(&self) -> &ReadTransform {
        &self.read
    }

    /// # Errors
    /// Each element fails with [`PubSubError::MalformedPayload`] if the message data is not UTF-8.
    pub fn expand(&self, source: &dyn UnboundedSource) -> Result<ElementStream> {
        Ok(self.read.expand(source)?.and_then_each(|element| match element {
            Element::Bytes(data) => String::from_utf8(data.to_vec())
                .map(Element::Text)
                .map_err(|e| PubSubError::MalformedPayload(format!("message data is not UTF-8: {}", e))),
            other => Err(other.mismatch("bytes")),
        }))
    }
}

/// Writes [`Element::Text`] as message data.
#[deprecated(since = "0.1.0", note = "use WriteTransform with encoded message data instead")]
#[derive(Debug, Clone)]
pub struct WriteStrings {
    write: WriteTransform,
}

impl WriteStrings {
    pub fn new(topic: impl Into<String>) -> Result<Self> {
        Ok(WriteStrings {
            write: WriteTransform::builder(topic).build()?,
        })
    }

    pub fn write(&self) -> &WriteTransform {
        &self.write
    }

    /// # Errors
    /// Returns [`PubSubError::TypeMismatch`] for the first element that is not text.
    pub async fn expand(&self, sink: &dyn UnboundedSink, input: ElementStream) -> Result<u64> {
        let encoded = input.and_then_each(|element| match element {
            Element::Text(text) => Ok(Element::Bytes(Bytes::from(text))),
            other => Err(other.mismatch("str")),
        });
        self.write.expand(sink, encoded).await
    }
}
