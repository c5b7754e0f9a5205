//!
//! This module defines the seam to the runtime specific broker binding.
//!
//! The binding owns connections, flow control and acknowledgement. Transforms only see raw payload streams:
//! message data, or the wire encoding of whole messages when a configuration asks for attributes.
//!
use crate::config::{SinkConfig, SourceConfig};
use crate::error::{PubSubError, Result};
use bytes::Bytes;
use futures::sink::Sink;
use futures::stream::BoxStream;
use std::pin::Pin;

pub type ByteStream = BoxStream<'static, Result<Bytes>>;

pub type ByteSink = Pin<Box<dyn Sink<Bytes, Error = PubSubError> + Send>>;

/// Opens the payload stream of a topic or subscription.
pub trait UnboundedSource: Send + Sync {
    fn open(&self, source: &SourceConfig) -> Result<ByteStream>;
}

/// Opens a payload sink publishing to a topic.
pub trait UnboundedSink: Send + Sync {
    fn open(&self, sink: &SinkConfig) -> Result<ByteSink>;
}
