//!
//! This module defines the portable representation of read and write transforms.
//!
//! Payloads are JSON documents with camelCase field names. Other implementations may write empty strings for
//! unset optional fields; those are read back as unset.
//!
use crate::config::{non_empty, SourceConfig};
use crate::error::{PubSubError, Result};
use crate::read::ReadTransform;
use crate::write::WriteTransform;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub const PUBSUB_READ_URN: &str = "beam:transform:pubsub_read:v1";

pub const PUBSUB_WRITE_URN: &str = "beam:transform:pubsub_write:v1";

/// Coder of raw byte payloads.
pub const BYTES_CODER_ID: &str = "beam:coder:bytes:v1";

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedup_attribute: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_attribute: Option<String>,

    #[serde(default)]
    pub with_attributes: bool,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WritePayload {
    pub topic: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedup_attribute: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_attribute: Option<String>,

    #[serde(default)]
    pub with_attributes: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_coder_id: Option<String>,
}

impl From<&SourceConfig> for ReadPayload {
    fn from(config: &SourceConfig) -> Self {
        ReadPayload {
            topic: config.topic().map(str::to_owned),
            subscription: config.subscription().map(str::to_owned),
            dedup_attribute: config.dedup_attribute().map(str::to_owned),
            timestamp_attribute: config.timestamp_attribute().map(str::to_owned),
            with_attributes: config.with_attributes(),
        }
    }
}

/// A transform reconstructed from its portable representation.
#[derive(Debug, Clone, PartialEq)]
pub enum PortableTransform {
    Read(ReadTransform),
    Write(WriteTransform),
}

/// Transforms that have a portable representation.
pub trait Portable {
    fn urn(&self) -> &'static str;

    fn to_payload(&self) -> Result<Bytes>;
}

impl Portable for ReadTransform {
    fn urn(&self) -> &'static str {
        PUBSUB_READ_URN
    }

    fn to_payload(&self) -> Result<Bytes> {
        to_json(PUBSUB_READ_URN, &ReadPayload::from(self.config()))
    }
}

impl Portable for WriteTransform {
    fn urn(&self) -> &'static str {
        PUBSUB_WRITE_URN
    }

    fn to_payload(&self) -> Result<Bytes> {
        let config = self.config();
        let payload = WritePayload {
            topic: config.topic().to_owned(),
            dedup_attribute: config.dedup_attribute().map(str::to_owned),
            timestamp_attribute: config.timestamp_attribute().map(str::to_owned),
            with_attributes: config.with_attributes(),
            wire_coder_id: Some(self.wire_coder_id().to_owned()),
        };
        to_json(PUBSUB_WRITE_URN, &payload)
    }
}

impl ReadTransform {
    pub fn from_payload(payload: ReadPayload) -> Result<Self> {
        let config = SourceConfig::new(
            payload.topic,
            payload.subscription,
            payload.dedup_attribute,
            payload.with_attributes,
            payload.timestamp_attribute,
        )?;
        Ok(ReadTransform::new(config))
    }
}

impl WriteTransform {
    pub fn from_payload(payload: WritePayload) -> Result<Self> {
        let mut builder = WriteTransform::builder(payload.topic).with_attributes(payload.with_attributes);
        if let Some(attribute) = non_empty(payload.dedup_attribute) {
            builder = builder.dedup_attribute(attribute);
        }
        if let Some(attribute) = non_empty(payload.timestamp_attribute) {
            builder = builder.timestamp_attribute(attribute);
        }
        if let Some(id) = payload.wire_coder_id {
            builder = builder.wire_coder_id(id);
        }
        builder.build()
    }
}

type Reconstructor = fn(&[u8]) -> Result<PortableTransform>;

/// Maps URNs to functions rebuilding transforms from their payloads.
pub struct PortableRegistry {
    reconstructors: HashMap<String, Reconstructor>,
}

impl PortableRegistry {
    /// A registry without entries.
    pub fn new() -> Self {
        PortableRegistry {
            reconstructors: HashMap::new(),
        }
    }

    pub fn register(&mut self, urn: &str, reconstructor: Reconstructor) {
        self.reconstructors.insert(urn.to_owned(), reconstructor);
    }

    pub fn contains(&self, urn: &str) -> bool {
        self.reconstructors.contains_key(urn)
    }

    /// Export a transform as its URN and payload.
    pub fn export(&self, transform: &dyn Portable) -> Result<(&'static str, Bytes)> {
        Ok((transform.urn(), transform.to_payload()?))
    }

    /// # Errors
    /// Returns [`PubSubError::UnknownUrn`] if nothing is registered for `urn`, [`PubSubError::InvalidPayload`]
    /// if the payload does not parse, and any configuration error of the rebuilt transform.
    pub fn reconstruct(&self, urn: &str, payload: &[u8]) -> Result<PortableTransform> {
        let reconstructor = self
            .reconstructors
            .get(urn)
            .ok_or_else(|| PubSubError::UnknownUrn(urn.to_owned()))?;
        debug!(urn, "Reconstructing transform from portable payload");
        reconstructor(payload)
    }
}

impl Default for PortableRegistry {
    /// A registry with the read and write transforms of this crate.
    fn default() -> Self {
        let mut registry = PortableRegistry::new();
        registry.register(PUBSUB_READ_URN, |payload| {
            let payload: ReadPayload = from_json(PUBSUB_READ_URN, payload)?;
            ReadTransform::from_payload(payload).map(PortableTransform::Read)
        });
        registry.register(PUBSUB_WRITE_URN, |payload| {
            let payload: WritePayload = from_json(PUBSUB_WRITE_URN, payload)?;
            WriteTransform::from_payload(payload).map(PortableTransform::Write)
        });
        registry
    }
}

fn to_json<T: Serialize>(urn: &str, payload: &T) -> Result<Bytes> {
    serde_json::to_vec(payload)
        .map(Bytes::from)
        .map_err(|e| PubSubError::InvalidPayload {
            urn: urn.to_owned(),
            reason: e.to_string(),
        })
}

fn from_json<'a, T: Deserialize<'a>>(urn: &str, payload: &'a [u8]) -> Result<T> {
    serde_json::from_slice(payload).map_err(|e| PubSubError::InvalidPayload {
        urn: urn.to_owned(),
        reason: e.to_string(),
    })
}
