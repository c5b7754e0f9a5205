//!
//! This module defines validated read and write endpoint configurations.
//!
//! Both configurations double as the descriptors handed to the broker binding: they name the connector format,
//! report boundedness and list their settings for introspection.
//!
use crate::error::{PubSubError, Result};
use crate::resource::{self, ResourceAddress, ResourceKind};
use tracing::debug;

/// Format name the broker binding is selected by.
pub const FORMAT: &str = "pubsub";

/// Either the topic or the subscription a source reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    kind: ResourceKind,
    full_name: String,
    address: ResourceAddress,
}

impl Endpoint {
    fn parse(kind: ResourceKind, full_name: String) -> Result<Self> {
        let address = match kind {
            ResourceKind::Topic => resource::parse_topic(&full_name)?,
            ResourceKind::Subscription => resource::parse_subscription(&full_name)?,
        };
        Ok(Endpoint {
            kind,
            full_name,
            address,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn project(&self) -> &str {
        &self.address.project
    }

    pub fn name(&self) -> &str {
        &self.address.name
    }
}

/// One read endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    endpoint: Endpoint,

    /// Attribute whose value uniquely identifies a record. Without it, deduplication is best effort.
    dedup_attribute: Option<String>,

    /// Emit full messages instead of message data only.
    with_attributes: bool,

    /// Attribute supplying the event timestamp in place of the publish time.
    timestamp_attribute: Option<String>,
}

impl SourceConfig {
    /// Empty strings count as absent for every optional setting.
    ///
    /// # Errors
    /// Returns [`PubSubError::MissingAddress`] if neither `topic` nor `subscription` is given,
    /// [`PubSubError::ConflictingAddress`] if both are, and any error of the resource name parser otherwise.
    pub fn new(
        topic: Option<String>,
        subscription: Option<String>,
        dedup_attribute: Option<String>,
        with_attributes: bool,
        timestamp_attribute: Option<String>,
    ) -> Result<Self> {
        let endpoint = match (non_empty(topic), non_empty(subscription)) {
            (None, None) => return Err(PubSubError::MissingAddress),
            (Some(topic), Some(subscription)) => {
                return Err(PubSubError::ConflictingAddress {
                    topic,
                    subscription,
                })
            }
            (Some(topic), None) => Endpoint::parse(ResourceKind::Topic, topic)?,
            (None, Some(subscription)) => {
                Endpoint::parse(ResourceKind::Subscription, subscription)?
            }
        };

        debug!(
            endpoint = %endpoint.full_name,
            with_attributes,
            "PubSub source configured"
        );

        Ok(SourceConfig {
            endpoint,
            dedup_attribute: non_empty(dedup_attribute),
            with_attributes,
            timestamp_attribute: non_empty(timestamp_attribute),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn topic(&self) -> Option<&str> {
        self.full_name_of(ResourceKind::Topic)
    }

    pub fn subscription(&self) -> Option<&str> {
        self.full_name_of(ResourceKind::Subscription)
    }

    pub fn project(&self) -> &str {
        self.endpoint.project()
    }

    pub fn topic_name(&self) -> Option<&str> {
        (self.endpoint.kind == ResourceKind::Topic).then(|| self.endpoint.name())
    }

    pub fn subscription_name(&self) -> Option<&str> {
        (self.endpoint.kind == ResourceKind::Subscription).then(|| self.endpoint.name())
    }

    pub fn dedup_attribute(&self) -> Option<&str> {
        self.dedup_attribute.as_deref()
    }

    pub fn with_attributes(&self) -> bool {
        self.with_attributes
    }

    pub fn timestamp_attribute(&self) -> Option<&str> {
        self.timestamp_attribute.as_deref()
    }

    pub fn format(&self) -> &'static str {
        FORMAT
    }

    pub fn is_bounded(&self) -> bool {
        false
    }

    /// Settings for introspection, unset ones left out.
    pub fn metadata(&self) -> Vec<(&'static str, String)> {
        let mut items = Vec::new();
        push_some(&mut items, "dedup_attribute", self.dedup_attribute());
        push_some(&mut items, "topic", self.topic());
        push_some(&mut items, "subscription", self.subscription());
        items.push(("with_attributes", self.with_attributes.to_string()));
        push_some(&mut items, "timestamp_attribute", self.timestamp_attribute());
        items
    }

    fn full_name_of(&self, kind: ResourceKind) -> Option<&str> {
        (self.endpoint.kind == kind).then(|| self.endpoint.full_name())
    }
}

/// One write endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    full_topic: String,
    address: ResourceAddress,

    /// Attribute set on every outgoing message to a unique value, for readers to deduplicate on.
    dedup_attribute: Option<String>,

    /// Inputs are full messages instead of message data only.
    with_attributes: bool,

    /// Attribute set on every outgoing message to its publish time.
    timestamp_attribute: Option<String>,
}

impl SinkConfig {
    /// # Errors
    /// Returns any error of the resource name parser for `topic`.
    pub fn new(
        topic: impl Into<String>,
        dedup_attribute: Option<String>,
        with_attributes: bool,
        timestamp_attribute: Option<String>,
    ) -> Result<Self> {
        let full_topic = topic.into();
        let address = resource::parse_topic(&full_topic)?;

        debug!(topic = %full_topic, with_attributes, "PubSub sink configured");

        Ok(SinkConfig {
            full_topic,
            address,
            dedup_attribute: non_empty(dedup_attribute),
            with_attributes,
            timestamp_attribute: non_empty(timestamp_attribute),
        })
    }

    pub fn topic(&self) -> &str {
        &self.full_topic
    }

    pub fn project(&self) -> &str {
        &self.address.project
    }

    pub fn topic_name(&self) -> &str {
        &self.address.name
    }

    pub fn dedup_attribute(&self) -> Option<&str> {
        self.dedup_attribute.as_deref()
    }

    pub fn with_attributes(&self) -> bool {
        self.with_attributes
    }

    pub fn timestamp_attribute(&self) -> Option<&str> {
        self.timestamp_attribute.as_deref()
    }

    pub fn format(&self) -> &'static str {
        FORMAT
    }

    pub fn metadata(&self) -> Vec<(&'static str, String)> {
        let mut items = vec![("topic", self.full_topic.clone())];
        push_some(&mut items, "dedup_attribute", self.dedup_attribute());
        items.push(("with_attributes", self.with_attributes.to_string()));
        push_some(&mut items, "timestamp_attribute", self.timestamp_attribute());
        items
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn push_some(items: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        items.push((key, value.to_owned()));
    }
}
