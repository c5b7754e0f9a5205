//!
//! This module defines [`MultiSourceFanOut`], reading from several topics and subscriptions into one stream.
//!
//! Per-source streams are merged as they produce elements. No order is defined across sources; within a
//! source, elements arrive in the order the binding delivers them.
//!
use crate::binding::UnboundedSource;
use crate::config::SourceConfig;
use crate::element::{Boundedness, Element, ElementStream};
use crate::error::{PubSubError, Result};
use crate::read::ReadTransform;
use crate::resource::ResourceKind;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::BTreeMap;
use tracing::debug;

/// A per-source parameter: one value shared by all sources, or one value per source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerSourceParam {
    Broadcast(Option<String>),
    PerSource(Vec<Option<String>>),
}

impl PerSourceParam {
    fn resolve(self, parameter: &'static str, sources: usize) -> Result<Vec<Option<String>>> {
        match self {
            PerSourceParam::Broadcast(value) => Ok(vec![value; sources]),
            PerSourceParam::PerSource(values) if values.len() == sources => Ok(values),
            PerSourceParam::PerSource(values) => Err(PubSubError::ParameterCountMismatch {
                parameter,
                expected: sources,
                actual: values.len(),
            }),
        }
    }
}

impl Default for PerSourceParam {
    fn default() -> Self {
        PerSourceParam::Broadcast(None)
    }
}

impl From<&str> for PerSourceParam {
    fn from(value: &str) -> Self {
        PerSourceParam::Broadcast(Some(value.to_owned()))
    }
}

impl From<String> for PerSourceParam {
    fn from(value: String) -> Self {
        PerSourceParam::Broadcast(Some(value))
    }
}

impl From<Option<String>> for PerSourceParam {
    fn from(value: Option<String>) -> Self {
        PerSourceParam::Broadcast(value)
    }
}

impl From<Vec<&str>> for PerSourceParam {
    fn from(values: Vec<&str>) -> Self {
        PerSourceParam::PerSource(values.into_iter().map(|v| Some(v.to_owned())).collect())
    }
}

impl From<Vec<String>> for PerSourceParam {
    fn from(values: Vec<String>) -> Self {
        PerSourceParam::PerSource(values.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<String>>> for PerSourceParam {
    fn from(values: Vec<Option<String>>) -> Self {
        PerSourceParam::PerSource(values)
    }
}

/// One entry of the source list with its resolved parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutSource {
    pub source: String,
    pub kind: ResourceKind,
    pub dedup_attribute: Option<String>,
    pub timestamp_attribute: Option<String>,
}

impl FanOutSource {
    fn to_read(&self, with_attributes: bool) -> Result<ReadTransform> {
        let (topic, subscription) = match self.kind {
            ResourceKind::Topic => (Some(self.source.clone()), None),
            ResourceKind::Subscription => (None, Some(self.source.clone())),
        };
        let config = SourceConfig::new(
            topic,
            subscription,
            self.dedup_attribute.clone(),
            with_attributes,
            self.timestamp_attribute.clone(),
        )?;
        Ok(ReadTransform::new(config))
    }

    /// Diagnostic label of the read, e.g. `PubSub topics/project:p/Read t`.
    pub fn step_name(&self) -> String {
        let segments: Vec<&str> = self.source.split('/').collect();
        format!(
            "PubSub {}/project:{}/Read {}",
            self.kind.collection(),
            segments.get(1).copied().unwrap_or_default(),
            segments.last().copied().unwrap_or_default()
        )
    }
}

/// Reads from a list of topics and subscriptions and merges their outputs.
#[derive(Debug, Clone)]
pub struct MultiSourceFanOut {
    sources: Vec<FanOutSource>,

    /// Pair each element with the full name of its source.
    with_context: bool,

    with_attributes: bool,
}

impl MultiSourceFanOut {
    /// Sources are full topic names `projects/<project>/topics/<topic>` or full subscription names
    /// `projects/<project>/subscriptions/<subscription>`, freely mixed.
    pub fn builder<I, S>(sources: I) -> FanOutBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FanOutBuilder {
            sources: sources.into_iter().map(Into::into).collect(),
            ..FanOutBuilder::default()
        }
    }

    /// Sources with their resolved parameters, in source list order.
    pub fn sources(&self) -> &[FanOutSource] {
        &self.sources
    }

    pub fn with_context(&self) -> bool {
        self.with_context
    }

    pub fn with_attributes(&self) -> bool {
        self.with_attributes
    }

    /// Always false: every constituent read is unbounded.
    pub fn is_bounded(&self) -> bool {
        false
    }

    pub fn step_names(&self) -> Vec<String> {
        self.sources.iter().map(FanOutSource::step_name).collect()
    }

    /// Per-source reads, in source list order.
    ///
    /// # Errors
    /// Returns the first configuration error of a source, such as [`PubSubError::InvalidProjectId`].
    pub fn reads(&self) -> Result<Vec<ReadTransform>> {
        self.sources
            .iter()
            .map(|source| source.to_read(self.with_attributes))
            .collect()
    }

    /// Open every source and merge their streams.
    ///
    /// # Errors
    /// Returns the first configuration error of a source, or the first error of the binding opening one.
    /// Element errors of any source are passed through.
    pub fn expand(&self, binding: &dyn UnboundedSource) -> Result<ElementStream> {
        let reads = self.reads()?;
        let mut streams: Vec<BoxStream<'static, Result<Element>>> = Vec::with_capacity(reads.len());
        for (source, read) in self.sources.iter().zip(&reads) {
            debug!(step = %source.step_name(), "Expanding PubSub fan-out read");
            let elements = read.expand(binding)?;
            if self.with_context {
                let name = source.source.clone();
                streams.push(
                    elements
                        .map(move |item| item.map(|element| Element::sourced(name.clone(), element)))
                        .boxed(),
                );
            } else {
                streams.push(elements.boxed());
            }
        }
        Ok(ElementStream::new(
            stream::select_all(streams),
            Boundedness::Unbounded,
        ))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FanOutBuilder {
    sources: Vec<String>,
    with_context: bool,
    with_attributes: bool,
    dedup_attribute: PerSourceParam,
    timestamp_attribute: PerSourceParam,
    parameters: BTreeMap<String, String>,
}

impl FanOutBuilder {
    pub fn with_context(mut self, with_context: bool) -> Self {
        self.with_context = with_context;
        self
    }

    pub fn with_attributes(mut self, with_attributes: bool) -> Self {
        self.with_attributes = with_attributes;
        self
    }

    pub fn dedup_attribute(mut self, attribute: impl Into<PerSourceParam>) -> Self {
        self.dedup_attribute = attribute.into();
        self
    }

    pub fn timestamp_attribute(mut self, attribute: impl Into<PerSourceParam>) -> Self {
        self.timestamp_attribute = attribute.into();
        self
    }

    /// Extra read parameter applying to every source. None is currently accepted: `topic` and `subscription`
    /// belong in the source list, anything else is unknown.
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<MultiSourceFanOut> {
        let count = self.sources.len();
        let dedup_attributes = self.dedup_attribute.resolve("dedup_attribute", count)?;
        let timestamp_attributes = self.timestamp_attribute.resolve("timestamp_attribute", count)?;

        let kinds = self
            .sources
            .iter()
            .map(|source| {
                ResourceKind::classify(source).ok_or_else(|| PubSubError::InvalidSource(source.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some((key, value)) = self.parameters.into_iter().next() {
            if key == "topic" || key == "subscription" {
                return Err(PubSubError::AmbiguousConfiguration { key, value });
            }
            return Err(PubSubError::UnknownParameter(key));
        }

        let sources: Vec<FanOutSource> = self
            .sources
            .into_iter()
            .zip(kinds)
            .zip(dedup_attributes.into_iter().zip(timestamp_attributes))
            .map(
                |((source, kind), (dedup_attribute, timestamp_attribute))| FanOutSource {
                    source,
                    kind,
                    dedup_attribute,
                    timestamp_attribute,
                },
            )
            .collect();

        debug!(
            sources = sources.len(),
            with_context = self.with_context,
            with_attributes = self.with_attributes,
            "PubSub fan-out configured"
        );

        Ok(MultiSourceFanOut {
            sources,
            with_context: self.with_context,
            with_attributes: self.with_attributes,
        })
    }
}
