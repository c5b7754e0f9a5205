use crate::error::{PubSubError, Result};
use crate::message::Message;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

/// An element flowing through a pipeline stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Bytes(Bytes),
    Text(String),
    Message(Message),

    /// An element paired with the full name of the topic or subscription it was read from.
    Sourced(String, Box<Element>),
}

impl Element {
    pub fn sourced(source: impl Into<String>, element: Element) -> Self {
        Element::Sourced(source.into(), Box::new(element))
    }

    /// Runtime type name, as reported in type mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Element::Bytes(_) => "bytes",
            Element::Text(_) => "str",
            Element::Message(_) => "Message",
            Element::Sourced(..) => "tuple",
        }
    }

    pub(crate) fn mismatch(self, expected: &'static str) -> PubSubError {
        PubSubError::TypeMismatch {
            expected,
            actual: self.type_name(),
            value: format!("{:?}", self),
        }
    }
}

impl From<Bytes> for Element {
    fn from(bytes: Bytes) -> Self {
        Element::Bytes(bytes)
    }
}

impl From<Message> for Element {
    fn from(message: Message) -> Self {
        Element::Message(message)
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Element::Text(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundedness {
    Bounded,
    Unbounded,
}

/// A stream of pipeline elements that knows whether it ends.
pub struct ElementStream {
    inner: BoxStream<'static, Result<Element>>,
    boundedness: Boundedness,
}

impl ElementStream {
    pub fn new<S>(stream: S, boundedness: Boundedness) -> Self
    where
        S: Stream<Item = Result<Element>> + Send + 'static,
    {
        ElementStream {
            inner: stream.boxed(),
            boundedness,
        }
    }

    /// Finite stream over the given elements.
    pub fn from_elements(elements: Vec<Element>) -> Self {
        ElementStream::new(
            futures::stream::iter(elements.into_iter().map(Ok)),
            Boundedness::Bounded,
        )
    }

    pub fn boundedness(&self) -> Boundedness {
        self.boundedness
    }

    pub fn is_bounded(&self) -> bool {
        self.boundedness == Boundedness::Bounded
    }

    /// Apply a fallible per-element conversion, keeping boundedness.
    pub fn and_then_each<F>(self, mut f: F) -> Self
    where
        F: FnMut(Element) -> Result<Element> + Send + 'static,
    {
        let boundedness = self.boundedness;
        ElementStream::new(self.inner.map(move |item| item.and_then(&mut f)), boundedness)
    }
}

impl Stream for ElementStream {
    type Item = Result<Element>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
