use crate::error::{PubSubError, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// A single Pub/Sub message.
///
/// For the payload to be valid, at least one of `data` or `attributes` must be set. Messages are immutable
/// once built and may be used as deduplication keys: equality and hashing cover both fields.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Message {
    /// Message body. Present-but-empty is distinct from absent.
    data: Option<Bytes>,

    /// User defined attributes in form of key-value pairs, together with service generated ones such as the
    /// dedup id and timestamp attributes.
    attributes: BTreeMap<String, String>,
}

impl Message {
    /// # Errors
    /// Returns [`PubSubError::EmptyMessage`] if `data` is absent and `attributes` is empty.
    pub fn new(data: Option<Bytes>, attributes: BTreeMap<String, String>) -> Result<Self> {
        if data.is_none() && attributes.is_empty() {
            return Err(PubSubError::EmptyMessage);
        }
        Ok(Message { data, attributes })
    }

    /// Message carrying a body and no attributes.
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Message {
            data: Some(data.into()),
            attributes: BTreeMap::new(),
        }
    }

    pub fn data(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn into_parts(self) -> (Option<Bytes>, BTreeMap<String, String>) {
        (self.data, self.attributes)
    }

    /// Event time carried in `attribute`.
    ///
    /// Values are either milliseconds since the Unix epoch or an RFC 3339 timestamp. Digits finer than
    /// milliseconds are dropped. Returns `Ok(None)` if the attribute is not set.
    ///
    /// # Errors
    /// Returns [`PubSubError::InvalidTimestamp`] if the value is in neither format.
    pub fn event_time(&self, attribute: &str) -> Result<Option<DateTime<Utc>>> {
        let value = match self.attribute(attribute) {
            Some(value) => value,
            None => return Ok(None),
        };

        let invalid = || PubSubError::InvalidTimestamp {
            attribute: attribute.to_owned(),
            value: value.to_owned(),
        };

        let millis = match value.parse::<i64>() {
            Ok(millis) => millis,
            Err(_) => DateTime::parse_from_rfc3339(value)
                .map_err(|_e| invalid())?
                .timestamp_millis(),
        };
        DateTime::from_timestamp_millis(millis)
            .map(Some)
            .ok_or_else(invalid)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message({:?}, {:?})", self.data, self.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;
    use std::hash::{Hash, Hasher};

    fn attributes(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_new_requires_data_or_attributes() {
        assert!(matches!(
            Message::new(None, BTreeMap::new()),
            Err(PubSubError::EmptyMessage)
        ));
        assert!(Message::new(Some(Bytes::new()), BTreeMap::new()).is_ok());
        assert!(Message::new(None, attributes(&[("k", "v")])).is_ok());
    }

    #[test]
    fn test_equality() -> Result<()> {
        let a = Message::new(Some(Bytes::from("abc")), attributes(&[("k", "v")]))?;
        let b = Message::new(Some(Bytes::from("abc")), attributes(&[("k", "v")]))?;
        let c = Message::new(Some(Bytes::from("abc")), attributes(&[("k", "w")]))?;
        let d = Message::new(None, attributes(&[("k", "v")]))?;
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_ne!(
            Message::from_data(""),
            Message::new(None, attributes(&[("", "")]))?
        );
        Ok(())
    }

    #[test]
    fn test_accessors() -> Result<()> {
        let message = Message::new(Some(Bytes::from("abc")), attributes(&[("id", "42")]))?;
        assert_eq!(message.attribute("id"), Some("42"));
        assert_eq!(message.attribute("missing"), None);

        let (data, attrs) = message.into_parts();
        assert_eq!(data, Some(Bytes::from("abc")));
        assert_eq!(attrs, attributes(&[("id", "42")]));
        Ok(())
    }

    #[test]
    fn test_hash_as_dedup_key() -> Result<()> {
        let hash = |m: &Message| {
            let mut hasher = DefaultHasher::new();
            m.hash(&mut hasher);
            hasher.finish()
        };
        let a = Message::new(Some(Bytes::from("x")), attributes(&[("a", "1"), ("b", "2")]))?;
        let b = Message::new(Some(Bytes::from("x")), attributes(&[("b", "2"), ("a", "1")]))?;
        assert_eq!(hash(&a), hash(&b));

        let seen: HashSet<Message> = [a, b, Message::from_data("y")].into_iter().collect();
        assert_eq!(seen.len(), 2);
        Ok(())
    }

    #[test]
    fn test_event_time() -> Result<()> {
        let message = Message::new(
            None,
            attributes(&[
                ("millis", "1446162101123"),
                ("rfc", "2015-10-29T23:41:41.123456Z"),
                ("bad", "yesterday"),
            ]),
        )?;
        let expected = DateTime::from_timestamp_millis(1446162101123);
        assert_eq!(message.event_time("millis")?, expected);
        assert_eq!(message.event_time("rfc")?, expected);
        assert_eq!(message.event_time("missing")?, None);
        match message.event_time("bad") {
            Err(PubSubError::InvalidTimestamp { attribute, value }) => {
                assert_eq!(attribute, "bad");
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        Ok(())
    }
}
