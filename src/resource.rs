//!
//! This module validates and decomposes topic and subscription resource names.
//!
use crate::error::{PubSubError, Result};
use regex::Regex;
use std::sync::LazyLock;

static PROJECT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][-a-z0-9:.]{4,61}[a-z0-9]$").expect("valid project id regex")
});

static TOPIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^projects/([^/]+)/topics/(.+)$").expect("valid topic regex")
});

static SUBSCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^projects/([^/]+)/subscriptions/(.+)$").expect("valid subscription regex")
});

/// Kind of resource a full resource name points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Topic,
    Subscription,
}

impl ResourceKind {
    /// Classify a full resource name by its pattern alone. The embedded
    /// project id is not checked here.
    pub fn classify(name: &str) -> Option<Self> {
        if TOPIC_RE.is_match(name) {
            Some(ResourceKind::Topic)
        } else if SUBSCRIPTION_RE.is_match(name) {
            Some(ResourceKind::Subscription)
        } else {
            None
        }
    }

    /// Collection segment used in full resource names, e.g. `topics`.
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Topic => "topics",
            ResourceKind::Subscription => "subscriptions",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ResourceKind::Topic => "topic",
            ResourceKind::Subscription => "subscription",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            ResourceKind::Topic => &*TOPIC_RE,
            ResourceKind::Subscription => &*SUBSCRIPTION_RE,
        }
    }
}

/// Decomposed form of a full topic or subscription name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceAddress {
    pub project: String,
    pub name: String,
}

impl ResourceAddress {
    pub fn into_parts(self) -> (String, String) {
        (self.project, self.name)
    }
}

/// Parse `projects/<project>/topics/<topic>`.
///
/// # Errors
/// Returns [`PubSubError::InvalidFormat`] if the name does not follow the topic pattern, and
/// [`PubSubError::InvalidProjectId`] if the embedded project id is not a valid project id.
pub fn parse_topic(full_topic: &str) -> Result<ResourceAddress> {
    parse(ResourceKind::Topic, full_topic)
}

/// Parse `projects/<project>/subscriptions/<subscription>`, failing the same way as [`parse_topic`].
pub fn parse_subscription(full_subscription: &str) -> Result<ResourceAddress> {
    parse(ResourceKind::Subscription, full_subscription)
}

pub fn is_valid_project_id(project: &str) -> bool {
    PROJECT_ID_RE.is_match(project)
}

fn parse(kind: ResourceKind, value: &str) -> Result<ResourceAddress> {
    let captures = kind
        .pattern()
        .captures(value)
        .ok_or_else(|| PubSubError::InvalidFormat {
            kind: kind.label(),
            value: value.to_owned(),
        })?;

    let project = &captures[1];
    if !is_valid_project_id(project) {
        return Err(PubSubError::InvalidProjectId(project.to_owned()));
    }

    Ok(ResourceAddress {
        project: project.to_owned(),
        name: captures[2].to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_topic() -> Result<()> {
        let address = parse_topic("projects/my-project-1/topics/my-topic")?;
        assert_eq!(
            address.into_parts(),
            ("my-project-1".to_owned(), "my-topic".to_owned())
        );
        Ok(())
    }

    #[test]
    fn test_parse_subscription() -> Result<()> {
        let address = parse_subscription("projects/fake-project/subscriptions/sub_a")?;
        assert_eq!(address.project, "fake-project");
        assert_eq!(address.name, "sub_a");
        Ok(())
    }

    proptest! {
        #[test]
        fn test_rejoin_topic(
            project in "[a-z][-a-z0-9:.]{4,61}[a-z0-9]",
            name in "(?s).+",
        ) {
            let full = format!("projects/{}/topics/{}", project, name);
            let address = parse_topic(&full)?;
            prop_assert_eq!(format!("projects/{}/topics/{}", address.project, address.name), full);
        }

        #[test]
        fn test_rejoin_subscription(
            project in "[a-z][-a-z0-9:.]{4,61}[a-z0-9]",
            name in "(?s).+",
        ) {
            let full = format!("projects/{}/subscriptions/{}", project, name);
            let (parsed_project, parsed_name) = parse_subscription(&full)?.into_parts();
            prop_assert_eq!(parsed_project, project);
            prop_assert_eq!(parsed_name, name);
        }

        #[test]
        fn test_unprefixed_name_is_invalid_format(value in "(?s).*") {
            prop_assume!(!value.starts_with("projects/"));
            match parse_topic(&value) {
                Err(PubSubError::InvalidFormat { kind, value: reported }) => {
                    prop_assert_eq!(kind, "topic");
                    prop_assert_eq!(reported, value);
                }
                other => prop_assert!(false, "unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn test_short_project_id() {
        match parse_topic("projects/ab/topics/t") {
            Err(PubSubError::InvalidProjectId(project)) => assert_eq!(project, "ab"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_project_id_grammar() {
        assert!(is_valid_project_id("abcdef"));
        assert!(is_valid_project_id("my-project:zone.9"));
        assert!(!is_valid_project_id("abcde"));
        assert!(!is_valid_project_id("Abcdef"));
        assert!(!is_valid_project_id("9abcdef"));
        assert!(!is_valid_project_id("abcdef-"));
        assert!(!is_valid_project_id(&format!("a{}", "b".repeat(63))));
        assert!(is_valid_project_id(&format!("a{}", "b".repeat(62))));
    }

    #[test]
    fn test_invalid_format() {
        for bad in [
            "",
            "projects/my-project/topics/",
            "projects//topics/t",
            "topics/my-project/t",
            "/projects/my-project/topics/t",
            "projects/my-project/subscriptions/s",
        ] {
            match parse_topic(bad) {
                Err(PubSubError::InvalidFormat { kind, value }) => {
                    assert_eq!(kind, "topic");
                    assert_eq!(value, bad);
                }
                other => panic!("unexpected result for {:?}: {:?}", bad, other),
            }
        }
        assert!(matches!(
            parse_subscription("projects/my-project/topics/t"),
            Err(PubSubError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            ResourceKind::classify("projects/p/topics/a"),
            Some(ResourceKind::Topic)
        );
        assert_eq!(
            ResourceKind::classify("projects/p/subscriptions/a"),
            Some(ResourceKind::Subscription)
        );
        assert_eq!(ResourceKind::classify("projects/p/queues/a"), None);
    }
}
