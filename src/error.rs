use thiserror::Error;

#[derive(Error, Debug)]
pub enum PubSubError {
    #[error("PubSub {kind} must be in the form \"projects/<project>/{kind}s/<{kind}>\" (got `{value}`)")]
    InvalidFormat { kind: &'static str, value: String },

    #[error("Invalid PubSub project name `{0}`")]
    InvalidProjectId(String),

    #[error("Either a topic or subscription must be provided")]
    MissingAddress,

    #[error("Only one of topic (`{topic}`) or subscription (`{subscription}`) should be provided")]
    ConflictingAddress { topic: String, subscription: String },

    #[error("Either data or attributes must be set")]
    EmptyMessage,

    #[error("Malformed PubSub payload: {0}")]
    MalformedPayload(String),

    #[error("Unexpected element. Type: {actual} (expected: {expected}), value: {value}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
        value: String,
    },

    #[error("PubSub source must be in the form \"projects/<project>/topics/<topic>\" or \"projects/<project>/subscriptions/<subscription>\" (got `{0}`)")]
    InvalidSource(String),

    #[error("Length of `{parameter}` ({actual}) is not the same as length of sources ({expected})")]
    ParameterCountMismatch {
        parameter: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Topics and subscriptions should be in the source list. Found {key} `{value}`")]
    AmbiguousConfiguration { key: String, value: String },

    #[error("Unknown parameter `{0}`")]
    UnknownParameter(String),

    #[error("No transform registered for URN `{0}`")]
    UnknownUrn(String),

    #[error("Invalid portable payload for `{urn}`: {reason}")]
    InvalidPayload { urn: String, reason: String },

    #[error("Invalid timestamp in attribute `{attribute}`: `{value}`")]
    InvalidTimestamp { attribute: String, value: String },

    #[error("Broker binding failure: {0}")]
    Binding(String),
}

pub type Result<T> = std::result::Result<T, PubSubError>;
