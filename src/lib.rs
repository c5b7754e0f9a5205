//! This crate provides transforms to read messages from and write messages to [Cloud Pub/Sub](https://cloud.google.com/pubsub)
//! in streaming pipelines. Connections to the service are owned by a runtime specific binding, see [`binding`].
pub mod binding;
pub mod codec;
pub mod config;
pub mod element;
pub mod error;
pub mod fanout;
pub mod message;
pub mod portable;
pub mod read;
pub mod resource;
pub mod strings;
pub mod testing;
pub mod write;

pub use element::{Element, ElementStream};
pub use error::{PubSubError, Result};
pub use fanout::{MultiSourceFanOut, PerSourceParam};
pub use message::Message;
pub use read::ReadTransform;
pub use write::WriteTransform;
