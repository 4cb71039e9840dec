//! Outbound messages and the sinks that deliver them.
//!
//! The broker transport is not part of this crate; anything able to deliver
//! a [`PublishMessage`] plugs in through [`MessageSink`].

mod sink;
mod types;

pub use sink::{ChannelSink, LoggingSink, MessageSink};
pub use types::{PublishError, PublishMessage, PublishResult, MAX_QOS};

pub(crate) use types::validate_target;
