//! Publish message types and error definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest MQTT quality-of-service level
pub const MAX_QOS: u8 = 2;

/// Publish-specific error type
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Topic must not be empty")]
    EmptyTopic,

    #[error("Invalid QoS level: {0} (expected 0-2)")]
    InvalidQos(u8),

    #[error("Sink closed: {0}")]
    SinkClosed(String),
}

/// Result type for publish operations
pub type PublishResult<T> = Result<T, PublishError>;

/// A rendered message ready to hand to a broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishMessage {
    /// Destination topic
    pub topic: String,

    /// Rendered payload
    pub message: String,

    /// Quality-of-service level (0-2)
    #[serde(default)]
    pub qos: u8,

    /// Whether the broker should retain the message
    #[serde(default)]
    pub retain: bool,

    /// When the message was rendered
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl PublishMessage {
    /// Create a message stamped with the current time
    pub fn new(
        topic: impl Into<String>,
        message: impl Into<String>,
        qos: u8,
        retain: bool,
    ) -> Self {
        Self {
            topic: topic.into(),
            message: message.into(),
            qos,
            retain,
            timestamp: Utc::now(),
        }
    }

    /// Validate topic and QoS
    pub fn validate(&self) -> PublishResult<()> {
        validate_target(&self.topic, self.qos)
    }
}

/// Validate a topic/QoS pair before any message is produced
pub(crate) fn validate_target(topic: &str, qos: u8) -> PublishResult<()> {
    if topic.trim().is_empty() {
        return Err(PublishError::EmptyTopic);
    }
    if qos > MAX_QOS {
        return Err(PublishError::InvalidQos(qos));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(PublishMessage::new("sensors/1", "{}", 1, false)
            .validate()
            .is_ok());
        assert!(matches!(
            PublishMessage::new("  ", "{}", 0, false).validate(),
            Err(PublishError::EmptyTopic)
        ));
        assert!(matches!(
            PublishMessage::new("t", "{}", 3, false).validate(),
            Err(PublishError::InvalidQos(3))
        ));
    }

    #[test]
    fn test_deserialize_defaults() {
        let msg: PublishMessage =
            serde_json::from_str(r#"{"topic": "t", "message": "m"}"#).unwrap();
        assert_eq!(msg.qos, 0);
        assert!(!msg.retain);
    }
}
