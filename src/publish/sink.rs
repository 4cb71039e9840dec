//! Message sink implementations

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{PublishError, PublishMessage, PublishResult};

/// Destination for rendered messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Deliver one message.
    ///
    /// An error tells the caller to stop producing messages for this sink.
    async fn publish(&self, message: &PublishMessage) -> PublishResult<()>;
}

/// Sink that only records messages through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

#[async_trait]
impl MessageSink for LoggingSink {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn publish(&self, message: &PublishMessage) -> PublishResult<()> {
        tracing::info!(
            topic = %message.topic,
            qos = message.qos,
            retain = message.retain,
            payload = %message.message,
            "Message published"
        );
        Ok(())
    }
}

/// Sink forwarding messages into a bounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<PublishMessage>,
}

impl ChannelSink {
    /// Create a sink and the receiver draining it
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PublishMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MessageSink for ChannelSink {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn publish(&self, message: &PublishMessage) -> PublishResult<()> {
        self.tx
            .send(message.clone())
            .await
            .map_err(|e| PublishError::SinkClosed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_sink_accepts() {
        let sink = LoggingSink;
        let msg = PublishMessage::new("t", "payload", 0, false);
        assert!(sink.publish(&msg).await.is_ok());
    }

    #[tokio::test]
    async fn test_channel_sink_forwards() {
        let (sink, mut rx) = ChannelSink::new(4);
        let msg = PublishMessage::new("t", "payload", 1, true);
        sink.publish(&msg).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received, msg);
    }

    #[tokio::test]
    async fn test_channel_sink_fails_when_receiver_dropped() {
        let (sink, rx) = ChannelSink::new(4);
        drop(rx);

        let msg = PublishMessage::new("t", "payload", 0, false);
        assert!(matches!(
            sink.publish(&msg).await,
            Err(PublishError::SinkClosed(_))
        ));
    }
}
