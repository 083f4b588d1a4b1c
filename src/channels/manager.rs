//! ChannelManager: owns every active channel, merges their message
//! streams and routes replies back to the channel a message came from.

use futures::stream;

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use crate::error::ChannelError;

#[derive(Default)]
pub struct ChannelManager {
    channels: Vec<Box<dyn Channel>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel. Replies go to the first channel registered
    /// under a given name.
    pub fn add(&mut self, channel: Box<dyn Channel>) {
        tracing::debug!(channel = channel.name(), "Channel registered");
        self.channels.push(channel);
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    fn get(&self, name: &str) -> Option<&dyn Channel> {
        self.channels
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    /// Start every channel and merge their streams into one.
    pub async fn start_all(&self) -> Result<MessageStream, ChannelError> {
        let mut streams = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let stream = channel.start().await?;
            tracing::info!(channel = channel.name(), "Channel started");
            streams.push(stream);
        }
        Ok(Box::pin(stream::select_all(streams)))
    }

    /// Send a response on the channel the message arrived on.
    pub async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let channel = self
            .get(&msg.channel)
            .ok_or_else(|| ChannelError::UnknownChannel(msg.channel.clone()))?;
        channel.respond(msg, response).await
    }

    /// Run every channel's health check, returning failures by name.
    pub async fn health_check_all(&self) -> Vec<(String, ChannelError)> {
        let mut failures = Vec::new();
        for channel in &self.channels {
            if let Err(e) = channel.health_check().await {
                failures.push((channel.name().to_string(), e));
            }
        }
        failures
    }

    pub async fn shutdown_all(&self) -> Result<(), ChannelError> {
        for channel in &self.channels {
            if let Err(e) = channel.shutdown().await {
                tracing::warn!(channel = channel.name(), "Channel shutdown failed: {}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use futures::StreamExt;

    use super::*;

    struct FixedChannel {
        name: &'static str,
        inbox: Vec<&'static str>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Channel for FixedChannel {
        fn name(&self) -> &str {
            self.name
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            let messages: Vec<IncomingMessage> = self
                .inbox
                .iter()
                .map(|text| IncomingMessage::new(self.name, "u1", text))
                .collect();
            Ok(Box::pin(stream::iter(messages)))
        }

        async fn respond(
            &self,
            _msg: &IncomingMessage,
            response: OutgoingResponse,
        ) -> Result<(), ChannelError> {
            self.sent
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, response.content));
            Ok(())
        }

        async fn health_check(&self) -> Result<(), ChannelError> {
            Err(ChannelError::HealthCheckFailed {
                name: self.name.to_string(),
            })
        }

        async fn shutdown(&self) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    fn manager(sent: &Arc<Mutex<Vec<String>>>) -> ChannelManager {
        let mut manager = ChannelManager::new();
        manager.add(Box::new(FixedChannel {
            name: "a",
            inbox: vec!["one", "two"],
            sent: Arc::clone(sent),
        }));
        manager.add(Box::new(FixedChannel {
            name: "b",
            inbox: vec!["three"],
            sent: Arc::clone(sent),
        }));
        manager
    }

    #[tokio::test]
    async fn start_all_merges_streams() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let manager = manager(&sent);
        let stream = manager.start_all().await.unwrap();
        let mut contents: Vec<String> = stream.map(|m| m.content).collect().await;
        contents.sort();
        assert_eq!(contents, ["one", "three", "two"]);
    }

    #[tokio::test]
    async fn respond_routes_by_channel_name() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let manager = manager(&sent);

        let msg = IncomingMessage::new("b", "u1", "hi");
        manager
            .respond(&msg, OutgoingResponse::text("hello"))
            .await
            .unwrap();
        assert_eq!(*sent.lock().unwrap(), ["b:hello"]);
    }

    #[tokio::test]
    async fn respond_to_unknown_channel_fails() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let manager = manager(&sent);

        let msg = IncomingMessage::new("email", "u1", "hi");
        let err = manager
            .respond(&msg, OutgoingResponse::text("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::UnknownChannel(ref name) if name == "email"));
    }

    #[tokio::test]
    async fn health_check_all_collects_failures() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let manager = manager(&sent);
        let failures = manager.health_check_all().await;
        let names: Vec<&str> = failures.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(manager.names(), ["a", "b"]);
    }
}
