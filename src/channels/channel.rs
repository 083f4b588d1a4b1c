//! Core channel types shared by every transport.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChannelError;

/// Stream of messages produced by a started channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A message received from a user on some channel.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Name of the channel that produced the message.
    pub channel: String,
    /// Stable identifier of the sender within the channel.
    pub user_id: String,
    /// Display name, if the transport provides one.
    pub user_name: Option<String>,
    pub content: String,
    pub received_at: DateTime<Utc>,
    /// Transport-specific routing data (e.g. Telegram `chat_id`).
    pub metadata: serde_json::Value,
}

impl IncomingMessage {
    pub fn new(channel: &str, user_id: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            user_name: None,
            content: content.to_string(),
            received_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_user_name(mut self, name: &str) -> Self {
        self.user_name = Some(name.to_string());
        self
    }

    /// Chat identifier carried in metadata, if any.
    pub fn chat_id(&self) -> Option<&str> {
        self.metadata.get("chat_id").and_then(|v| v.as_str())
    }
}

/// A fixed set of tappable options, laid out in rows.
///
/// Shown as a one-time keyboard: it collapses after one selection and only
/// offers the listed options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMenu {
    pub rows: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl ChoiceMenu {
    pub fn new<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
            placeholder: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    /// All options in display order.
    pub fn options(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(String::as_str)
    }

    /// Exact, case-sensitive membership test.
    pub fn contains(&self, input: &str) -> bool {
        self.options().any(|option| option == input)
    }

    pub fn is_empty(&self) -> bool {
        self.options().next().is_none()
    }
}

/// Keyboard change attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMarkup {
    /// Present a fixed-choice menu.
    Menu(ChoiceMenu),
    /// Collapse any menu currently shown.
    Remove,
}

/// A response to send back through a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub content: String,
    pub markup: Option<ReplyMarkup>,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            markup: None,
        }
    }

    pub fn with_menu(mut self, menu: ChoiceMenu) -> Self {
        self.markup = Some(ReplyMarkup::Menu(menu));
        self
    }

    pub fn with_keyboard_removed(mut self) -> Self {
        self.markup = Some(ReplyMarkup::Remove);
        self
    }

    pub fn menu(&self) -> Option<&ChoiceMenu> {
        match &self.markup {
            Some(ReplyMarkup::Menu(menu)) => Some(menu),
            _ => None,
        }
    }
}

/// A message transport: produces incoming messages and delivers replies.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Unique channel name, used to route replies.
    fn name(&self) -> &str;

    /// Start listening and return the stream of incoming messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Deliver a response to the sender of `msg`.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_matches_exactly() {
        let menu = ChoiceMenu::new([["Standard", "Dynamic"]]);
        assert!(menu.contains("Standard"));
        assert!(!menu.contains("standard"));
        assert!(!menu.contains("Standard "));
        assert!(!menu.contains("Stand"));
    }

    #[test]
    fn menu_options_keep_row_order() {
        let menu = ChoiceMenu::new(vec![vec!["Cleaning", "Cooking"], vec!["Laundry"]]);
        let options: Vec<&str> = menu.options().collect();
        assert_eq!(options, ["Cleaning", "Cooking", "Laundry"]);
        assert!(!menu.is_empty());
        assert!(ChoiceMenu::new(Vec::<Vec<String>>::new()).is_empty());
    }

    #[test]
    fn outgoing_response_markup() {
        let menu = ChoiceMenu::new([["A", "B"]]);
        let resp = OutgoingResponse::text("pick").with_menu(menu.clone());
        assert_eq!(resp.menu(), Some(&menu));

        let resp = OutgoingResponse::text("done").with_keyboard_removed();
        assert_eq!(resp.markup, Some(ReplyMarkup::Remove));
        assert!(resp.menu().is_none());
    }

    #[test]
    fn chat_id_from_metadata() {
        let msg = IncomingMessage::new("telegram", "user123", "hello")
            .with_metadata(serde_json::json!({"chat_id": "99887766"}));
        assert_eq!(msg.chat_id(), Some("99887766"));

        let msg = IncomingMessage::new("telegram", "user123", "hello");
        assert_eq!(msg.chat_id(), None);
    }
}
