//! Main bot loop: reads messages from every channel, drives the form
//! engine for the sender's session and sends the replies back.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use crate::bot::command::Submission;
use crate::bot::sessions::{SessionKey, SessionStore};
use crate::channels::{ChannelManager, IncomingMessage, OutgoingResponse};
use crate::config::BotConfig;
use crate::error::Error;
use crate::forms::{FormEngine, FormStatus};

/// Serves one form over a set of channels.
pub struct FormBot {
    engine: FormEngine,
    channels: Arc<ChannelManager>,
    sessions: Arc<SessionStore>,
    session_idle_timeout: Duration,
    prune_interval: Duration,
}

impl FormBot {
    pub fn new(engine: FormEngine, channels: ChannelManager, config: &BotConfig) -> Self {
        Self {
            engine,
            channels: Arc::new(channels),
            sessions: Arc::new(SessionStore::new()),
            session_idle_timeout: config.session_idle_timeout,
            prune_interval: config.prune_interval,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    // ── Main loop ───────────────────────────────────────────────────

    /// Run until Ctrl+C or until every channel stream ends.
    ///
    /// Messages are handled one at a time, so each session sees its input
    /// in arrival order and every reply is sent before the next message.
    pub async fn run(self) -> Result<(), Error> {
        let mut message_stream = self.channels.start_all().await?;

        let sessions = Arc::clone(&self.sessions);
        let idle_timeout = self.session_idle_timeout;
        let prune_interval = self.prune_interval;
        let pruning_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(prune_interval);
            interval.tick().await; // Skip immediate first tick
            loop {
                interval.tick().await;
                sessions.prune_idle(idle_timeout).await;
            }
        });

        tracing::info!(form = self.engine.form().name(), "Form bot ready and listening");

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            for response in self.handle_message(&message).await {
                if let Err(e) = self.channels.respond(&message, response).await {
                    tracing::error!(channel = %message.channel, "Failed to send reply: {}", e);
                }
            }
        }

        tracing::info!("Form bot shutting down...");
        pruning_handle.abort();
        self.channels.shutdown_all().await?;

        Ok(())
    }

    // ── Message dispatch ────────────────────────────────────────────

    /// Apply one message to its session and return the replies to send.
    pub async fn handle_message(&self, message: &IncomingMessage) -> Vec<OutgoingResponse> {
        let key = SessionKey::from_message(message);

        tracing::debug!(
            message_id = %message.id,
            received_at = %message.received_at,
            "Received message from {} on {} ({} chars)",
            message.user_name.as_deref().unwrap_or(&message.user_id),
            message.channel,
            message.content.len()
        );

        match Submission::parse(&message.content) {
            Submission::Start => {
                tracing::info!(session = %key, "Conversation started");
                self.sessions
                    .with_session(&key, |session| self.engine.begin(session))
                    .await
                    .replies
            }
            Submission::Cancel => {
                self.sessions
                    .with_session(&key, |session| self.engine.cancel(session))
                    .await
                    .replies
            }
            Submission::Help => vec![OutgoingResponse::text(self.engine.form().help_text())],
            Submission::UnknownCommand { name } => {
                tracing::debug!(session = %key, command = %name, "Ignoring unknown command");
                Vec::new()
            }
            Submission::Answer { content } => {
                let transition = self
                    .sessions
                    .with_session(&key, |session| self.engine.submit(session, &content))
                    .await;

                match transition.status {
                    FormStatus::Inactive => {
                        tracing::debug!(session = %key, "No conversation in progress; ignoring text");
                    }
                    FormStatus::Completed(_) => {
                        tracing::info!(session = %key, "Conversation completed");
                    }
                    _ => {}
                }
                transition.replies
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ReplyMarkup;
    use crate::forms::intake_form;

    fn bot() -> FormBot {
        let engine = FormEngine::new(intake_form().unwrap());
        FormBot::new(engine, ChannelManager::new(), &BotConfig::default())
    }

    fn msg(text: &str) -> IncomingMessage {
        IncomingMessage::new("cli", "local-user", text)
    }

    #[tokio::test]
    async fn text_without_start_is_ignored() {
        let bot = bot();
        assert!(bot.handle_message(&msg("Standard")).await.is_empty());
        assert!(bot.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn start_opens_a_session_with_menu() {
        let bot = bot();
        let replies = bot.handle_message(&msg("/start")).await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].menu().is_some());
        assert_eq!(bot.sessions().len().await, 1);
    }

    #[tokio::test]
    async fn cancel_closes_the_session() {
        let bot = bot();
        bot.handle_message(&msg("/start")).await;
        let replies = bot.handle_message(&msg("/cancel")).await;
        assert!(replies[0].content.starts_with("❌ Conversation cancelled."));
        assert_eq!(replies[0].markup, Some(ReplyMarkup::Remove));
        assert!(bot.sessions().is_empty().await);

        // Cancelling with nothing in progress still answers.
        assert_eq!(bot.handle_message(&msg("/cancel")).await.len(), 1);
    }

    #[tokio::test]
    async fn help_does_not_touch_sessions() {
        let bot = bot();
        bot.handle_message(&msg("/start")).await;
        bot.handle_message(&msg("Dynamic")).await;

        let replies = bot.handle_message(&msg("/help")).await;
        assert!(replies[0].content.contains("/start"));
        assert!(bot.handle_message(&msg("/unknown")).await.is_empty());

        let key = SessionKey::from_message(&msg(""));
        let index = bot
            .sessions()
            .with_session(&key, |s| s.index())
            .await;
        assert_eq!(index, 1);
    }

    #[tokio::test]
    async fn sessions_are_independent_per_user() {
        let bot = bot();
        let alice = |t: &str| IncomingMessage::new("cli", "alice", t);
        let bob = |t: &str| IncomingMessage::new("cli", "bob", t);

        bot.handle_message(&alice("/start")).await;
        bot.handle_message(&bob("/start")).await;
        bot.handle_message(&alice("Standard")).await;
        bot.handle_message(&alice("Full House Work")).await;
        bot.handle_message(&bob("Dynamic")).await;
        bot.handle_message(&alice("Alice Smith")).await;

        let replies = bot.handle_message(&alice("555")).await;
        assert!(replies[0].content.contains("• Service Type: Standard"));

        // Bob is still waiting on the services step.
        let replies = bot.handle_message(&bob("Cleaning the House")).await;
        assert!(replies[0].content.ends_with("Please enter your full name:"));
        assert_eq!(bot.sessions().len().await, 1);
    }
}
