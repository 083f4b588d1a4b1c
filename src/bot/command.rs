//! Parses incoming message text into bot commands or form answers.

/// What an incoming message asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// `/start`: begin the form from the first step.
    Start,
    /// `/cancel`: abandon the current form.
    Cancel,
    /// `/help`: show the form's help text.
    Help,
    /// Any other `/command`; ignored.
    UnknownCommand { name: String },
    /// Plain text, an answer to the current step.
    Answer { content: String },
}

impl Submission {
    /// Parse message content.
    ///
    /// Command names are case-insensitive and may carry a Telegram
    /// `@BotName` suffix. Answers keep their content untouched; trimming is
    /// the step validator's business.
    pub fn parse(content: &str) -> Self {
        let trimmed = content.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Self::Answer {
                content: content.to_string(),
            };
        };

        let word = rest.split_whitespace().next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default().to_lowercase();

        match name.as_str() {
            "start" => Self::Start,
            "cancel" => Self::Cancel,
            "help" => Self::Help,
            _ => Self::UnknownCommand { name },
        }
    }
}
