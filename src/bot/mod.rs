//! Bot runtime: turns channel messages into form engine operations.

pub mod command;
pub mod form_bot;
pub mod sessions;

pub use command::Submission;
pub use form_bot::FormBot;
pub use sessions::{SessionKey, SessionStore};
