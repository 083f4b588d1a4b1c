//! Agency Forms: linear chat-bot forms for a household-staff agency.

pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod forms;
