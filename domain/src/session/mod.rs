//! Conversation session types shared across agents.

pub mod entities;

pub use entities::{Message, Role};
