//! Prompt templates for the orchestration strategies.

pub mod template;

pub use template::PromptTemplate;
