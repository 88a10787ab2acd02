//! Agent identity and lifecycle types.
//!
//! [`AgentOptions`] describes who an agent is; [`AgentCallbacks`] is the
//! lifecycle sink invoked around every top-level orchestration call.

pub mod callbacks;
pub mod options;

pub use callbacks::{AgentCallbacks, NoCallbacks};
pub use options::{AgentOptions, derive_id_from_name};
