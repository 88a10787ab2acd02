//! Lifecycle callback sink.
//!
//! Implementations live outside the orchestration core (UI layers, metrics
//! collectors, test recorders). All hooks are fire-and-forget: no return
//! value is consumed and a panicking implementation is a caller bug.

/// Hooks invoked around every top-level orchestration call.
///
/// Every method has a no-op default, so implementers override only what
/// they care about.
pub trait AgentCallbacks: Send + Sync {
    /// Called for each chunk emitted by a streaming entry point.
    fn on_new_token(&self, _token: &str) {}

    /// Called when an orchestration run begins.
    fn on_agent_start(&self, _agent_name: &str) {}

    /// Called when an orchestration run ends, including on failure.
    fn on_agent_end(&self, _agent_name: &str) {}
}

/// No-op callback sink for when lifecycle notifications are not needed.
pub struct NoCallbacks;

impl AgentCallbacks for NoCallbacks {}
