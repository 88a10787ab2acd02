//! Application-level configuration.
//!
//! Controls the pacing behavior of orchestration runs: the artificial
//! delays between visible phases and between streamed chunks. These
//! delays pace progress display for human consumers; none of them is
//! required for correctness.

use std::time::Duration;

/// Pacing configuration shared by every agent.
#[derive(Debug, Clone)]
pub struct BehaviorConfig {
    /// Delay inserted between orchestration phases (classification,
    /// delegation, validation, plan steps). `None` disables pacing.
    pub phase_delay: Option<Duration>,
    /// Delay between streamed chunks.
    pub chunk_delay: Duration,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            phase_delay: None,
            chunk_delay: Duration::from_millis(10),
        }
    }
}

impl BehaviorConfig {
    /// Enable inter-phase pacing with the given delay.
    pub fn with_phase_delay(mut self, delay: Duration) -> Self {
        self.phase_delay = Some(delay);
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacing_disabled_by_default() {
        let config = BehaviorConfig::default();
        assert!(config.phase_delay.is_none());
        assert_eq!(config.chunk_delay, Duration::from_millis(10));
    }
}
