//! Agent registry.
//!
//! An insertion-ordered map from agent id to `Arc<dyn Agent>`. Mutation
//! goes through `&mut self`, so a registry shared behind `Arc` for an
//! in-flight routing or fan-out run cannot be modified concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::agents::Agent;

#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
    order: Vec<String>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under its id. Re-registering an id replaces the
    /// previous agent and keeps its position in the iteration order.
    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        let id = agent.id().to_string();
        if self.agents.insert(id.clone(), agent).is_some() {
            warn!(agent_id = %id, "replacing previously registered agent");
        } else {
            info!(agent_id = %id, "registered agent");
            self.order.push(id);
        }
    }

    pub fn unregister(&mut self, id: &str) -> Option<Arc<dyn Agent>> {
        let removed = self.agents.remove(id);
        if removed.is_some() {
            self.order.retain(|existing| existing != id);
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Agent>> {
        self.agents.get(id)
    }

    /// The first-registered agent, the fallback target when
    /// classification cannot name a member.
    pub fn first(&self) -> Option<&Arc<dyn Agent>> {
        self.order.first().and_then(|id| self.agents.get(id))
    }

    /// Agents in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Agent>> {
        self.order.iter().filter_map(|id| self.agents.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// One line per member for the classifier prompt:
    /// `- {name} (ID: {id}): {description}`.
    pub fn descriptions(&self) -> String {
        self.iter()
            .map(|agent| {
                format!(
                    "- {} (ID: {}): {}",
                    agent.name(),
                    agent.id(),
                    agent.description()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
