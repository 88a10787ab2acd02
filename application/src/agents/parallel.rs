//! Parallel fan-out strategy.
//!
//! Sends the query to every registered agent concurrently, waits for all
//! of them, then integrates the labeled outputs into one answer. A
//! member's failure is recorded inline under its name and never disturbs
//! its siblings.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use maestro_domain::{AgentOptions, Message, PromptTemplate};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::agents::{Agent, AgentCore, AgentError};
use crate::registry::AgentRegistry;
use crate::streaming::{DEFAULT_CHUNK_SIZE, TokenStream};

const APOLOGY: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";

pub struct ParallelAgent {
    core: AgentCore,
    registry: Arc<AgentRegistry>,
    parallel: bool,
}

impl ParallelAgent {
    pub fn new(core: AgentCore, registry: Arc<AgentRegistry>) -> Self {
        Self {
            core,
            registry,
            parallel: true,
        }
    }

    /// Disable fan-out; the agent then answers directly like a leaf.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every registry member concurrently and collect outputs by
    /// agent name. Failures become inline `Error: …` entries.
    async fn fan_out(&self, query: &str, history: &[Message]) -> HashMap<String, String> {
        let mut tasks = JoinSet::new();
        for agent in self.registry.iter() {
            let agent = agent.clone();
            let query = query.to_string();
            let history = history.to_vec();
            tasks.spawn(async move {
                let name = agent.name().to_string();
                let output = match agent.achat(&query, &history).await {
                    Ok(output) => output,
                    Err(err) => {
                        warn!(agent = %name, error = %err, "agent failed during fan-out");
                        format!("Error: {err}")
                    }
                };
                (name, output)
            });
        }

        let mut outputs = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, output)) => {
                    info!(agent = %name, "agent completed");
                    outputs.insert(name, output);
                }
                Err(err) => warn!(error = %err, "fan-out task panicked"),
            }
        }
        outputs
    }

    /// Assemble labeled output blocks in registration order, regardless
    /// of completion order.
    fn assemble_outputs(&self, outputs: &HashMap<String, String>) -> String {
        self.registry
            .iter()
            .filter_map(|agent| {
                outputs
                    .get(agent.name())
                    .map(|output| format!("--- {} Output ---\n{}", agent.name(), output))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    async fn integrate(
        &self,
        query: &str,
        outputs: &HashMap<String, String>,
        history: &[Message],
    ) -> Result<String, AgentError> {
        let prompt = PromptTemplate::integration(
            query,
            &self.assemble_outputs(outputs),
            &self.core.output_schema_text(),
        );
        let combined = self
            .core
            .completion_with_retry("integration", &prompt, history)
            .await?;
        Ok(self.core.parse_structured_output(&combined, history).await)
    }

    async fn try_run(&self, query: &str, history: &[Message]) -> Result<String, AgentError> {
        if !self.parallel || self.registry.is_empty() {
            info!("no fan-out, answering directly");
            return self.core.direct_answer(query, history).await;
        }

        info!(agents = self.registry.len(), "fanning out");
        let outputs = self.fan_out(query, history).await;
        self.core.pace().await;
        self.integrate(query, &outputs, history).await
    }

    async fn run(&self, query: &str, history: &[Message]) -> String {
        self.core.callbacks().on_agent_start(self.name());
        info!(agent = self.name(), agent_id = self.id(), "parallel run");

        let answer = match self.try_run(query, history).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "parallel run failed");
                format!("{APOLOGY} Error: {err}")
            }
        };

        self.core.callbacks().on_agent_end(self.name());
        answer
    }
}

#[async_trait]
impl Agent for ParallelAgent {
    fn options(&self) -> &AgentOptions {
        self.core.options()
    }

    async fn achat(&self, query: &str, history: &[Message]) -> Result<String, AgentError> {
        Ok(self.run(query, history).await)
    }

    async fn astream_chat(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<TokenStream, AgentError> {
        let answer = self.run(query, history).await;
        Ok(TokenStream::replay(
            answer,
            DEFAULT_CHUNK_SIZE,
            self.core.callbacks().clone(),
            self.core.config().chunk_delay,
            None,
        ))
    }
}
