//! Direct leaf agent.
//!
//! The simplest registry member: one LLM completion with the composed
//! system prompt, then the structured-output pass. The routing and
//! parallel strategies delegate to agents like this one.

use async_trait::async_trait;
use maestro_domain::{AgentOptions, Message};
use tracing::info;

use crate::agents::{Agent, AgentCore, AgentError};
use crate::streaming::{DEFAULT_CHUNK_SIZE, TokenStream};

pub struct DirectAgent {
    core: AgentCore,
}

impl DirectAgent {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }
}

#[async_trait]
impl Agent for DirectAgent {
    fn options(&self) -> &AgentOptions {
        self.core.options()
    }

    async fn achat(&self, query: &str, history: &[Message]) -> Result<String, AgentError> {
        self.core.callbacks().on_agent_start(self.name());
        info!(agent = self.name(), agent_id = self.id(), "direct agent run");

        let response = self
            .core
            .completion_with_retry("direct completion", query, history)
            .await?;
        let response = self.core.parse_structured_output(&response, history).await;

        self.core.callbacks().on_agent_end(self.name());
        Ok(response)
    }

    async fn astream_chat(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<TokenStream, AgentError> {
        self.core.callbacks().on_agent_start(self.name());

        let response = self
            .core
            .completion_with_retry("direct completion", query, history)
            .await?;
        let response = self.core.parse_structured_output(&response, history).await;

        Ok(TokenStream::replay(
            response,
            DEFAULT_CHUNK_SIZE,
            self.core.callbacks().clone(),
            self.core.config().chunk_delay,
            Some(self.name().to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingCallbacks, ScriptedLlm};
    use std::sync::Arc;

    #[tokio::test]
    async fn answers_through_the_gateway() {
        let llm = Arc::new(ScriptedLlm::new(vec!["the answer".to_string()]));
        let agent = DirectAgent::new(AgentCore::new(
            llm,
            AgentOptions::new("Helper", "answers questions"),
        ));

        let answer = agent.achat("what is up", &[]).await.unwrap();
        assert_eq!(answer, "the answer");
    }

    #[tokio::test]
    async fn fires_lifecycle_callbacks() {
        let callbacks = Arc::new(RecordingCallbacks::new());
        let llm = Arc::new(ScriptedLlm::new(vec!["ok".to_string()]));
        let options = AgentOptions::new("Helper", "answers questions")
            .with_callbacks(callbacks.clone());
        let agent = DirectAgent::new(AgentCore::new(llm, options));

        agent.achat("hi", &[]).await.unwrap();
        assert_eq!(callbacks.events(), ["start:Helper", "end:Helper"]);
    }

    #[tokio::test(start_paused = true)]
    async fn streaming_round_trips_the_answer() {
        let llm = Arc::new(ScriptedLlm::new(vec!["streamed answer".to_string()]));
        let agent = DirectAgent::new(AgentCore::new(
            llm,
            AgentOptions::new("Helper", "answers questions"),
        ));

        let stream = agent.astream_chat("hi", &[]).await.unwrap();
        assert_eq!(stream.collect_text().await, "streamed answer");
    }
}
