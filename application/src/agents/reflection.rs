//! Self-critique reflection strategy.
//!
//! Alternates two conversations over the same gateway: a generator that
//! drafts (and redrafts) the answer, and a critic that reviews each
//! draft. The critic approves with a literal `<OK>`; otherwise its
//! critique is fed back to the generator as the next prompt. A critique
//! can also name registered tools, whose results are appended to the
//! feedback before the next draft.

use async_trait::async_trait;
use maestro_domain::{AgentOptions, Message, PromptTemplate};
use tracing::{info, warn};

use crate::agents::{Agent, AgentCore, AgentError};
use crate::retry::retry_transient;
use crate::streaming::{DEFAULT_CHUNK_SIZE, TokenStream};

/// Critic output that ends the loop.
const APPROVAL: &str = "<OK>";
/// Generate/critique rounds before the last draft is returned as-is.
const MAX_ITERATIONS: usize = 3;
/// Tool invocations allowed across all critique rounds.
const MAX_TOOL_STEPS: usize = 2;

pub struct ReflectionAgent {
    core: AgentCore,
    max_iterations: usize,
    max_tool_steps: usize,
}

impl ReflectionAgent {
    pub fn new(core: AgentCore) -> Self {
        Self {
            core,
            max_iterations: MAX_ITERATIONS,
            max_tool_steps: MAX_TOOL_STEPS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_tool_steps(mut self, max_tool_steps: usize) -> Self {
        self.max_tool_steps = max_tool_steps;
        self
    }

    /// The generator's system turn: the agent's own system prompt, when
    /// set, composed with the base generation instructions.
    fn generation_system(&self) -> String {
        let base = PromptTemplate::reflection_generation_system();
        match self.core.system_prompt() {
            Some(prompt) => format!("{prompt}\n{base}"),
            None => base.to_string(),
        }
    }

    /// Tools the critique names, paired with the task description that
    /// follows `<name> to …` when present.
    fn extract_tool_recommendations(&self, critique: &str) -> Vec<(String, String)> {
        let lowered = critique.to_ascii_lowercase();
        self.core
            .tool_names()
            .into_iter()
            .filter_map(|name| {
                let position = lowered.find(&name.to_ascii_lowercase())?;
                let rest = &critique[position + name.len()..];
                let line = &rest[..rest.find('\n').unwrap_or(rest.len())];
                let description = line
                    .strip_prefix(" to ")
                    .map(|task| task.trim().trim_end_matches('.').to_string())
                    .filter(|task| !task.is_empty())
                    .unwrap_or_else(|| "Improve the content".to_string());
                Some((name, description))
            })
            .collect()
    }

    /// Run recommended tools and append their outcomes to the critique
    /// so the generator sees them. Failures never abort the loop.
    async fn apply_tool_recommendations(&self, critique: &mut String, tool_steps: &mut usize) {
        for (tool, description) in self.extract_tool_recommendations(critique) {
            if *tool_steps >= self.max_tool_steps {
                break;
            }
            match self.core.execute_tool(&description, &tool, false).await {
                Ok(Some(result)) => {
                    critique.push_str(&format!("\nTool {tool} result: {result}"));
                    *tool_steps += 1;
                }
                Ok(None) | Err(_) => {
                    critique.push_str(&format!("\nTool {tool} execution failed"));
                }
            }
        }
    }

    async fn run(&self, query: &str, history: &[Message]) -> Result<String, AgentError> {
        self.core.callbacks().on_agent_start(self.name());
        info!(agent = self.name(), agent_id = self.id(), "reflection run");

        let mut generation_history = history.to_vec();
        generation_history.push(Message::system(self.generation_system()));
        let mut reflection_history = history.to_vec();
        reflection_history.push(Message::system(
            PromptTemplate::reflection_critique_system(),
        ));

        let mut prompt = query.to_string();
        let mut generation = String::new();
        let mut tool_steps = 0;

        for iteration in 0..self.max_iterations {
            generation = retry_transient("generation", || {
                self.core.completion_raw(&prompt, &generation_history)
            })
            .await?;
            generation_history.push(Message::user(prompt.clone()));
            generation_history.push(Message::assistant(generation.clone()));

            let critique_query = if self.core.has_tools() {
                format!(
                    "{generation}\n\nAvailable tools:\n{}",
                    self.core.format_tool_signatures()
                )
            } else {
                generation.clone()
            };
            let mut critique = match self
                .core
                .completion_raw(&critique_query, &reflection_history)
                .await
            {
                Ok(critique) => critique,
                Err(err) => {
                    warn!(error = %err, "critique failed, keeping current draft");
                    break;
                }
            };
            if critique.contains(APPROVAL) {
                info!(iteration, "critic approved the draft");
                break;
            }

            self.apply_tool_recommendations(&mut critique, &mut tool_steps)
                .await;

            reflection_history.push(Message::user(critique_query));
            reflection_history.push(Message::assistant(critique.clone()));
            prompt = critique;
            self.core.pace().await;
        }

        let answer = self
            .core
            .parse_structured_output(&generation, history)
            .await;
        self.core.callbacks().on_agent_end(self.name());
        Ok(answer)
    }
}

#[async_trait]
impl Agent for ReflectionAgent {
    fn options(&self) -> &AgentOptions {
        self.core.options()
    }

    async fn achat(&self, query: &str, history: &[Message]) -> Result<String, AgentError> {
        self.run(query, history).await
    }

    async fn astream_chat(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<TokenStream, AgentError> {
        let answer = self.run(query, history).await?;
        Ok(TokenStream::replay(
            answer,
            DEFAULT_CHUNK_SIZE,
            self.core.callbacks().clone(),
            self.core.config().chunk_delay,
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedLlm, StubTool};
    use serde_json::json;
    use std::sync::Arc;

    fn options() -> AgentOptions {
        AgentOptions::new("Editor", "drafts and refines content")
    }

    #[tokio::test]
    async fn approved_first_draft_is_returned() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            "the first draft".to_string(),
            "<OK>".to_string(),
        ]));
        let agent = ReflectionAgent::new(AgentCore::new(llm.clone(), options()));

        let answer = agent.achat("write a haiku", &[]).await.unwrap();
        assert_eq!(answer, "the first draft");
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn critique_drives_a_revision() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            "draft one".to_string(),
            "too vague, add numbers".to_string(),
            "draft two with numbers".to_string(),
            "<OK>".to_string(),
        ]));
        let agent = ReflectionAgent::new(AgentCore::new(llm.clone(), options()));

        let answer = agent.achat("write a report", &[]).await.unwrap();
        assert_eq!(answer, "draft two with numbers");
        // The second generation was prompted with the critique.
        assert_eq!(llm.prompts()[2], "too vague, add numbers");
    }

    #[tokio::test]
    async fn loop_stops_at_max_iterations() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            "draft one".to_string(),
            "never happy".to_string(),
            "draft two".to_string(),
            "still never happy".to_string(),
        ]));
        let agent =
            ReflectionAgent::new(AgentCore::new(llm.clone(), options())).with_max_iterations(2);

        let answer = agent.achat("write", &[]).await.unwrap();
        assert_eq!(answer, "draft two");
        assert_eq!(llm.calls(), 4);
    }

    #[tokio::test]
    async fn critic_failure_keeps_the_draft() {
        let llm = Arc::new(ScriptedLlm::from_script(vec![
            Ok("the only draft".to_string()),
            Err("critic offline".to_string()),
        ]));
        let agent = ReflectionAgent::new(AgentCore::new(llm, options()));

        let answer = agent.achat("write", &[]).await.unwrap();
        assert_eq!(answer, "the only draft");
    }

    #[tokio::test]
    async fn critique_naming_a_tool_runs_it() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            "draft one".to_string(),
            "Use kb_search to verify the claim.".to_string(),
            r#"{"arguments": {"query": "the claim"}}"#.to_string(),
            "draft two, verified".to_string(),
            "<OK>".to_string(),
        ]));
        let tool = Arc::new(StubTool::returning(
            "kb_search",
            "Search the knowledge base",
            json!("claim confirmed"),
        ));
        let mut core = AgentCore::new(llm.clone(), options());
        core.register_tool(tool.clone());
        let agent = ReflectionAgent::new(core);

        let answer = agent.achat("write", &[]).await.unwrap();
        assert_eq!(answer, "draft two, verified");
        assert_eq!(tool.invocations().len(), 1);
        // The revision prompt carries the tool result.
        assert!(llm.prompts()[3].contains("Tool kb_search result: claim confirmed"));
    }

    #[tokio::test]
    async fn tool_recommendations_are_capped() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            "draft one".to_string(),
            "Use kb_search to verify the claim.".to_string(),
            r#"{"arguments": {}}"#.to_string(),
            "draft two".to_string(),
            "Use kb_search to verify again.".to_string(),
            "draft three".to_string(),
            "<OK>".to_string(),
        ]));
        let tool = Arc::new(StubTool::returning("kb_search", "search", json!("hit")));
        let mut core = AgentCore::new(llm, options());
        core.register_tool(tool.clone());
        let agent = ReflectionAgent::new(core).with_max_tool_steps(1);

        let answer = agent.achat("write", &[]).await.unwrap();
        assert_eq!(answer, "draft three");
        assert_eq!(tool.invocations().len(), 1);
    }

    #[test]
    fn recommendation_extraction_reads_the_task() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let mut core = AgentCore::new(llm, options());
        core.register_tool(Arc::new(StubTool::returning("kb_search", "search", json!(null))));
        let agent = ReflectionAgent::new(core);

        let recs =
            agent.extract_tool_recommendations("Please use kb_search to verify the total.\nThen rewrite.");
        assert_eq!(
            recs,
            vec![("kb_search".to_string(), "verify the total".to_string())]
        );

        let recs = agent.extract_tool_recommendations("kb_search might help here");
        assert_eq!(
            recs,
            vec![("kb_search".to_string(), "Improve the content".to_string())]
        );

        assert!(agent.extract_tool_recommendations("no tools needed").is_empty());
    }
}
