//! Sequential planning strategy.
//!
//! Generates an execution plan from the task, runs its steps in order
//! (tool steps through argument synthesis, non-tool steps through the
//! LLM), then summarizes the collected results into the final answer.
//! Unlike the routing and parallel strategies, a planning failure
//! propagates to the caller instead of degrading to an apology.

use async_trait::async_trait;
use maestro_domain::{
    AgentOptions, ExecutionPlan, Message, PlanContext, PromptTemplate, parse_plan,
};
use tracing::{info, warn};

use crate::agents::{Agent, AgentCore, AgentError};
use crate::retry::retry_transient;
use crate::streaming::{DEFAULT_CHUNK_SIZE, DETAILED_CHUNK_SIZE, TokenStream};

/// Hard cap on executed steps, matching the planner prompt's bias toward
/// short plans. Steps beyond the cap are skipped, not an error.
const MAX_STEPS: usize = 3;

#[derive(Clone)]
pub struct PlanningAgent {
    core: AgentCore,
    max_steps: usize,
    detailed_stream: bool,
}

impl PlanningAgent {
    pub fn new(core: AgentCore) -> Self {
        Self {
            core,
            max_steps: MAX_STEPS,
            detailed_stream: false,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Stream a phase-by-phase trace instead of just the final answer.
    pub fn with_detailed_stream(mut self, detailed: bool) -> Self {
        self.detailed_stream = detailed;
        self
    }

    /// Ask the planner LLM for a step list, dropping steps that cite
    /// unregistered tools.
    async fn generate_plan(&self, task: &str) -> Result<ExecutionPlan, AgentError> {
        let prompt = PromptTemplate::initial_plan(task, &self.core.format_tool_signatures());
        let known_tools = self.core.tool_names();

        retry_transient("plan generation", || async {
            let response = self.core.completion(&prompt, &[]).await?;
            parse_plan(&response, &known_tools).ok_or_else(|| {
                AgentError::MalformedJson(format!("no valid plan in: {response}"))
            })
        })
        .await
    }

    /// Run one step and return its result text.
    ///
    /// Only tool steps can abort the run. A non-tool step that fails is
    /// logged and skipped (`Ok(None)`), and the run continues to the
    /// summary over whatever results were collected.
    async fn execute_step(
        &self,
        description: &str,
        requires_tool: bool,
        tool_name: Option<&str>,
    ) -> Result<Option<String>, AgentError> {
        if requires_tool {
            let Some(tool) = tool_name else {
                return Err(AgentError::UnknownTool("null".to_string()));
            };
            return self.core.execute_tool(description, tool, true).await;
        }

        match self
            .core
            .completion_with_retry("step completion", description, &[])
            .await
        {
            Ok(result) => Ok(Some(result)),
            Err(err) => {
                warn!(step = description, error = %err, "non-tool step failed, continuing");
                Ok(None)
            }
        }
    }

    async fn execute_plan(
        &self,
        plan: &mut ExecutionPlan,
        context: &mut PlanContext,
    ) -> Result<(), AgentError> {
        let mut executed = 0;
        while let Some(step) = plan.current().cloned() {
            if executed >= self.max_steps {
                warn!(
                    skipped = plan.len() - plan.current_step,
                    "step limit reached, skipping remaining steps"
                );
                break;
            }

            info!(step = %step.description, tool = ?step.tool_name, "executing plan step");
            let result = self
                .execute_step(&step.description, step.requires_tool, step.tool_name.as_deref())
                .await?;
            if let Some(result) = &result {
                context.add_result(&step.description, result);
            }
            plan.mark_current_complete(result);
            info!("{}", plan.progress());

            executed += 1;
            self.core.pace().await;
        }
        Ok(())
    }

    async fn summarize(
        &self,
        task: &str,
        context: &PlanContext,
        history: &[Message],
    ) -> Result<String, AgentError> {
        let prompt =
            PromptTemplate::summary(task, context.results(), &self.core.output_schema_text());
        let summary = self
            .core
            .completion_with_retry("summary generation", &prompt, history)
            .await?;
        Ok(self.core.parse_structured_output(&summary, history).await)
    }

    async fn run(&self, query: &str, history: &[Message]) -> Result<String, AgentError> {
        self.core.callbacks().on_agent_start(self.name());
        info!(agent = self.name(), agent_id = self.id(), "planning run");

        let mut plan = self.generate_plan(query).await?;
        info!(steps = plan.len(), "plan generated");
        self.core.pace().await;

        let mut context = PlanContext::new();
        self.execute_plan(&mut plan, &mut context).await?;

        let answer = self.summarize(query, &context, history).await?;
        self.core.callbacks().on_agent_end(self.name());
        Ok(answer)
    }

    /// Detailed streaming: narrate each phase into the stream as it
    /// happens, then the final answer in larger chunks.
    ///
    /// Plan generation happens before the stream is returned, so early
    /// failures still propagate. Failures during step execution or
    /// summarization end the stream with an error line.
    async fn run_detailed_stream(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<TokenStream, AgentError> {
        self.core.callbacks().on_agent_start(self.name());

        let mut plan = self.generate_plan(query).await?;
        let agent = self.clone();
        let query = query.to_string();
        let history = history.to_vec();
        let (tx, stream) = TokenStream::channel(32);

        tokio::spawn(async move {
            let callbacks = agent.core.callbacks().clone();
            let chunk_delay = agent.core.config().chunk_delay;
            let send = |text: String| {
                let tx = tx.clone();
                let callbacks = callbacks.clone();
                async move {
                    callbacks.on_new_token(&text);
                    tx.send(text).await.is_ok()
                }
            };

            if !send("Planning your request...\n".to_string()).await {
                return;
            }
            if !send(format!("Created plan with {} steps.\n", plan.len())).await {
                return;
            }

            let mut context = PlanContext::new();
            let mut executed = 0;
            while let Some(step) = plan.current().cloned() {
                if executed >= agent.max_steps {
                    let _ = send("\nStep limit reached, skipping remaining steps.\n".to_string())
                        .await;
                    break;
                }

                if !send(format!(
                    "\nExecuting step {}: {}\n",
                    plan.current_step + 1,
                    step.description
                ))
                .await
                {
                    return;
                }
                if step.requires_tool {
                    if let Some(tool) = &step.tool_name {
                        if !send(format!("Using tool: {tool}\n")).await {
                            return;
                        }
                    }
                }

                let result = match agent
                    .execute_step(&step.description, step.requires_tool, step.tool_name.as_deref())
                    .await
                {
                    Ok(result) => result,
                    Err(err) => {
                        warn!(error = %err, "planning stream aborted");
                        let _ = send(format!("\nError: {err}\n")).await;
                        callbacks.on_agent_end(agent.name());
                        return;
                    }
                };
                if let Some(result) = &result {
                    context.add_result(&step.description, result);
                }
                plan.mark_current_complete(result);

                executed += 1;
                agent.core.pace().await;
            }

            if !send("\nGenerating final summary...\n".to_string()).await {
                return;
            }
            match agent.summarize(&query, &context, &history).await {
                Ok(answer) => {
                    for chunk in maestro_domain::chunk_text(&answer, DETAILED_CHUNK_SIZE) {
                        if !send(chunk).await {
                            return;
                        }
                        tokio::time::sleep(chunk_delay).await;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "planning stream aborted");
                    let _ = send(format!("\nError: {err}\n")).await;
                }
            }
            callbacks.on_agent_end(agent.name());
        });

        Ok(stream)
    }
}

#[async_trait]
impl Agent for PlanningAgent {
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
        if self.detailed_stream {
            return self.run_detailed_stream(query, history).await;
        }

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
        AgentOptions::new("Planner", "plans and executes tasks")
    }

    fn plan_json(steps: &[(&str, bool, Option<&str>)]) -> String {
        let steps: Vec<serde_json::Value> = steps
            .iter()
            .map(|(desc, requires, tool)| {
                json!({"description": desc, "requires_tool": requires, "tool_name": tool})
            })
            .collect();
        json!({"steps": steps}).to_string()
    }

    #[tokio::test]
    async fn runs_tool_and_knowledge_steps_then_summarizes() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            plan_json(&[
                ("look up the refund policy", true, Some("kb_search")),
                ("explain it simply", false, None),
            ]),
            r#"{"arguments": {"query": "refund policy"}}"#.to_string(),
            "a plain-language explanation".to_string(),
            "final combined answer".to_string(),
        ]));
        let mut core = AgentCore::new(llm.clone(), options());
        core.register_tool(Arc::new(StubTool::returning(
            "kb_search",
            "Search the knowledge base",
            json!("refunds take 5 days"),
        )));
        let agent = PlanningAgent::new(core);

        let answer = agent.achat("refund policy?", &[]).await.unwrap();
        assert_eq!(answer, "final combined answer");

        // The summary prompt must carry both step results in order.
        let summary_prompt = llm.prompts().last().cloned().unwrap();
        assert!(summary_prompt.contains("refunds take 5 days"));
        assert!(summary_prompt.contains("a plain-language explanation"));
    }

    #[tokio::test]
    async fn steps_beyond_the_cap_are_skipped() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            plan_json(&[
                ("first", false, None),
                ("second", false, None),
                ("third", false, None),
            ]),
            "r1".to_string(),
            "r2".to_string(),
            "summary".to_string(),
        ]));
        let agent = PlanningAgent::new(AgentCore::new(llm.clone(), options())).with_max_steps(2);

        let answer = agent.achat("do three things", &[]).await.unwrap();
        assert_eq!(answer, "summary");
        // plan + 2 steps + summary; the third step never ran.
        assert_eq!(llm.calls(), 4);
    }

    #[tokio::test]
    async fn unknown_tool_steps_are_dropped_before_execution() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            plan_json(&[
                ("use a tool we lack", true, Some("web_search")),
                ("answer from knowledge", false, None),
            ]),
            "knowledge answer".to_string(),
            "summary".to_string(),
        ]));
        let agent = PlanningAgent::new(AgentCore::new(llm.clone(), options()));

        let answer = agent.achat("task", &[]).await.unwrap();
        assert_eq!(answer, "summary");
        assert_eq!(llm.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_tool_step_failure_continues_to_summary() {
        let llm = Arc::new(ScriptedLlm::from_script(vec![
            Ok(plan_json(&[("think hard", false, None)])),
            Err("backend down".to_string()),
            Err("backend down".to_string()),
            Err("backend down".to_string()),
            Ok("summary anyway".to_string()),
        ]));
        let agent = PlanningAgent::new(AgentCore::new(llm.clone(), options()));

        let answer = agent.achat("task", &[]).await.unwrap();
        assert_eq!(answer, "summary anyway");
        // plan + 3 step attempts + summary
        assert_eq!(llm.calls(), 5);
    }

    #[tokio::test]
    async fn step_not_requiring_a_tool_takes_the_llm_path() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            plan_json(&[("double-check the figures", false, Some("kb_search"))]),
            "checked by hand".to_string(),
            "summary".to_string(),
        ]));
        let tool = Arc::new(StubTool::returning("kb_search", "search", json!("hit")));
        let mut core = AgentCore::new(llm.clone(), options());
        core.register_tool(tool.clone());
        let agent = PlanningAgent::new(core);

        let answer = agent.achat("task", &[]).await.unwrap();
        assert_eq!(answer, "summary");
        assert!(tool.invocations().is_empty());
        assert_eq!(llm.calls(), 3);
    }

    #[tokio::test]
    async fn tool_step_failure_aborts_the_run() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            plan_json(&[("look it up", true, Some("kb_search"))]),
            r#"{"arguments": {}}"#.to_string(),
        ]));
        let mut core = AgentCore::new(llm, options());
        core.register_tool(Arc::new(StubTool::failing(
            "kb_search",
            "search",
            maestro_domain::ToolError::execution_failed("kb_search", "index offline"),
        )));
        let agent = PlanningAgent::new(core);

        let err = agent.achat("task", &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::Tool(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn unparseable_plan_propagates_after_retries() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            "no plan here".to_string(),
            "still no plan".to_string(),
            "nope".to_string(),
        ]));
        let agent = PlanningAgent::new(AgentCore::new(llm.clone(), options()));

        let err = agent.achat("task", &[]).await.unwrap_err();
        assert!(err.is_json_error());
        assert_eq!(llm.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn detailed_stream_narrates_phases() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            plan_json(&[("look it up", true, Some("kb_search"))]),
            r#"{"arguments": {"query": "q"}}"#.to_string(),
            "the detailed answer".to_string(),
        ]));
        let mut core = AgentCore::new(llm, options());
        core.register_tool(Arc::new(StubTool::returning(
            "kb_search",
            "search",
            json!("hit"),
        )));
        let agent = PlanningAgent::new(core).with_detailed_stream(true);

        let stream = agent.astream_chat("task", &[]).await.unwrap();
        let text = stream.collect_text().await;
        assert!(text.starts_with("Planning your request...\n"));
        assert!(text.contains("Created plan with 1 steps.\n"));
        assert!(text.contains("Executing step 1: look it up"));
        assert!(text.contains("Using tool: kb_search"));
        assert!(text.contains("Generating final summary..."));
        assert!(text.ends_with("the detailed answer"));
    }

    #[tokio::test(start_paused = true)]
    async fn plain_stream_carries_only_the_answer() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            plan_json(&[("think", false, None)]),
            "thought".to_string(),
            "just the answer".to_string(),
        ]));
        let agent = PlanningAgent::new(AgentCore::new(llm, options()));

        let stream = agent.astream_chat("task", &[]).await.unwrap();
        assert_eq!(stream.collect_text().await, "just the answer");
    }
}
