//! Confidence-gated routing strategy.
//!
//! Classifies the query against the registry, delegates to the chosen
//! member when confidence is high enough, judges the delegated answer,
//! and refines it when the judge asks. Top-level failures degrade to a
//! fixed apology instead of propagating.

use std::sync::Arc;

use async_trait::async_trait;
use maestro_domain::{
    AgentOptions, Classification, Message, PromptTemplate, ValidationResult,
    parse_classification, parse_validation,
};
use tracing::{info, warn};

use crate::agents::{Agent, AgentCore, AgentError};
use crate::registry::AgentRegistry;
use crate::streaming::{DEFAULT_CHUNK_SIZE, TokenStream};

/// Below this confidence the router answers directly instead of
/// delegating.
const CONFIDENCE_GATE: f64 = 0.6;
/// Default score threshold for the refinement gate.
const VALIDATION_THRESHOLD: f64 = 0.7;

const APOLOGY: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";

pub struct RouterAgent {
    core: AgentCore,
    registry: Arc<AgentRegistry>,
    validation_threshold: f64,
}

impl RouterAgent {
    pub fn new(core: AgentCore, registry: Arc<AgentRegistry>) -> Self {
        Self {
            core,
            registry,
            validation_threshold: VALIDATION_THRESHOLD,
        }
    }

    pub fn with_validation_threshold(mut self, threshold: f64) -> Self {
        self.validation_threshold = threshold;
        self
    }

    /// Fallback verdict: the first registered member at confidence 0.5.
    fn fallback_classification(&self, note: impl Into<String>) -> Classification {
        Classification {
            selected_agent: self.registry.first().map(|a| a.id().to_string()),
            confidence: 0.5,
            reasoning: note.into(),
        }
    }

    /// Classify the query against the registry.
    ///
    /// Never fails: an empty registry, an unparseable verdict, an unknown
    /// selected id, and a gateway failure each map to a documented
    /// fallback verdict.
    async fn classify(&self, query: &str, history: &[Message]) -> Classification {
        if self.registry.is_empty() {
            return Classification {
                selected_agent: None,
                confidence: 0.0,
                reasoning: "No agents available".to_string(),
            };
        }

        let prompt = PromptTemplate::classify(&self.registry.descriptions(), query);
        let response = match self.core.completion(&prompt, history).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "classification failed, falling back to first agent");
                return self.fallback_classification(format!("Classification failed: {err}"));
            }
        };

        match parse_classification(&response) {
            Some(classification) => {
                if let Some(id) = &classification.selected_agent {
                    if self.registry.get(id).is_none() {
                        warn!(selected = %id, "classifier chose an unknown agent");
                        return self.fallback_classification(format!(
                            "Selected agent '{id}' not found, using first available"
                        ));
                    }
                }
                classification
            }
            None => {
                warn!("unparseable classification response, falling back to first agent");
                self.fallback_classification("Failed to parse classification, using first available")
            }
        }
    }

    /// Judge a delegated answer. Unusable judge output yields the
    /// accepting default rather than blocking the user.
    async fn validate(
        &self,
        query: &str,
        agent_name: &str,
        response: &str,
    ) -> ValidationResult {
        let prompt = PromptTemplate::validation(query, agent_name, response);
        match self.core.completion(&prompt, &[]).await {
            Ok(verdict) => parse_validation(&verdict).unwrap_or_else(|| {
                ValidationResult::accepting_default("Failed to parse validation result")
            }),
            Err(err) => {
                warn!(error = %err, "validation call failed, accepting response");
                ValidationResult::accepting_default(format!("Validation failed: {err}"))
            }
        }
    }

    /// Re-prompt with the judge's feedback. A refinement failure keeps
    /// the unrefined response.
    async fn refine(
        &self,
        query: &str,
        response: &str,
        verdict: &ValidationResult,
        history: &[Message],
    ) -> String {
        let feedback = format!(
            "{} {}",
            verdict.reasoning, verdict.refinement_suggestions
        );
        let prompt = PromptTemplate::refinement(query, response, feedback.trim());
        match self.core.completion(&prompt, history).await {
            Ok(refined) => self.core.parse_structured_output(&refined, history).await,
            Err(err) => {
                warn!(error = %err, "refinement failed, keeping original response");
                response.to_string()
            }
        }
    }

    async fn try_run(&self, query: &str, history: &[Message]) -> Result<String, AgentError> {
        let classification = self.classify(query, history).await;
        info!(
            selected = ?classification.selected_agent,
            confidence = classification.confidence,
            reasoning = %classification.reasoning,
            "classified query"
        );
        self.core.pace().await;

        let selected = classification
            .selected_agent
            .as_deref()
            .filter(|_| classification.confidence >= CONFIDENCE_GATE)
            .and_then(|id| self.registry.get(id));

        let Some(agent) = selected else {
            info!("low confidence or no agent, answering directly");
            return self.core.direct_answer(query, history).await;
        };

        let response = agent.achat(query, history).await?;
        self.core.pace().await;

        let verdict = self.validate(query, agent.name(), &response).await;
        info!(
            score = verdict.score,
            needs_refinement = verdict.needs_refinement,
            "validated delegated response"
        );

        if verdict.wants_refinement(self.validation_threshold) {
            info!("refining response");
            return Ok(self.refine(query, &response, &verdict, history).await);
        }
        // An accepted delegated answer is returned as-is; the structured
        // pass runs only on the refinement path.
        Ok(response)
    }

    async fn run(&self, query: &str, history: &[Message]) -> String {
        self.core.callbacks().on_agent_start(self.name());
        info!(agent = self.name(), agent_id = self.id(), "routing run");

        let answer = match self.try_run(query, history).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "routing run failed");
                APOLOGY.to_string()
            }
        };

        self.core.callbacks().on_agent_end(self.name());
        answer
    }
}

#[async_trait]
impl Agent for RouterAgent {
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
