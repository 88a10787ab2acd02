//! Plan domain entities

/// One unit of work in a planning run, optionally backed by a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    /// What this step should accomplish.
    pub description: String,
    /// Whether the step must be executed through a tool.
    pub requires_tool: bool,
    /// Name of the backing tool, if any.
    pub tool_name: Option<String>,
    /// Set once the step has been executed.
    pub completed: bool,
    /// Result text, unset until executed.
    pub result: Option<String>,
}

impl PlanStep {
    pub fn new(description: impl Into<String>, requires_tool: bool) -> Self {
        Self {
            description: description.into(),
            requires_tool,
            tool_name: None,
            completed: false,
            result: None,
        }
    }

    pub fn with_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }
}

/// An ordered sequence of steps plus a cursor.
///
/// Produced once per planning run and discarded after.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    pub steps: Vec<PlanStep>,
    pub current_step: usize,
}

impl ExecutionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, step: PlanStep) {
        self.steps.push(step);
    }

    /// The step the cursor points at, or `None` when the plan is done.
    pub fn current(&self) -> Option<&PlanStep> {
        self.steps.get(self.current_step)
    }

    /// Mark the current step complete, store its result, advance the cursor.
    pub fn mark_current_complete(&mut self, result: Option<String>) {
        if let Some(step) = self.steps.get_mut(self.current_step) {
            step.completed = true;
            step.result = result;
            self.current_step += 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current_step >= self.steps.len()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Human-readable progress line, e.g. `Progress: 2/3 steps completed`.
    pub fn progress(&self) -> String {
        let completed = self.steps.iter().filter(|s| s.completed).count();
        format!("Progress: {}/{} steps completed", completed, self.steps.len())
    }
}

/// Transient key-value memory of step description to result, accumulated
/// within one planning run.
#[derive(Debug, Clone, Default)]
pub struct PlanContext {
    memory: std::collections::HashMap<String, String>,
    results: Vec<String>,
}

impl PlanContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, step_name: impl Into<String>, result: impl Into<String>) {
        let result = result.into();
        self.results.push(result.clone());
        self.memory.insert(step_name.into(), result);
    }

    pub fn get(&self, step_name: &str) -> Option<&str> {
        self.memory.get(step_name).map(|s| s.as_str())
    }

    /// All results in execution order.
    pub fn results(&self) -> &[String] {
        &self.results
    }
}
