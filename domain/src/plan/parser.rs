//! Plan parsing from LLM responses.
//!
//! The planner LLM is asked for a JSON object of the form:
//!
//! ```json
//! {
//!   "steps": [
//!     {
//!       "description": "step description",
//!       "requires_tool": true,
//!       "tool_name": "tool_name or null"
//!     }
//!   ]
//! }
//! ```
//!
//! Steps citing a tool that is not registered with the owning agent are
//! dropped at construction time, never executed.

use serde::Deserialize;

use crate::plan::entities::{ExecutionPlan, PlanStep};
use crate::util::extract_json_object;

#[derive(Debug, Deserialize)]
struct RawPlan {
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    description: String,
    #[serde(default = "default_requires_tool")]
    requires_tool: bool,
    #[serde(default)]
    tool_name: Option<String>,
}

// A step that doesn't say is assumed to want a tool, matching the
// planner prompt's default.
fn default_requires_tool() -> bool {
    true
}

/// Parse a plan from model response text.
///
/// Cleans markdown fences, deserializes the step list, and drops steps
/// referencing tools absent from `known_tools`. Returns `None` if the
/// response contains no valid plan JSON.
pub fn parse_plan(response: &str, known_tools: &[String]) -> Option<ExecutionPlan> {
    let json = extract_json_object(response)?;
    let raw: RawPlan = serde_json::from_str(&json).ok()?;

    let mut plan = ExecutionPlan::new();
    for step in raw.steps {
        let mut plan_step = PlanStep::new(step.description, step.requires_tool);
        if let Some(tool_name) = step.tool_name {
            plan_step = plan_step.with_tool(tool_name);
        }
        plan.add_step(plan_step);
    }

    retain_known_tools(&mut plan, known_tools);
    Some(plan)
}

/// Drop tool steps whose tool is not in `known_tools`.
///
/// Non-tool steps always survive. Idempotent: re-running on a plan whose
/// steps reference only registered tools leaves it unchanged.
pub fn retain_known_tools(plan: &mut ExecutionPlan, known_tools: &[String]) {
    plan.steps.retain(|step| {
        if !step.requires_tool {
            return true;
        }
        match &step.tool_name {
            Some(tool_name) => known_tools.iter().any(|known| known == tool_name),
            None => false,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_valid_plan() {
        let response = r#"```json
{
  "steps": [
    {"description": "search the knowledge base", "requires_tool": true, "tool_name": "kb_search"},
    {"description": "summarize findings", "requires_tool": false, "tool_name": null}
  ]
}
```"#;
        let plan = parse_plan(response, &tools(&["kb_search"])).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.steps[0].tool_name.as_deref(), Some("kb_search"));
        assert!(!plan.steps[1].requires_tool);
    }

    #[test]
    fn parse_drops_unknown_tool_steps() {
        let response = r#"{"steps": [
            {"description": "use a tool we do not have", "requires_tool": true, "tool_name": "web_search"},
            {"description": "answer from knowledge", "requires_tool": false}
        ]}"#;
        let plan = parse_plan(response, &tools(&["kb_search"])).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps[0].description, "answer from knowledge");
    }

    #[test]
    fn parse_drops_tool_step_without_name() {
        let response =
            r#"{"steps": [{"description": "mystery step", "requires_tool": true, "tool_name": null}]}"#;
        let plan = parse_plan(response, &tools(&["kb_search"])).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn parse_plain_text_returns_none() {
        assert!(parse_plan("I could not come up with a plan.", &[]).is_none());
    }

    #[test]
    fn parse_wrong_shape_returns_none() {
        assert!(parse_plan(r#"{"tasks": []}"#, &[]).is_none());
    }

    #[test]
    fn missing_requires_tool_defaults_to_true() {
        let response = r#"{"steps": [{"description": "implicit tool step", "tool_name": "kb_search"}]}"#;
        let plan = parse_plan(response, &tools(&["kb_search"])).unwrap();
        assert!(plan.steps[0].requires_tool);
    }

    #[test]
    fn retain_is_idempotent_on_clean_plans() {
        let known = tools(&["kb_search", "calculator"]);
        let response = r#"{"steps": [
            {"description": "look it up", "requires_tool": true, "tool_name": "kb_search"},
            {"description": "compute", "requires_tool": true, "tool_name": "calculator"},
            {"description": "explain", "requires_tool": false}
        ]}"#;
        let mut plan = parse_plan(response, &known).unwrap();
        let before = plan.steps.clone();

        retain_known_tools(&mut plan, &known);
        assert_eq!(plan.steps, before);

        retain_known_tools(&mut plan, &known);
        assert_eq!(plan.steps, before);
    }
}
