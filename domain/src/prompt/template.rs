//! Prompt templates for classification, validation, planning, and
//! integration.
//!
//! Keeping every prompt here makes the orchestration code read as control
//! flow and keeps wording changes out of the strategies.

/// Templates for generating prompts at each orchestration stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Classifier prompt: match a user query to a registry member.
    pub fn classify(agent_descriptions: &str, user_input: &str) -> String {
        format!(
            r#"You are AgentMatcher, an intelligent assistant designed to analyze user queries and match them with the most suitable agent or department. Your task is to understand the user request, identify key entities and intents, and determine which agent would be best equipped to handle the query.

Important: The user input may be a follow-up response to a previous interaction. The conversation history, including the name of the previously selected agent, is provided. If the user's input appears to be a continuation of the previous conversation (e.g., 'yes', 'ok', 'I want to know more', '1'), select the same agent as before.

Available agents and their capabilities:
{agent_descriptions}

Based on the user input and chat history, determine the most appropriate agent and provide a confidence score (0-1).

Respond in JSON format:
{{
    "selected_agent": "agent_id",
    "confidence": 0.0,
    "reasoning": "brief explanation"
}}

User input: {user_input}"#
        )
    }

    /// Judge prompt: rate a delegated answer against the original query.
    pub fn validation(user_query: &str, agent_name: &str, agent_response: &str) -> String {
        format!(
            r#"You are a ValidatorAgent, responsible for evaluating the quality and relevance of agent responses to user queries.

Your task is to assess whether the agent's response appropriately addresses the user's query, both in terms of content and context.

User Query: {user_query}
Selected Agent: {agent_name}
Agent Response: {agent_response}

Please evaluate and respond in JSON format:
{{
    "is_valid": true,
    "score": 0.0,
    "reasoning": "your reasoning here",
    "needs_refinement": false,
    "refinement_suggestions": "specific suggestions if needed"
}}"#
        )
    }

    /// Refinement prompt: improve a response using the judge's feedback.
    pub fn refinement(user_query: &str, agent_response: &str, validation_feedback: &str) -> String {
        format!(
            r#"You are a response refinement expert. A user query was answered by an agent, but the response needs improvement.

User Query: {user_query}
Original Agent Response: {agent_response}
Validation Feedback: {validation_feedback}

Please provide an improved response that addresses the issues mentioned in the validation feedback.
Maintain the same level of expertise and style as the original agent, but fix the identified problems.
And only give the answer about the User Query asked."#
        )
    }

    /// Integration prompt: combine labeled outputs from parallel agents.
    pub fn integration(user_query: &str, agent_outputs: &str, output_schema: &str) -> String {
        format!(
            r#"You are responsible for combining outputs from multiple specialized agents into a coherent response.
Each agent has provided structured data related to its expertise domain.

Your task is to synthesize this information into a comprehensive response that addresses the original query.

Original User Query: {user_query}

Agent Outputs:
{agent_outputs}

If an output schema was provided, please ensure your response conforms to this structure:
{output_schema}

Please provide a comprehensive response that integrates all the information from the specialized agents.
Be concise and ensure all critical information is included."#
        )
    }

    /// Planner prompt: produce a JSON step list using only listed tools.
    pub fn initial_plan(task: &str, tool_signatures: &str) -> String {
        format!(
            r#"Acting as a planning assistant with access to specific tools. Create a focused plan using ONLY the tools listed below.

Task to accomplish: {task}

Available tools and specifications:
{tool_signatures}

Important rules:
1. ONLY use the tools listed above - do not assume any other tools exist
2. If a tool doesn't exist for a specific need, use your general knowledge to provide information
3. Keep the plan simple and focused - avoid unnecessary steps
4. Never include web searches or external tool usage in the plan
5. If no tools are needed, create a single step with requires_tool: false

Format your response as JSON:
{{
    "steps": [
        {{
            "description": "step description",
            "requires_tool": true,
            "tool_name": "tool_name or null"
        }}
    ]
}}"#
        )
    }

    /// Summary prompt: combine step results into the final planning answer.
    pub fn summary(task: &str, results: &[String], output_schema: &str) -> String {
        let joined = results.join("\n");
        format!(
            r#"You are responsible for combining Task Results into a coherent response.
Original task: {task}
Task Results:
{joined}
If an output schema was provided, please ensure your response conforms to this structure:
{output_schema}

Please provide a comprehensive response that integrates all the information.
Be concise and ensure all critical information is included."#
        )
    }

    /// Argument-synthesis prompt: ask the LLM for a tool's call arguments.
    pub fn tool_arguments(
        description: &str,
        tool_name: &str,
        tool_description: &str,
        tool_schema: &str,
    ) -> String {
        format!(
            r#"Generate parameters to call this tool:
Step Description: {description}
Tool: {tool_name}
Tool description: {tool_description}

Tool specification:
{tool_schema}

Response format:
{{
    "arguments": {{
        // parameter names and values matching the specification exactly
    }}
}}"#
        )
    }

    /// Schema-guided completion prompt for structured output.
    pub fn structured_output(raw_text: &str, output_schema: &str) -> String {
        format!(
            r#"Convert the following content into a JSON object that conforms exactly to the schema below. Respond with the JSON object only, no commentary.

Schema:
{output_schema}

Content:
{raw_text}"#
        )
    }

    /// Direct-answer prompt used by the low-confidence and empty-registry
    /// fallbacks.
    pub fn direct_answer(query: &str) -> String {
        format!("Answer this question: {query}")
    }

    /// System prompt for the reflection generator.
    pub fn reflection_generation_system() -> &'static str {
        r#"Your task is to generate the best content possible for the user's request.
If the user provides critique, respond with a revised version of your previous attempt.
You must always output the revised content."#
    }

    /// System prompt for the reflection critic. The critic approves by
    /// outputting the literal token `<OK>`.
    pub fn reflection_critique_system() -> &'static str {
        r#"You are tasked with generating critique and recommendations for the user's generated content.
If the content has something wrong or something to be improved, output a list of recommendations and critiques.
If the content is fine and there is nothing to change, output this: <OK>
Utilize available tools if necessary to improve or validate the content."#
    }
}
