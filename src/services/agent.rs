//! Role-playing language model agents.
//!
//! An [`AgentProfile`] describes who the model should act as. A [`TaskAgent`]
//! binds a profile to a provider and runs one task at a time: the profile
//! becomes the system prompt, the task description and its expected output
//! become the user message.

use std::sync::Arc;

use crate::providers::ai::{ChatMessage, CompletionRequest, LlmProvider, LlmResult};

/// Role, goal and backstory of an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl AgentProfile {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
        }
    }

    /// Agent that decides whether an email needs an urgent reply.
    pub fn urgency_analyst() -> Self {
        Self::new(
            "Senior Email Analyst",
            "Identify emails requiring urgent replies",
            "Expert at triaging urgent matters",
        )
    }

    /// Agent that writes replies to urgent emails.
    pub fn draft_specialist() -> Self {
        Self::new(
            "Executive Communications Specialist",
            "Write professional, concise urgent replies",
            "Crafts executive-level communications",
        )
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }
}

/// A profile bound to a language model.
#[derive(Clone)]
pub struct TaskAgent {
    provider: Arc<dyn LlmProvider>,
    profile: AgentProfile,
    temperature: f32,
}

impl TaskAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, profile: AgentProfile, temperature: f32) -> Self {
        Self {
            provider,
            profile,
            temperature,
        }
    }

    /// Builds the completion request for a task.
    pub fn request(&self, description: &str, expected_output: &str) -> CompletionRequest {
        let task = format!(
            "{description}\n\nThis is the expected criteria for your final answer: {expected_output}\n\
             You MUST return the actual complete content as the final answer, not a summary."
        );
        CompletionRequest::new(vec![ChatMessage::user(task)])
            .with_system_prompt(self.profile.system_prompt())
            .with_temperature(self.temperature)
    }

    /// Runs a task and returns the model's answer, trimmed.
    pub async fn perform(&self, description: &str, expected_output: &str) -> LlmResult<String> {
        let request = self.request(description, expected_output);

        tracing::debug!(
            role = %self.profile.role,
            provider = self.provider.name(),
            model = self.provider.model(),
            "Running agent task"
        );

        let response = self.provider.complete(&request).await?;
        Ok(response.text.trim().to_string())
    }
}
