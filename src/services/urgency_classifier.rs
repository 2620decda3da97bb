//! Urgency classification via the analyst agent.

use crate::domain::{Message, UrgencyLabel};
use crate::providers::ai::LlmResult;

use super::agent::TaskAgent;

const EXPECTED_OUTPUT: &str = "Either 'urgent' or 'not urgent'";

/// Labels messages urgent or not urgent.
#[derive(Clone)]
pub struct UrgencyClassifier {
    agent: TaskAgent,
}

impl UrgencyClassifier {
    pub fn new(agent: TaskAgent) -> Self {
        Self { agent }
    }

    /// Task description sent to the model for a message.
    pub fn task_description(message: &Message) -> String {
        format!(
            "Analyze this email for urgency:\n\n\
             FROM: {}\n\
             SUBJECT: {}\n\
             CONTENT:\n{}\n\n\
             Respond with exactly one word: either 'urgent' or 'not urgent'.",
            message.sender, message.subject, message.body
        )
    }

    /// Classifies a message. A malformed answer counts as not urgent.
    pub async fn classify(&self, message: &Message) -> LlmResult<UrgencyLabel> {
        let answer = self
            .agent
            .perform(&Self::task_description(message), EXPECTED_OUTPUT)
            .await?;
        let label = UrgencyLabel::from_response(&answer);

        tracing::debug!(id = %message.id, answer = %answer, ?label, "Classified message");
        Ok(label)
    }
}
