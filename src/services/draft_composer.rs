//! Reply drafting for urgent messages.

use crate::domain::Message;
use crate::providers::ai::LlmResult;

use super::agent::TaskAgent;

const EXPECTED_OUTPUT: &str = "A concise email draft text (body only)";

/// Writes reply bodies with the communications agent.
///
/// The style guidelines are prompt instructions only; the returned text is
/// not checked for length or tone.
#[derive(Clone)]
pub struct DraftComposer {
    agent: TaskAgent,
}

impl DraftComposer {
    pub fn new(agent: TaskAgent) -> Self {
        Self { agent }
    }

    pub fn task_description(message: &Message) -> String {
        format!(
            "Write a professional draft response for this urgent email:\n\n\
             Original email content:\n{}\n\n\
             Guidelines:\n\
             - Acknowledge receipt and show empathy\n\
             - Keep response under 3 sentences\n\
             - Offer immediate next steps if needed\n\
             - Maintain professional tone",
            message.body
        )
    }

    pub async fn compose(&self, message: &Message) -> LlmResult<String> {
        let body = self
            .agent
            .perform(&Self::task_description(message), EXPECTED_OUTPUT)
            .await?;

        tracing::debug!(id = %message.id, chars = body.chars().count(), "Composed draft");
        Ok(body)
    }
}
