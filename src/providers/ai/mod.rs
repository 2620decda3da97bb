//! Language model providers.
//!
//! The classifier and composer agents talk to a language model through the
//! [`LlmProvider`] trait. [`OpenAiCompatibleProvider`] works with OpenAI and
//! with any endpoint that exposes the same chat completions API.
//!
//! # Example
//!
//! ```rust,no_run
//! use inbox_triage::providers::ai::{
//!     ChatMessage, CompletionRequest, LlmProvider, OpenAiCompatibleProvider,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let openai = OpenAiCompatibleProvider::openai("sk-...", "gpt-4-turbo");
//!
//! let request = CompletionRequest::new(vec![ChatMessage::user("Is this urgent?")])
//!     .with_system_prompt("You are Senior Email Analyst.")
//!     .with_temperature(0.3);
//!
//! let response = openai.complete(&request).await?;
//! println!("Response: {}", response.text);
//! # Ok(())
//! # }
//! ```

mod openai;
mod traits;

pub use openai::OpenAiCompatibleProvider;
pub use traits::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider,
    LlmResult, Role, TokenUsage,
};
