//! inbox-triage - Entry point for the one-shot triage run

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use inbox_triage::config::{AiSettings, Settings};
use inbox_triage::providers::ai::{LlmProvider, OpenAiCompatibleProvider};
use inbox_triage::providers::calendar::GoogleCalendarGateway;
use inbox_triage::providers::email::GmailGateway;
use inbox_triage::providers::oauth::GoogleOAuthClient;
use inbox_triage::services::{
    AgentProfile, CredentialProvider, DatetimeExtractor, DraftComposer, TaskAgent, TriageEvent,
    TriageService, TriageSettings, TriageSummary, UrgencyClassifier,
};
use inbox_triage::storage::{resolve_api_key, resolve_optional_api_key, Keychain, TokenCache};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting inbox-triage");

    if let Err(e) = run().await {
        tracing::error!("Triage failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let settings = Settings::load_or_default()?;
    let offset = settings.extraction.offset()?;

    let credentials = CredentialProvider::new(
        TokenCache::new(&settings.auth.token_cache_path),
        Arc::new(GoogleOAuthClient::new(&settings.auth.client_secrets_path)),
        settings.auth.scopes.clone(),
    );
    let record = credentials
        .obtain()
        .await
        .context("obtaining Google credentials")?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("inbox-triage/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")?;

    let mail =
        GmailGateway::from_settings(record.token.clone(), &settings.mail).with_client(http.clone());
    let calendar =
        GoogleCalendarGateway::for_calendar(record.token.clone(), &settings.calendar.calendar_id)
            .with_client(http.clone());

    let llm = language_model(&settings.ai, http).await?;
    let classifier = UrgencyClassifier::new(TaskAgent::new(
        llm.clone(),
        AgentProfile::urgency_analyst(),
        settings.ai.temperature,
    ));
    let composer = DraftComposer::new(TaskAgent::new(
        llm,
        AgentProfile::draft_specialist(),
        settings.ai.temperature,
    ));

    let service = TriageService::new(
        Arc::new(mail),
        Arc::new(calendar),
        classifier,
        composer,
        DatetimeExtractor::new(offset),
    )
    .with_settings(TriageSettings {
        batch_size: settings.mail.batch_size,
        meeting_duration_minutes: settings.calendar.meeting_duration_minutes,
    });

    let report = service
        .run_with(print_progress)
        .await
        .context("listing inbox messages")?;

    println!("{}", completion_message(&report.summary()));
    Ok(())
}

fn completion_message(summary: &TriageSummary) -> String {
    format!(
        "\nProcessing complete. Check your Gmail inbox + drafts.\n{}",
        summary
    )
}

async fn language_model(ai: &AiSettings, http: reqwest::Client) -> Result<Arc<dyn LlmProvider>> {
    let keychain = Keychain::default();
    // A custom endpoint may run without a key, so the keychain is optional there.
    let api_key = if ai.base_url.is_some() {
        resolve_optional_api_key(&ai.api_key_env, || {
            keychain.get(&ai.api_key_keychain_id)
        })
        .await
    } else {
        resolve_api_key(&ai.api_key_env, &keychain, &ai.api_key_keychain_id).await?
    };

    let provider = match (&ai.base_url, api_key) {
        (Some(base_url), api_key) => {
            OpenAiCompatibleProvider::custom(base_url.clone(), api_key, ai.model.clone())
        }
        (None, Some(api_key)) => OpenAiCompatibleProvider::openai(api_key, ai.model.clone()),
        (None, None) => bail!(
            "no API key: set {} or store one in the keychain as {}",
            ai.api_key_env,
            ai.api_key_keychain_id
        ),
    };
    Ok(Arc::new(provider.with_client(http)))
}

fn print_progress(event: &TriageEvent) {
    match event {
        TriageEvent::Listed { count } => println!("Found {} emails to process", count),
        TriageEvent::Started(message) => println!("\nProcessing email: {}", message.subject),
        TriageEvent::Finished { outcome, .. } => println!("  - {}", outcome),
        TriageEvent::Skipped { id, error } => println!("\nSkipping email {}: {}", id, error),
    }
}
