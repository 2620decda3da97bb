//! Triage service: the per-message workflow.
//!
//! For each recent inbox message the [`TriageService`] runs one branch:
//!
//! ```text
//! body ──extract──> datetime? ──yes──> calendar lookup ──> send availability reply
//!                       │
//!                       no
//!                       v
//!                   classify ──urgent──> compose ──> create draft
//!                       │
//!                   not urgent ──> no action
//! ```
//!
//! Remote failures after the inbox listing are caught per message and
//! reported as [`TriageOutcome::Failed`]; the batch always runs to the end.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{EmailId, Message, TriageOutcome, TriageStage};
use crate::providers::calendar::{CalendarGateway, DEFAULT_DURATION_MINUTES};
use crate::providers::email::MailGateway;
use crate::providers::Result;

use super::datetime_extractor::DatetimeExtractor;
use super::draft_composer::DraftComposer;
use super::urgency_classifier::UrgencyClassifier;

/// Reply sent when the requested slot overlaps an event.
pub const BOOKED_REPLY: &str = "That time seems to be booked in my calendar, but I will get back to you with confirmation asap.";

/// Reply sent when the requested slot is free.
pub const AVAILABLE_REPLY: &str = "That time seems to be available in my calendar, but I will get back to you with confirmation asap.";

/// Availability reply text for a calendar lookup result.
pub fn availability_reply(slot_free: bool) -> &'static str {
    if slot_free {
        AVAILABLE_REPLY
    } else {
        BOOKED_REPLY
    }
}

/// Settings for a triage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriageSettings {
    /// Maximum number of inbox messages per run.
    pub batch_size: u32,
    /// Length of the calendar window probed for a requested time.
    pub meeting_duration_minutes: i64,
}

impl Default for TriageSettings {
    fn default() -> Self {
        Self {
            batch_size: 3,
            meeting_duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }
}

/// Progress notification emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum TriageEvent {
    /// The inbox was listed.
    Listed { count: usize },
    /// A message was fetched and is about to be processed.
    Started(Message),
    /// A message finished with an outcome.
    Finished { id: EmailId, outcome: TriageOutcome },
    /// A message could not be fetched and was skipped.
    Skipped { id: EmailId, error: String },
}

/// One processed message and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriagedMessage {
    pub message: Message,
    pub outcome: TriageOutcome,
}

/// Result of a triage run.
#[derive(Debug, Clone, Default)]
pub struct TriageReport {
    /// Processed messages in list order.
    pub processed: Vec<TriagedMessage>,
    /// Messages whose fetch failed, with the error.
    pub skipped: Vec<(EmailId, String)>,
}

impl TriageReport {
    pub fn summary(&self) -> TriageSummary {
        let mut summary = TriageSummary {
            processed: self.processed.len(),
            skipped: self.skipped.len(),
            ..Default::default()
        };
        for triaged in &self.processed {
            match triaged.outcome {
                TriageOutcome::AvailabilityReplySent { .. } => summary.replies_sent += 1,
                TriageOutcome::DraftCreated => summary.drafts_created += 1,
                TriageOutcome::NoAction => summary.no_action += 1,
                TriageOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Outcome counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TriageSummary {
    pub processed: usize,
    pub replies_sent: usize,
    pub drafts_created: usize,
    pub no_action: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl std::fmt::Display for TriageSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} processed: {} replies sent, {} drafts created, {} not urgent, {} failed, {} skipped",
            self.processed,
            self.replies_sent,
            self.drafts_created,
            self.no_action,
            self.failed,
            self.skipped
        )
    }
}

/// Runs the triage workflow over the most recent inbox messages.
///
/// All collaborators are constructed once by the caller and only read here.
pub struct TriageService {
    mail: Arc<dyn MailGateway>,
    calendar: Arc<dyn CalendarGateway>,
    classifier: UrgencyClassifier,
    composer: DraftComposer,
    extractor: DatetimeExtractor,
    settings: TriageSettings,
}

impl TriageService {
    pub fn new(
        mail: Arc<dyn MailGateway>,
        calendar: Arc<dyn CalendarGateway>,
        classifier: UrgencyClassifier,
        composer: DraftComposer,
        extractor: DatetimeExtractor,
    ) -> Self {
        Self {
            mail,
            calendar,
            classifier,
            composer,
            extractor,
            settings: TriageSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: TriageSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> TriageSettings {
        self.settings
    }

    /// Runs one batch without progress notifications.
    pub async fn run(&self) -> Result<TriageReport> {
        self.run_with(|_| {}).await
    }

    /// Runs one batch, reporting progress to `on_event`.
    ///
    /// Only a failure to list the inbox is returned as an error.
    pub async fn run_with(&self, mut on_event: impl FnMut(&TriageEvent)) -> Result<TriageReport> {
        let ids = self.list_batch().await?;
        tracing::info!(count = ids.len(), "Listed inbox messages");
        on_event(&TriageEvent::Listed { count: ids.len() });

        let mut report = TriageReport::default();
        for id in ids {
            let message = match self.mail.fetch(&id).await {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "Failed to fetch message, skipping");
                    let error = e.to_string();
                    on_event(&TriageEvent::Skipped {
                        id: id.clone(),
                        error: error.clone(),
                    });
                    report.skipped.push((id, error));
                    continue;
                }
            };

            on_event(&TriageEvent::Started(message.clone()));
            let outcome = self.process_message(&message).await;
            on_event(&TriageEvent::Finished {
                id: message.id.clone(),
                outcome: outcome.clone(),
            });
            report.processed.push(TriagedMessage { message, outcome });
        }

        tracing::info!(summary = %report.summary(), "Triage run complete");
        Ok(report)
    }

    /// Lists the batch, dropping repeated ids while keeping list order.
    async fn list_batch(&self) -> Result<Vec<EmailId>> {
        let listed = self.mail.list_recent(self.settings.batch_size).await?;
        let mut seen = HashSet::new();
        Ok(listed
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect())
    }

    /// Runs exactly one branch of the workflow for a message.
    pub async fn process_message(&self, message: &Message) -> TriageOutcome {
        match self.extractor.extract(&message.body) {
            Some(requested) => self.answer_availability(message, requested).await,
            None => self.triage_urgency(message).await,
        }
    }

    async fn answer_availability(
        &self,
        message: &Message,
        requested: chrono::DateTime<chrono::FixedOffset>,
    ) -> TriageOutcome {
        tracing::info!(id = %message.id, requested = %requested, "Detected datetime inquiry");

        let slot_free = match self
            .calendar
            .is_free(requested, self.settings.meeting_duration_minutes)
            .await
        {
            Ok(free) => free,
            Err(e) => {
                tracing::warn!(id = %message.id, error = %e, "Calendar lookup failed");
                return TriageOutcome::failed(TriageStage::AvailabilityCheck, e);
            }
        };

        if let Err(e) = self
            .mail
            .send_reply(&message.id, availability_reply(slot_free))
            .await
        {
            tracing::warn!(id = %message.id, error = %e, "Failed to send availability reply");
            return TriageOutcome::failed(TriageStage::SendReply, e);
        }

        TriageOutcome::AvailabilityReplySent {
            requested,
            slot_free,
        }
    }

    async fn triage_urgency(&self, message: &Message) -> TriageOutcome {
        let label = match self.classifier.classify(message).await {
            Ok(label) => label,
            Err(e) => {
                tracing::warn!(id = %message.id, error = %e, "Urgency classification failed");
                return TriageOutcome::failed(TriageStage::Classification, e);
            }
        };

        if !label.is_urgent() {
            return TriageOutcome::NoAction;
        }
        tracing::info!(id = %message.id, "Urgent email detected");

        let body = match self.composer.compose(message).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(id = %message.id, error = %e, "Draft composition failed");
                return TriageOutcome::failed(TriageStage::Composition, e);
            }
        };

        match self.mail.create_draft(&message.id, &body).await {
            Ok(()) => TriageOutcome::DraftCreated,
            Err(e) => {
                tracing::warn!(id = %message.id, error = %e, "Failed to create draft");
                TriageOutcome::failed(TriageStage::CreateDraft, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ThreadId;
    use crate::providers::ai::{
        CompletionRequest, CompletionResponse, LlmError, LlmProvider, LlmResult,
    };
    use crate::providers::calendar::MockCalendarGateway;
    use crate::providers::email::MockMailGateway;
    use crate::providers::ProviderError;
    use crate::services::agent::{AgentProfile, TaskAgent};
    use async_trait::async_trait;
    use chrono::FixedOffset;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Answers classification prompts with `label` and drafting prompts with a fixed body.
    struct ScriptedLlm {
        label: Option<&'static str>,
        calls: Mutex<usize>,
    }

    impl ScriptedLlm {
        fn answering(label: &'static str) -> Arc<Self> {
            Arc::new(Self {
                label: Some(label),
                calls: Mutex::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                label: None,
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &CompletionRequest) -> LlmResult<CompletionResponse> {
            *self.calls.lock().unwrap() += 1;
            let label = self.label.ok_or(LlmError::RateLimited {
                retry_after_secs: Some(30),
            })?;
            let text = if request.messages[0].content.starts_with("Analyze") {
                label
            } else {
                "Thanks, looking into it now."
            };
            Ok(CompletionResponse::text(text))
        }
    }

    fn message(id: &str, body: &str) -> Message {
        Message {
            id: EmailId::from(id),
            thread_id: ThreadId::from(format!("thread-{id}")),
            subject: format!("Subject {id}"),
            sender: "sender@example.com".to_string(),
            body: body.to_string(),
        }
    }

    fn service(
        mail: MockMailGateway,
        calendar: MockCalendarGateway,
        llm: Arc<ScriptedLlm>,
    ) -> TriageService {
        TriageService::new(
            Arc::new(mail),
            Arc::new(calendar),
            UrgencyClassifier::new(TaskAgent::new(
                llm.clone(),
                AgentProfile::urgency_analyst(),
                0.3,
            )),
            DraftComposer::new(TaskAgent::new(llm, AgentProfile::draft_specialist(), 0.3)),
            DatetimeExtractor::new(FixedOffset::east_opt(20_700).unwrap()),
        )
    }

    #[test]
    fn availability_phrases() {
        assert!(availability_reply(true).contains("available"));
        assert!(availability_reply(false).contains("booked"));
    }

    #[tokio::test]
    async fn scheduling_question_gets_booked_reply() {
        let mut mail = MockMailGateway::new();
        mail.expect_send_reply()
            .with(eq(EmailId::from("m1")), eq(BOOKED_REPLY))
            .times(1)
            .returning(|_, _| Ok(()));
        mail.expect_create_draft().never();

        let mut calendar = MockCalendarGateway::new();
        calendar
            .expect_is_free()
            .withf(|start, duration| start.offset().local_minus_utc() == 20_700 && *duration == 60)
            .times(1)
            .returning(|_, _| Ok(false));

        let llm = ScriptedLlm::answering("urgent");
        let svc = service(mail, calendar, llm.clone());

        let outcome = svc
            .process_message(&message("m1", "Can we meet Friday at 10am?"))
            .await;
        assert!(matches!(
            outcome,
            TriageOutcome::AvailabilityReplySent {
                slot_free: false,
                ..
            }
        ));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn free_slot_gets_available_reply() {
        let mut mail = MockMailGateway::new();
        mail.expect_send_reply()
            .with(eq(EmailId::from("m1")), eq(AVAILABLE_REPLY))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut calendar = MockCalendarGateway::new();
        calendar.expect_is_free().returning(|_, _| Ok(true));

        let svc = service(mail, calendar, ScriptedLlm::answering("urgent"));
        let outcome = svc
            .process_message(&message("m1", "Let's meet at 3pm tomorrow"))
            .await;
        assert!(matches!(
            outcome,
            TriageOutcome::AvailabilityReplySent { slot_free: true, .. }
        ));
    }

    #[tokio::test]
    async fn urgent_message_gets_draft() {
        let mut mail = MockMailGateway::new();
        mail.expect_create_draft()
            .with(eq(EmailId::from("m2")), eq("Thanks, looking into it now."))
            .times(1)
            .returning(|_, _| Ok(()));
        mail.expect_send_reply().never();

        let mut calendar = MockCalendarGateway::new();
        calendar.expect_is_free().never();

        let llm = ScriptedLlm::answering("urgent");
        let svc = service(mail, calendar, llm.clone());
        let outcome = svc
            .process_message(&message("m2", "Production is down, please help!"))
            .await;
        assert_eq!(outcome, TriageOutcome::DraftCreated);
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn not_urgent_message_is_left_alone() {
        let mut mail = MockMailGateway::new();
        mail.expect_create_draft().never();
        mail.expect_send_reply().never();

        let llm = ScriptedLlm::answering("Not urgent, but nice to know");
        let svc = service(mail, MockCalendarGateway::new(), llm.clone());
        let outcome = svc
            .process_message(&message("m3", "Newsletter: what we shipped"))
            .await;
        assert_eq!(outcome, TriageOutcome::NoAction);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn failures_become_outcomes() {
        let mut mail = MockMailGateway::new();
        mail.expect_send_reply()
            .returning(|_, _| Err(ProviderError::Authentication("insufficient scope".into())));

        let mut calendar = MockCalendarGateway::new();
        calendar.expect_is_free().returning(|_, _| Ok(true));

        let svc = service(mail, calendar, ScriptedLlm::failing());

        let outcome = svc.process_message(&message("a", "noon tomorrow?")).await;
        assert!(matches!(
            outcome,
            TriageOutcome::Failed {
                stage: TriageStage::SendReply,
                ..
            }
        ));

        let outcome = svc.process_message(&message("b", "no dates here")).await;
        assert!(matches!(
            outcome,
            TriageOutcome::Failed {
                stage: TriageStage::Classification,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn calendar_failure_skips_reply() {
        let mut mail = MockMailGateway::new();
        mail.expect_send_reply().never();

        let mut calendar = MockCalendarGateway::new();
        calendar
            .expect_is_free()
            .returning(|_, _| Err(ProviderError::Connection("reset".into())));

        let svc = service(mail, calendar, ScriptedLlm::answering("urgent"));
        let outcome = svc.process_message(&message("a", "at 17:00 today")).await;
        assert_eq!(
            outcome,
            TriageOutcome::failed(
                TriageStage::AvailabilityCheck,
                ProviderError::Connection("reset".into())
            )
        );
    }

    #[tokio::test]
    async fn run_dedupes_and_skips_unfetchable() {
        let mut mail = MockMailGateway::new();
        mail.expect_list_recent()
            .with(eq(3))
            .times(1)
            .returning(|_| Ok(vec!["a".into(), "b".into(), "a".into(), "c".into()]));
        mail.expect_fetch().times(3).returning(|id| {
            if id.0 == "b" {
                Err(ProviderError::NotFound("b".into()))
            } else {
                Ok(message(&id.0, "nothing scheduled"))
            }
        });

        let llm = ScriptedLlm::answering("not urgent");
        let svc = service(mail, MockCalendarGateway::new(), llm);

        let mut events = Vec::new();
        let report = svc
            .run_with(|event| events.push(format!("{event:?}")))
            .await
            .unwrap();

        let processed: Vec<_> = report
            .processed
            .iter()
            .map(|t| t.message.id.0.as_str())
            .collect();
        assert_eq!(processed, vec!["a", "c"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, EmailId::from("b"));
        assert_eq!(
            report.summary(),
            TriageSummary {
                processed: 2,
                no_action: 2,
                skipped: 1,
                ..Default::default()
            }
        );
        assert!(events[0].starts_with("Listed { count: 3 }"));
        assert_eq!(events.len(), 6);
    }

    #[tokio::test]
    async fn list_failure_aborts_run() {
        let mut mail = MockMailGateway::new();
        mail.expect_list_recent()
            .returning(|_| Err(ProviderError::Authentication("token revoked".into())));
        mail.expect_fetch().never();

        let svc = service(
            mail,
            MockCalendarGateway::new(),
            ScriptedLlm::answering("urgent"),
        );
        assert!(matches!(
            svc.run().await,
            Err(ProviderError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn batch_size_is_forwarded() {
        let mut mail = MockMailGateway::new();
        mail.expect_list_recent()
            .with(eq(10))
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let svc = service(
            mail,
            MockCalendarGateway::new(),
            ScriptedLlm::answering("urgent"),
        )
        .with_settings(TriageSettings {
            batch_size: 10,
            meeting_duration_minutes: 30,
        });

        let report = svc.run().await.unwrap();
        assert!(report.processed.is_empty());
        assert_eq!(svc.settings().meeting_duration_minutes, 30);
    }

    #[test]
    fn summary_display() {
        let summary = TriageSummary {
            processed: 3,
            replies_sent: 1,
            drafts_created: 1,
            no_action: 1,
            failed: 0,
            skipped: 0,
        };
        assert_eq!(
            summary.to_string(),
            "3 processed: 1 replies sent, 1 drafts created, 1 not urgent, 0 failed, 0 skipped"
        );
    }
}
