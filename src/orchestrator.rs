use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::Result;
use crate::models::{MessageRole, Outcome, QueryContext, QueryType, RunStatus};
use crate::prompt;
use crate::runs::RunStateTracker;
use crate::threads::ThreadRegistry;
use crate::transport::AssistantApi;

/// Drives one generation attempt end to end: resolve the session's thread,
/// gate the submission, poll the run to a settled state, extract the reply.
///
/// `generate` is total - every failure mode comes back as an `Outcome`
/// variant and nothing is raised to the caller.
pub struct Orchestrator {
    transport: Arc<dyn AssistantApi>,
    registry: Arc<ThreadRegistry>,
    tracker: RunStateTracker,
    assistant_id: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn AssistantApi>,
        registry: Arc<ThreadRegistry>,
        assistant_id: String,
        poll_interval: Duration,
        max_poll_attempts: u32,
    ) -> Self {
        let tracker = RunStateTracker::new(transport.clone());
        Self {
            transport,
            registry,
            tracker,
            assistant_id,
            poll_interval,
            max_poll_attempts,
        }
    }

    pub async fn generate(
        &self,
        session_id: &str,
        raw_text: &str,
        query_type: QueryType,
        context: Option<&QueryContext>,
    ) -> Outcome {
        match self
            .try_generate(session_id, raw_text, query_type, context)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) if e.is_active_run_conflict() => {
                tracing::debug!(session = %session_id, "Generation blocked by active run");
                Outcome::Waiting
            }
            Err(e) => {
                tracing::error!(session = %session_id, error = %e, "Generation failed");
                Outcome::Error(e.to_string())
            }
        }
    }

    async fn try_generate(
        &self,
        session_id: &str,
        raw_text: &str,
        query_type: QueryType,
        context: Option<&QueryContext>,
    ) -> Result<Outcome> {
        let thread_id = self.registry.get_or_create(session_id).await?;
        let slot = self.registry.session(session_id);

        let run_id = {
            // Hold the session's submit gate across check + append + start so
            // two in-process callers cannot interleave between the pre-check
            // and the submission. Released before polling: a concurrent call
            // then sees the active run and returns Waiting promptly.
            let _gate = slot.submit_gate.lock().await;

            if self.tracker.has_active_run(&thread_id).await {
                tracing::debug!(thread_id = %thread_id, "Active run found in pre-check");
                return Ok(Outcome::Waiting);
            }

            let full_prompt = prompt::build(raw_text, query_type, context);

            match self
                .transport
                .create_message(&thread_id, "user", &full_prompt)
                .await
            {
                Ok(()) => {}
                // Lost the race against an out-of-process submitter; same
                // outcome as the pre-check catching it
                Err(e) if e.is_active_run_conflict() => return Ok(Outcome::Waiting),
                Err(e) => return Err(e),
            }

            self.transport
                .create_run(&thread_id, &self.assistant_id)
                .await?
        };

        self.poll_to_completion(&thread_id, &run_id).await
    }

    /// Poll the run at a fixed interval until it settles or the attempt
    /// budget is spent.
    async fn poll_to_completion(&self, thread_id: &str, run_id: &str) -> Result<Outcome> {
        for attempt in 1..=self.max_poll_attempts {
            let status = self.transport.get_run(thread_id, run_id).await?;
            match status {
                RunStatus::Completed => return self.extract_reply(thread_id).await,
                RunStatus::Failed => {
                    tracing::warn!(thread_id = %thread_id, run_id = %run_id, "Run failed");
                    return Ok(Outcome::Failed);
                }
                status if !status.is_active() => {
                    // Cancelled, expired or incomplete: settled without a
                    // usable reply, surfaced the same as a failure
                    tracing::warn!(thread_id = %thread_id, run_id = %run_id, ?status, "Run settled without completing");
                    return Ok(Outcome::Failed);
                }
                _ => {}
            }
            if attempt < self.max_poll_attempts {
                sleep(self.poll_interval).await;
            }
        }
        tracing::warn!(thread_id = %thread_id, run_id = %run_id, attempts = self.max_poll_attempts, "Run did not settle within polling budget");
        Ok(Outcome::TimedOut)
    }

    /// Fetch the thread's messages and return the most recent assistant
    /// reply. The backend makes no ordering promise we rely on, so the
    /// newest message is chosen by creation time, first occurrence winning
    /// ties (newest-first listings put the latest one first).
    async fn extract_reply(&self, thread_id: &str) -> Result<Outcome> {
        let messages = self.transport.list_messages(thread_id).await?;

        let mut newest: Option<&crate::models::MessageObject> = None;
        for message in &messages {
            if message.role != MessageRole::Assistant {
                continue;
            }
            if newest.map_or(true, |m| message.created_at > m.created_at) {
                newest = Some(message);
            }
        }

        match newest.and_then(|m| m.text()) {
            Some(text) => Ok(Outcome::Reply(text.to_string())),
            None => {
                // Should not happen on a genuinely completed run
                tracing::warn!(thread_id = %thread_id, "Completed run produced no assistant reply");
                Ok(Outcome::NoReply)
            }
        }
    }
}
