//! Step-wise reasoning sessions
//!
//! A session seeds a transcript with the output contract and the caller's
//! prompt, then asks the model for one reasoning step per call. Each step is
//! echoed back into the transcript so the model sees its own reasoning on the
//! next call. The loop stops when the model signals `final_answer`, when a call
//! fails, or when the step cap is reached; a dedicated final call then
//! produces the answer.
//!
//! Sessions are exposed as a pull-driven [`Stream`] of snapshots. Nothing runs
//! in the background: the next call is only issued when the caller polls for
//! the next snapshot, and dropping the stream abandons the session.

mod prompt;
mod step;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub(crate) mod testing;

pub use prompt::{ASSISTANT_ACKNOWLEDGMENT, FINAL_ANSWER_REQUEST, SYSTEM_PROMPT};
pub use step::{CallKind, NextAction, ReasoningStep, ERROR_TITLE, RAW_RESPONSE_TITLE};

use crate::config::SessionLimits;
use crate::llm::{LlmMessage, LlmRequest, LlmService};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Label of the last step of every completed session
pub const FINAL_ANSWER_LABEL: &str = "Final Answer";

const TEMPERATURE: f32 = 1.0;

/// Lazy sequence of session snapshots
pub type SessionStream = Pin<Box<dyn Stream<Item = SessionResult> + Send>>;

/// One labeled entry of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub label: String,
    pub content: String,
    pub elapsed: Duration,
}

impl StepRecord {
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    #[must_use]
    pub fn is_final_answer(&self) -> bool {
        self.label == FINAL_ANSWER_LABEL
    }
}

/// Steps accumulated so far and their total thinking time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionResult {
    pub steps: Vec<StepRecord>,
    pub total_elapsed: Duration,
}

impl SessionResult {
    fn push(&mut self, label: String, content: String, elapsed: Duration) {
        self.total_elapsed += elapsed;
        self.steps.push(StepRecord {
            label,
            content,
            elapsed,
        });
    }

    #[must_use]
    pub fn total_elapsed_secs(&self) -> f64 {
        self.total_elapsed.as_secs_f64()
    }

    /// The final answer, once the session has produced it.
    #[must_use]
    pub fn final_answer(&self) -> Option<&StepRecord> {
        self.steps.last().filter(|s| s.is_final_answer())
    }
}

/// Drives reasoning sessions against one completion endpoint
#[derive(Clone)]
pub struct Reasoner {
    llm: Arc<dyn LlmService>,
    limits: SessionLimits,
}

impl Reasoner {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmService>, limits: SessionLimits) -> Self {
        Self { llm, limits }
    }

    #[must_use]
    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    /// Start a session and return its snapshots as they are produced.
    ///
    /// Each item holds every step so far. The stream yields once per
    /// reasoning step and once more for the final answer, then ends. Polling
    /// after the end keeps returning `None`.
    #[must_use]
    pub fn stream_session(&self, prompt: impl Into<String>) -> SessionStream {
        let session = Session::new(Arc::clone(&self.llm), self.limits, prompt.into());
        Box::pin(
            futures::stream::unfold(session, |mut session| async move {
                let snapshot = session.advance().await?;
                Some((snapshot, session))
            })
            .fuse(),
        )
    }

    /// Run a session to completion and return only its last snapshot.
    pub async fn run_session(&self, prompt: impl Into<String>) -> SessionResult {
        self.stream_session(prompt)
            .fold(SessionResult::default(), |_, snapshot| async move { snapshot })
            .await
    }
}

enum Stage {
    Reasoning,
    /// Carries the failure text when the loop stopped on a transport error
    Finalizing(Option<String>),
    Done,
}

struct Session {
    llm: Arc<dyn LlmService>,
    limits: SessionLimits,
    transcript: Vec<LlmMessage>,
    result: SessionResult,
    step_count: u32,
    stage: Stage,
}

impl Session {
    fn new(llm: Arc<dyn LlmService>, limits: SessionLimits, prompt: String) -> Self {
        tracing::info!(
            model = %llm.model_id(),
            prompt_chars = prompt.chars().count(),
            max_steps = limits.max_steps,
            "Starting reasoning session"
        );
        let transcript = vec![
            LlmMessage::system(SYSTEM_PROMPT),
            LlmMessage::user(prompt),
            LlmMessage::assistant(ASSISTANT_ACKNOWLEDGMENT),
        ];
        Self {
            llm,
            limits,
            transcript,
            result: SessionResult::default(),
            step_count: 0,
            stage: Stage::Reasoning,
        }
    }

    /// Perform the next call and return the updated snapshot, or `None` once
    /// the final answer has been delivered.
    async fn advance(&mut self) -> Option<SessionResult> {
        match std::mem::replace(&mut self.stage, Stage::Done) {
            Stage::Reasoning => self.stage = self.reason().await,
            Stage::Finalizing(failure) => self.finalize(failure).await,
            Stage::Done => return None,
        }
        Some(self.result.clone())
    }

    fn request(&self, max_tokens: u32) -> LlmRequest {
        LlmRequest::new(self.transcript.clone(), max_tokens)
            .with_temperature(TEMPERATURE)
            .json_mode()
    }

    async fn reason(&mut self) -> Stage {
        self.step_count += 1;
        let request = self.request(self.limits.step_max_tokens);

        let start = Instant::now();
        let (step, failed) = match self.llm.complete(&request).await {
            Ok(response) => (
                ReasoningStep::from_completion(&response.text, CallKind::Step),
                false,
            ),
            Err(e) => {
                tracing::warn!(step = self.step_count, error = %e, "Reasoning step failed");
                (ReasoningStep::from_error(CallKind::Step, &e), true)
            }
        };
        let elapsed = start.elapsed();

        tracing::debug!(
            step = self.step_count,
            title = %step.title,
            next_action = step.next_action.as_str(),
            elapsed_ms = %elapsed.as_millis(),
            "Reasoning step"
        );

        self.result.push(
            format!("Step {}: {}", self.step_count, step.title),
            step.content.clone(),
            elapsed,
        );
        self.transcript.push(LlmMessage::assistant(step.to_json()));

        if failed {
            Stage::Finalizing(Some(step.content))
        } else if step.is_final() || self.step_count >= self.limits.max_steps {
            if !step.is_final() {
                tracing::info!(steps = self.step_count, "Step cap reached, finalizing");
            }
            Stage::Finalizing(None)
        } else {
            Stage::Reasoning
        }
    }

    async fn finalize(&mut self, failure: Option<String>) {
        let (content, elapsed) = match failure {
            // The endpoint just failed; report that instead of calling it again.
            Some(message) => (message, Duration::ZERO),
            None => {
                self.transcript.push(LlmMessage::user(FINAL_ANSWER_REQUEST));
                let request = self.request(self.limits.final_max_tokens);

                let start = Instant::now();
                let content = match self.llm.complete(&request).await {
                    Ok(response) => ReasoningStep::answer_from_completion(&response.text),
                    Err(e) => {
                        tracing::warn!(error = %e, "Final answer failed");
                        ReasoningStep::from_error(CallKind::FinalAnswer, &e).content
                    }
                };
                (content, start.elapsed())
            }
        };

        self.result.push(FINAL_ANSWER_LABEL.to_string(), content, elapsed);

        tracing::info!(
            steps = self.step_count,
            total_ms = %self.result.total_elapsed.as_millis(),
            "Reasoning session finished"
        );
    }
}
