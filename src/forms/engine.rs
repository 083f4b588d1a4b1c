//! Linear form engine: walks a session through a form one step at a time.
//!
//! The engine performs no I/O. Each operation mutates the session and
//! returns a [`Transition`] carrying the status plus the replies the caller
//! must deliver, in order.

use std::sync::Arc;

use crate::channels::OutgoingResponse;
use crate::error::ValidationError;

use super::model::{Answers, FormDefinition, Step};
use super::state::Session;

/// Outcome of one engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    /// Waiting for the answer to the step at `session.index()`.
    InProgress,
    /// The answer failed validation; the same step was asked again.
    Rejected(ValidationError),
    /// A choice step received text that is not one of its options.
    Unmatched,
    /// Input arrived for a session that has not been started.
    Inactive,
    /// Every step answered. Carries the final record.
    Completed(Answers),
    Cancelled,
}

/// Status plus outbound messages produced by an engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub status: FormStatus,
    pub replies: Vec<OutgoingResponse>,
}

impl Transition {
    fn new(status: FormStatus, replies: Vec<OutgoingResponse>) -> Self {
        Self { status, replies }
    }

    fn silent(status: FormStatus) -> Self {
        Self::new(status, Vec::new())
    }

    /// Whether the session ended with this transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            FormStatus::Completed(_) | FormStatus::Cancelled
        )
    }
}

/// Drives sessions through one [`FormDefinition`].
///
/// Invalid answers are re-asked indefinitely; there is no retry cap.
#[derive(Debug, Clone)]
pub struct FormEngine {
    form: Arc<FormDefinition>,
}

impl FormEngine {
    pub fn new(form: FormDefinition) -> Self {
        Self {
            form: Arc::new(form),
        }
    }

    pub fn form(&self) -> &FormDefinition {
        &self.form
    }

    /// Start (or restart) the form: back to step 0 with no answers.
    pub fn begin(&self, session: &mut Session) -> Transition {
        session.restart();
        tracing::debug!(form = self.form.name(), "Form started");

        // Forms have at least one step by construction.
        let first = &self.form.steps()[0];
        let intro = self.form.intro().map(str::to_string);
        Transition::new(FormStatus::InProgress, vec![prompt_for(first, intro)])
    }

    /// Feed one raw answer to the current step.
    pub fn submit(&self, session: &mut Session, raw: &str) -> Transition {
        if !session.is_active() {
            return Transition::silent(FormStatus::Inactive);
        }

        let Some(step) = self.form.step(session.index()) else {
            // Completion clears the session, so an active session always
            // points at a real step.
            session.clear();
            return Transition::silent(FormStatus::Inactive);
        };

        if !step.accepts_choice(raw) {
            tracing::debug!(
                form = self.form.name(),
                step = %step.key,
                "Input is not one of the offered choices; ignoring"
            );
            return Transition::silent(FormStatus::Unmatched);
        }

        let value = match step.validate(raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(
                    form = self.form.name(),
                    step = %step.key,
                    error = %err,
                    "Answer rejected"
                );
                let notice = OutgoingResponse::text(step.rejection(&err));
                return Transition::new(
                    FormStatus::Rejected(err),
                    vec![notice, prompt_for(step, None)],
                );
            }
        };

        let acknowledgement = step.acknowledge.map(|ack| ack(&value));
        session.record(&step.key, value);

        if let Some(next) = self.form.step(session.index()) {
            return Transition::new(
                FormStatus::InProgress,
                vec![prompt_for(next, acknowledgement)],
            );
        }

        let answers = session.clear();
        let summary = self.form.summary().render(&answers);
        tracing::info!(
            form = self.form.name(),
            answers = %serde_json::to_string(&answers).unwrap_or_default(),
            "Form completed"
        );

        Transition::new(
            FormStatus::Completed(answers),
            vec![OutgoingResponse::text(summary).with_keyboard_removed()],
        )
    }

    /// Abandon the form from any step.
    pub fn cancel(&self, session: &mut Session) -> Transition {
        let was_active = session.is_active();
        let step = session.index();
        session.clear();
        if was_active {
            tracing::info!(form = self.form.name(), step, "Form cancelled");
        }

        let reply = OutgoingResponse::text(self.form.cancel_text()).with_keyboard_removed();
        Transition::new(FormStatus::Cancelled, vec![reply])
    }
}

/// The message asking `step`, optionally led by another paragraph.
/// Choice steps show their menu; free-text steps collapse any menu.
fn prompt_for(step: &Step, lead: Option<String>) -> OutgoingResponse {
    let content = match lead {
        Some(lead) => format!("{lead}\n\n{}", step.prompt),
        None => step.prompt.clone(),
    };
    let reply = OutgoingResponse::text(content);

    match &step.menu {
        Some(menu) if step.is_choice() => reply.with_menu(menu.clone()),
        _ => reply.with_keyboard_removed(),
    }
}
