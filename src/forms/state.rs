//! Session state: progress of one conversation through a form.

use serde::{Deserialize, Serialize};

use super::model::{AnswerValue, Answers};

/// Mutable progress record for one in-flight conversation.
///
/// A default session is inactive: nothing has been asked yet and input is
/// ignored until the engine begins it. The index only moves forward.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    index: usize,
    answers: Answers,
    active: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the step awaiting an answer.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Reset to the first step with no answers and mark active.
    pub(crate) fn restart(&mut self) {
        self.index = 0;
        self.answers.clear();
        self.active = true;
    }

    /// Store an accepted answer and move to the next step.
    pub(crate) fn record(&mut self, key: &str, value: AnswerValue) {
        self.answers.insert(key.to_string(), value);
        self.index += 1;
    }

    /// Drop all progress, returning the answers collected so far.
    pub(crate) fn clear(&mut self) -> Answers {
        self.index = 0;
        self.active = false;
        std::mem::take(&mut self.answers)
    }
}
