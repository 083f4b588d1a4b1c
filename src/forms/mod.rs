//! Linear forms: ordered question/answer flows ending in a summary.
//!
//! A form is data (`FormDefinition`): an ordered list of steps, each with a
//! prompt, an optional fixed-choice menu and a validator. The `FormEngine`
//! walks a `Session` through it. The two agency forms live in `intake` and
//! `registration`.

pub mod engine;
pub mod intake;
pub mod model;
pub mod registration;
pub mod state;

pub use engine::{FormEngine, FormStatus, Transition};
pub use intake::intake_form;
pub use model::{
    AnswerValue, Answers, FormDefinition, Step, SummaryField, SummaryTemplate, Validator,
};
pub use registration::registration_form;
pub use state::Session;
