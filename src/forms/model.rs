//! Form data models: steps, validators, answers and the summary template.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::channels::ChoiceMenu;
use crate::error::{DefinitionError, ValidationError};

/// Minimum length of a name, in characters.
pub const NAME_MIN_LEN: usize = 2;
/// Youngest accepted age.
pub const AGE_MIN: i64 = 16;
/// Oldest accepted age.
pub const AGE_MAX: i64 = 70;

/// Rendered in place of an answer that was never collected.
const NOT_PROVIDED: &str = "Not provided";

/// A validated answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for AnswerValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

/// Collected answers keyed by step key, in step order.
pub type Answers = IndexMap<String, AnswerValue>;

/// How a step checks raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Trimmed, at least [`NAME_MIN_LEN`] characters.
    Name,
    /// Trimmed integer within [`AGE_MIN`]..=[`AGE_MAX`].
    Age,
    /// Trimmed, at least `n` characters.
    MinLength(usize),
    /// Accepted verbatim; the step's menu is the only gate.
    Choice,
    /// Trimmed, anything accepted (including empty).
    FreeText,
}

impl Validator {
    pub fn validate(&self, raw: &str) -> Result<AnswerValue, ValidationError> {
        match self {
            Self::Name => min_length(raw, NAME_MIN_LEN),
            Self::MinLength(min) => min_length(raw, *min),
            Self::Age => {
                let age: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ValidationError::NotANumber)?;
                if !(AGE_MIN..=AGE_MAX).contains(&age) {
                    return Err(ValidationError::OutOfRange {
                        min: AGE_MIN,
                        max: AGE_MAX,
                    });
                }
                Ok(AnswerValue::Number(age))
            }
            Self::Choice => Ok(AnswerValue::Text(raw.to_string())),
            Self::FreeText => Ok(AnswerValue::Text(raw.trim().to_string())),
        }
    }
}

fn min_length(raw: &str, min: usize) -> Result<AnswerValue, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < min {
        return Err(ValidationError::TooShort { min });
    }
    Ok(AnswerValue::Text(trimmed.to_string()))
}

/// Renders the line echoed back once a step's answer is accepted.
pub type Acknowledge = fn(&AnswerValue) -> String;

/// Renders the line sent when a step's answer fails validation.
pub type Reject = fn(&ValidationError) -> String;

/// One question of a form.
#[derive(Debug, Clone)]
pub struct Step {
    pub key: String,
    pub prompt: String,
    /// Fixed choices; `None` for free-text steps.
    pub menu: Option<ChoiceMenu>,
    pub validator: Validator,
    pub acknowledge: Option<Acknowledge>,
    pub reject: Option<Reject>,
}

impl Step {
    /// A free-text step.
    pub fn text(key: &str, prompt: &str, validator: Validator) -> Self {
        Self {
            key: key.to_string(),
            prompt: prompt.to_string(),
            menu: None,
            validator,
            acknowledge: None,
            reject: None,
        }
    }

    /// A fixed-choice step, answered by picking from `menu`.
    pub fn choice(key: &str, prompt: &str, menu: ChoiceMenu) -> Self {
        Self {
            key: key.to_string(),
            prompt: prompt.to_string(),
            menu: Some(menu),
            validator: Validator::Choice,
            acknowledge: None,
            reject: None,
        }
    }

    pub fn with_acknowledgement(mut self, acknowledge: Acknowledge) -> Self {
        self.acknowledge = Some(acknowledge);
        self
    }

    pub fn with_rejection(mut self, reject: Reject) -> Self {
        self.reject = Some(reject);
        self
    }

    /// The line telling the user why `err` happened.
    pub fn rejection(&self, err: &ValidationError) -> String {
        match self.reject {
            Some(reject) => reject(err),
            None => format!("❌ That answer was not accepted ({err}). Please try again."),
        }
    }

    /// Enumerated options; empty for free-text steps.
    pub fn choices(&self) -> impl Iterator<Item = &str> {
        self.menu.iter().flat_map(|m| m.options())
    }

    pub fn is_choice(&self) -> bool {
        self.menu.as_ref().is_some_and(|m| !m.is_empty())
    }

    /// Whether `raw` passes the choice gate. Free-text steps accept all.
    pub fn accepts_choice(&self, raw: &str) -> bool {
        match &self.menu {
            Some(menu) if !menu.is_empty() => menu.contains(raw),
            _ => true,
        }
    }

    pub fn validate(&self, raw: &str) -> Result<AnswerValue, ValidationError> {
        self.validator.validate(raw)
    }
}

/// One `label: value` line of the completion summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryField {
    pub label: String,
    pub key: String,
    /// Appended after a provided value, e.g. a unit.
    pub suffix: Option<String>,
}

/// Completion summary: header, labeled fields, footer.
///
/// Header and footer may reference answers as `{key}`.
#[derive(Debug, Clone, Default)]
pub struct SummaryTemplate {
    pub header: String,
    pub fields: Vec<SummaryField>,
    pub footer: String,
}

impl SummaryTemplate {
    pub fn new(header: &str) -> Self {
        Self {
            header: header.to_string(),
            ..Default::default()
        }
    }

    pub fn field(mut self, label: &str, key: &str) -> Self {
        self.fields.push(SummaryField {
            label: label.to_string(),
            key: key.to_string(),
            suffix: None,
        });
        self
    }

    /// A field whose value is followed by `suffix`, as in `30 years`.
    pub fn field_with_suffix(mut self, label: &str, key: &str, suffix: &str) -> Self {
        self.fields.push(SummaryField {
            label: label.to_string(),
            key: key.to_string(),
            suffix: Some(suffix.to_string()),
        });
        self
    }

    pub fn footer(mut self, footer: &str) -> Self {
        self.footer = footer.to_string();
        self
    }

    pub fn render(&self, answers: &Answers) -> String {
        let lines: Vec<String> = self
            .fields
            .iter()
            .map(|f| {
                let value = match (answers.get(&f.key), &f.suffix) {
                    (Some(value), Some(suffix)) => format!("{value} {suffix}"),
                    (Some(value), None) => value.to_string(),
                    (None, _) => NOT_PROVIDED.to_string(),
                };
                format!("• {}: {}", f.label, value)
            })
            .collect();

        let sections = [
            fill_placeholders(&self.header, answers),
            lines.join("\n"),
            fill_placeholders(&self.footer, answers),
        ];
        sections
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Replace `{key}` with the matching answer in one pass over `template`.
/// Inserted answers are never scanned again; unknown keys stay as written.
fn fill_placeholders(template: &str, answers: &Answers) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let value = after
            .find('}')
            .and_then(|close| answers.get(&after[..close]).map(|v| (close, v)));
        match value {
            Some((close, value)) => {
                out.push_str(&value.to_string());
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// An immutable, ordered list of steps plus the copy around them.
#[derive(Debug, Clone)]
pub struct FormDefinition {
    name: String,
    intro: Option<String>,
    steps: Vec<Step>,
    summary: SummaryTemplate,
    cancel_text: String,
    help_text: String,
}

impl FormDefinition {
    /// Build a form, rejecting empty step lists and duplicate keys.
    pub fn new(
        name: &str,
        steps: Vec<Step>,
        summary: SummaryTemplate,
    ) -> Result<Self, DefinitionError> {
        if steps.is_empty() {
            return Err(DefinitionError::Empty {
                form: name.to_string(),
            });
        }

        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.key.as_str()) {
                return Err(DefinitionError::DuplicateKey {
                    form: name.to_string(),
                    key: step.key.clone(),
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            intro: None,
            steps,
            summary,
            cancel_text: "❌ Conversation cancelled.\n\nType /start to begin again.".to_string(),
            help_text: "Use /start to begin\nUse /cancel to stop the current conversation"
                .to_string(),
        })
    }

    /// Text shown above the first prompt.
    pub fn with_intro(mut self, intro: &str) -> Self {
        self.intro = Some(intro.to_string());
        self
    }

    pub fn with_cancel_text(mut self, text: &str) -> Self {
        self.cancel_text = text.to_string();
        self
    }

    pub fn with_help_text(mut self, text: &str) -> Self {
        self.help_text = text.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn intro(&self) -> Option<&str> {
        self.intro.as_deref()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn summary(&self) -> &SummaryTemplate {
        &self.summary
    }

    pub fn cancel_text(&self) -> &str {
        &self.cancel_text
    }

    pub fn help_text(&self) -> &str {
        &self.help_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validator() {
        assert_eq!(
            Validator::Name.validate("A"),
            Err(ValidationError::TooShort { min: 2 })
        );
        assert_eq!(Validator::Name.validate("Al"), Ok("Al".into()));
        assert_eq!(Validator::Name.validate("  Bob  "), Ok("Bob".into()));
        // Whitespace does not count towards the minimum.
        assert!(Validator::Name.validate("  A  ").is_err());
    }

    #[test]
    fn name_length_counts_characters() {
        assert_eq!(Validator::Name.validate("Zé"), Ok("Zé".into()));
        assert!(Validator::Name.validate("é").is_err());
    }

    #[test]
    fn age_validator_bounds() {
        let out_of_range = Err(ValidationError::OutOfRange { min: 16, max: 70 });
        assert_eq!(Validator::Age.validate("15"), out_of_range);
        assert_eq!(Validator::Age.validate("16"), Ok(AnswerValue::Number(16)));
        assert_eq!(Validator::Age.validate("70"), Ok(AnswerValue::Number(70)));
        assert_eq!(Validator::Age.validate("71"), out_of_range);
    }

    #[test]
    fn age_validator_parse_failures() {
        assert_eq!(Validator::Age.validate("abc"), Err(ValidationError::NotANumber));
        assert_eq!(Validator::Age.validate("30.5"), Err(ValidationError::NotANumber));
        assert_eq!(Validator::Age.validate(""), Err(ValidationError::NotANumber));
        assert_eq!(Validator::Age.validate(" 30 "), Ok(AnswerValue::Number(30)));
    }

    #[test]
    fn validation_error_messages() {
        assert_eq!(ValidationError::NotANumber.to_string(), "not a number");
        assert_eq!(
            ValidationError::OutOfRange { min: 16, max: 70 }.to_string(),
            "out of range"
        );
        assert_eq!(
            ValidationError::TooShort { min: 3 }.to_string(),
            "must be at least 3 characters"
        );
    }

    #[test]
    fn min_length_validator() {
        let v = Validator::MinLength(3);
        assert!(v.validate("ab").is_err());
        assert!(v.validate("  ab  ").is_err());
        assert_eq!(v.validate(" now "), Ok("now".into()));
    }

    #[test]
    fn choice_and_free_text_validators() {
        assert_eq!(Validator::Choice.validate(" Full Time"), Ok(" Full Time".into()));
        assert_eq!(Validator::FreeText.validate(" 555 "), Ok("555".into()));
        assert_eq!(Validator::FreeText.validate(""), Ok("".into()));
    }

    #[test]
    fn choice_gate_is_exact() {
        let step = Step::choice("kind", "Pick", ChoiceMenu::new([["Standard", "Dynamic"]]));
        assert!(step.is_choice());
        assert!(step.accepts_choice("Dynamic"));
        assert!(!step.accepts_choice("dynamic"));
        assert_eq!(step.choices().collect::<Vec<_>>(), ["Standard", "Dynamic"]);

        let free = Step::text("name", "Name?", Validator::Name);
        assert!(!free.is_choice());
        assert!(free.accepts_choice("anything"));
        assert_eq!(free.choices().count(), 0);
    }

    #[test]
    fn answer_value_serde_is_untagged() {
        let mut answers = Answers::new();
        answers.insert("name".into(), "Ann".into());
        answers.insert("age".into(), AnswerValue::Number(30));

        let json = serde_json::to_value(&answers).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Ann", "age": 30}));

        let keys: Vec<&str> = answers.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "age"]);
        assert_eq!(answers["age"], AnswerValue::Number(30));
        assert_eq!(answers["name"].to_string(), "Ann");
    }

    #[test]
    fn definition_rejects_duplicate_keys() {
        let steps = vec![
            Step::text("name", "Name?", Validator::Name),
            Step::text("name", "Again?", Validator::Name),
        ];
        let err = FormDefinition::new("dup", steps, SummaryTemplate::default()).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateKey {
                form: "dup".into(),
                key: "name".into()
            }
        );
    }

    #[test]
    fn definition_rejects_empty_form() {
        let err = FormDefinition::new("empty", vec![], SummaryTemplate::default()).unwrap_err();
        assert_eq!(err, DefinitionError::Empty { form: "empty".into() });
    }

    #[test]
    fn summary_renders_labeled_fields_in_order() {
        let template = SummaryTemplate::new("Thanks, {name}!")
            .field("Name", "name")
            .field("Age", "age")
            .field("Phone", "phone")
            .footer("Bye");

        let mut answers = Answers::new();
        answers.insert("age".into(), AnswerValue::Number(30));
        answers.insert("name".into(), "Ann".into());

        assert_eq!(
            template.render(&answers),
            "Thanks, Ann!\n\n• Name: Ann\n• Age: 30\n• Phone: Not provided\n\nBye"
        );
    }

    #[test]
    fn summary_without_header_or_footer() {
        let template = SummaryTemplate::default().field("Name", "name");
        let mut answers = Answers::new();
        answers.insert("name".into(), "Ann".into());
        assert_eq!(template.render(&answers), "• Name: Ann");
    }

    #[test]
    fn summary_suffix_only_follows_provided_values() {
        let template = SummaryTemplate::default()
            .field_with_suffix("Age", "age", "years")
            .field_with_suffix("Height", "height", "cm");
        let mut answers = Answers::new();
        answers.insert("age".into(), AnswerValue::Number(30));
        assert_eq!(
            template.render(&answers),
            "• Age: 30 years\n• Height: Not provided"
        );
    }

    #[test]
    fn answers_are_inserted_literally() {
        let template = SummaryTemplate::new("Thank you, {name}! We will call {phone}.")
            .footer("{missing} {name");
        let mut answers = Answers::new();
        answers.insert("name".into(), "{phone}".into());
        answers.insert("phone".into(), "5550001".into());

        let rendered = template.render(&answers);
        assert!(rendered.starts_with("Thank you, {phone}! We will call 5550001."));
        assert!(rendered.ends_with("{missing} {name"));
    }

    #[test]
    fn nested_brace_before_placeholder() {
        let template = SummaryTemplate::new("{{name}}");
        let mut answers = Answers::new();
        answers.insert("name".into(), "Ann".into());
        assert_eq!(template.render(&answers), "{Ann}");
    }

    #[test]
    fn rejection_uses_step_copy_when_set() {
        fn age_copy(err: &ValidationError) -> String {
            match err {
                ValidationError::NotANumber => "numbers only".to_string(),
                _ => "wrong age".to_string(),
            }
        }

        let plain = Step::text("age", "Age?", Validator::Age);
        assert_eq!(
            plain.rejection(&ValidationError::NotANumber),
            "❌ That answer was not accepted (not a number). Please try again."
        );

        let custom = plain.with_rejection(age_copy);
        assert_eq!(custom.rejection(&ValidationError::NotANumber), "numbers only");
        let err = custom.validate("90").unwrap_err();
        assert_eq!(custom.rejection(&err), "wrong age");
    }
}
