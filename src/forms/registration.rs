//! Worker registration form: what prospective servants fill in.

use crate::channels::ChoiceMenu;
use crate::error::{DefinitionError, ValidationError};

use super::model::{AGE_MAX, AGE_MIN, AnswerValue, FormDefinition, Step, SummaryTemplate, Validator};

pub const FORM_NAME: &str = "registration";

pub const SKILL_OPTIONS: [[&str; 2]; 3] = [
    ["Cleaning", "Cooking"],
    ["Laundry", "Child Care"],
    ["Elder Care", "All Skills"],
];

pub const WORK_TYPE_OPTIONS: [[&str; 2]; 2] = [["Living In", "Part Time"], ["Full Time", "Flexible"]];

/// Location names shorter than this are rejected.
const LOCATION_MIN_LEN: usize = 2;
/// Availability descriptions shorter than this are rejected.
const AVAILABILITY_MIN_LEN: usize = 3;

const INTRO: &str = "🏠 Welcome to Servant Agency Registration 🏠\n\n\
    Thank you for your interest in joining our team of professional servants!\n\n\
    Let's collect your information to find you the perfect job opportunity.";

const SKILLS_PROMPT: &str = "Now please select your Skill Set:\n\n\
    • 🧹 Cleaning - House cleaning & maintenance\n\
    • 🍳 Cooking - Meal preparation & cooking\n\
    • 👕 Laundry - Washing, ironing & clothing care\n\
    • 👶 Child Care - Baby sitting & child minding\n\
    • 👵 Elder Care - Senior assistance & care\n\
    • 🌟 All Skills - Comprehensive household management";

const AVAILABILITY_PROMPT: &str = "Please describe your Availability:\n\n\
    Examples:\n\
    • 'Immediately available'\n\
    • 'Available from next month'\n\
    • 'Weekdays 9 AM - 5 PM'\n\
    • 'Flexible schedule'\n\
    • 'Need 2 weeks notice'";

const WORK_TYPE_PROMPT: &str = "Now select your preferred Type of Work:\n\n\
    • 🏠 Living In - Reside at employer's home\n\
    • ⏱️ Part Time - Few hours daily/weekly\n\
    • 💼 Full Time - Regular working hours\n\
    • 🔄 Flexible - Adaptable to different schedules";

const CANCEL_TEXT: &str = "❌ Registration cancelled.\n\n\
    Type /start to begin registration again if you want to join our team.";

const HELP_TEXT: &str = "🤖 Servant Registration Bot Help\n\n\
    Use /start to begin your registration\n\
    Use /cancel to stop the current registration\n\n\
    Registration Process:\n\
    1. 📝 Personal Information (Name, Age)\n\
    2. 🛠️ Skill Set Selection\n\
    3. 📍 Location Details\n\
    4. 📅 Availability Information\n\
    5. 💼 Work Type Preference\n\n\
    We're excited to have you join our professional team!";

fn skill_description(skill: &str) -> &'static str {
    match skill {
        "Cleaning" => "🧹 Professional cleaning specialist",
        "Cooking" => "🍳 Skilled cook and meal preparer",
        "Laundry" => "👕 Laundry and fabric care expert",
        "Child Care" => "👶 Certified child care provider",
        "Elder Care" => "👵 Compassionate elderly caregiver",
        "All Skills" => "🌟 Comprehensive household manager",
        _ => "",
    }
}

fn acknowledge_name(value: &AnswerValue) -> String {
    format!("👤 Thank you, {value}!")
}

fn acknowledge_age(value: &AnswerValue) -> String {
    format!("✅ Age recorded: {value} years")
}

fn acknowledge_skills(value: &AnswerValue) -> String {
    let skill = value.to_string();
    format!("✅ Skills recorded: {skill}\n{}", skill_description(&skill))
}

fn acknowledge_location(value: &AnswerValue) -> String {
    format!("📍 Location recorded: {value}")
}

fn acknowledge_availability(_value: &AnswerValue) -> String {
    "✅ Availability recorded!".to_string()
}

fn reject_name(_err: &ValidationError) -> String {
    "❌ Please enter a valid full name (at least 2 characters):".to_string()
}

fn reject_age(err: &ValidationError) -> String {
    match err {
        ValidationError::NotANumber => "❌ Please enter a valid number for age:".to_string(),
        _ => format!("❌ Please enter a valid age ({AGE_MIN}-{AGE_MAX} years):"),
    }
}

fn reject_location(_err: &ValidationError) -> String {
    "❌ Please enter a valid location (city or area name):".to_string()
}

fn reject_availability(_err: &ValidationError) -> String {
    "❌ Please provide more details about your availability:".to_string()
}

/// Build the registration form.
pub fn registration_form() -> Result<FormDefinition, DefinitionError> {
    let steps = vec![
        Step::text("name", "Please enter your Full Name:", Validator::Name)
            .with_acknowledgement(acknowledge_name)
            .with_rejection(reject_name),
        Step::text("age", "Please enter your Age:", Validator::Age)
            .with_acknowledgement(acknowledge_age)
            .with_rejection(reject_age),
        Step::choice(
            "skills",
            SKILLS_PROMPT,
            ChoiceMenu::new(SKILL_OPTIONS).with_placeholder("Select your skills..."),
        )
        .with_acknowledgement(acknowledge_skills),
        Step::text(
            "location",
            "Please enter your Current Living Location (City/Area):",
            Validator::MinLength(LOCATION_MIN_LEN),
        )
        .with_acknowledgement(acknowledge_location)
        .with_rejection(reject_location),
        Step::text(
            "availability",
            AVAILABILITY_PROMPT,
            Validator::MinLength(AVAILABILITY_MIN_LEN),
        )
        .with_acknowledgement(acknowledge_availability)
        .with_rejection(reject_availability),
        Step::choice(
            "workType",
            WORK_TYPE_PROMPT,
            ChoiceMenu::new(WORK_TYPE_OPTIONS).with_placeholder("Select work type..."),
        ),
    ];

    let summary = SummaryTemplate::new("🎉 REGISTRATION COMPLETE! 🎉")
        .field("Name", "name")
        .field_with_suffix("Age", "age", "years")
        .field("Skills", "skills")
        .field("Location", "location")
        .field("Availability", "availability")
        .field("Work Type", "workType")
        .footer(
            "━━━━━━━━━━━━━━━━━━━━━━━━\n\n\
             ✅ Thank you for registering with us!\n\n\
             We will review your application and contact you shortly with potential \
             job opportunities that match your profile.\n\n\
             For any urgent inquiries, please contact our recruitment team.\n\n\
             Best regards,\n\
             Servant Agency Recruitment Team 🌟",
        );

    Ok(FormDefinition::new(FORM_NAME, steps, summary)?
        .with_intro(INTRO)
        .with_cancel_text(CANCEL_TEXT)
        .with_help_text(HELP_TEXT))
}
