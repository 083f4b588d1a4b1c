//! Service-request intake form: what the agency's clients fill in.

use crate::channels::ChoiceMenu;
use crate::error::{DefinitionError, ValidationError};

use super::model::{AnswerValue, FormDefinition, Step, SummaryTemplate, Validator};

pub const FORM_NAME: &str = "intake";

pub const SERVICE_TYPES: [&str; 2] = ["Standard", "Dynamic"];

pub const SERVICES: [&str; 4] = [
    "Full House Work",
    "Cleaning the House",
    "Doing the Laundry",
    "More Services",
];

const INTRO: &str = "👋 Hello! Welcome to our Servant Agency!\n\n\
    We're here to help you with all your household needs. \
    Let's get started with your service request!";

const MORE_SERVICES: &str = "For additional services like:\n\
    • Cooking & Meal Prep 🍳\n\
    • Child/Elderly Care 👶👵\n\
    • Pet Care 🐕\n\
    • Gardening 🌿\n\
    • Other custom requirements\n\n\
    Our team will contact you to discuss your specific needs.";

const CANCEL_TEXT: &str = "❌ Conversation cancelled.\n\n\
    Type /start to begin again if you need our services.";

const HELP_TEXT: &str = "🤖 Servant Agency Bot Help:\n\n\
    Use /start to begin a new service request\n\
    Use /cancel to stop the current conversation\n\n\
    Our services include:\n\
    • Full House Work\n\
    • Cleaning Services\n\
    • Laundry Services\n\
    • Custom Requirements\n\n\
    We're here to help with all your household needs!";

fn service_type_description(kind: &str) -> &'static str {
    match kind {
        "Standard" => "✅ Fixed schedule, regular services",
        "Dynamic" => "🔄 Flexible timing, on-demand services",
        _ => "",
    }
}

fn service_description(service: &str) -> &'static str {
    match service {
        "Full House Work" => "🧹 Complete household maintenance",
        "Cleaning the House" => "🏠 Deep cleaning and organization",
        "Doing the Laundry" => "👕 Washing, drying, and folding",
        "More Services" => "📋 Additional custom services",
        _ => "Service noted",
    }
}

fn acknowledge_service_type(value: &AnswerValue) -> String {
    let kind = value.to_string();
    format!(
        "Great! You selected {kind} service.\n{}",
        service_type_description(&kind)
    )
}

fn acknowledge_service(value: &AnswerValue) -> String {
    let service = value.to_string();
    let line = format!("✅ {}", service_description(&service));
    if service == "More Services" {
        format!("{MORE_SERVICES}\n\n{line}")
    } else {
        line
    }
}

fn acknowledge_name(value: &AnswerValue) -> String {
    format!("Thank you, {value}!")
}

fn reject_name(_err: &ValidationError) -> String {
    "Please enter a valid full name (at least 2 characters):".to_string()
}

/// Build the intake form.
pub fn intake_form() -> Result<FormDefinition, DefinitionError> {
    let steps = vec![
        Step::choice(
            "serviceType",
            "Please choose your service type:",
            ChoiceMenu::new([SERVICE_TYPES]).with_placeholder("Choose service type..."),
        )
        .with_acknowledgement(acknowledge_service_type),
        Step::choice(
            "services",
            "Now please choose the specific services you need:",
            ChoiceMenu::new(SERVICES.map(|s| [s])).with_placeholder("Select services needed..."),
        )
        .with_acknowledgement(acknowledge_service),
        Step::text("name", "Please enter your full name:", Validator::Name)
            .with_acknowledgement(acknowledge_name)
            .with_rejection(reject_name),
        Step::text(
            "phone",
            "Please enter your phone number:\n(Format: +1234567890 or 1234567890)",
            Validator::FreeText,
        ),
    ];

    let summary = SummaryTemplate::new(
        "✨ Thank you, {name}!\n\n📋 Here's your service request summary:",
    )
    .field("Service Type", "serviceType")
    .field("Service", "services")
    .field("Contact", "phone")
    .footer(
        "📞 We will contact you shortly to confirm your booking and discuss details.\n\n\
         Thank you for choosing our Servant Agency! 🌟",
    );

    Ok(FormDefinition::new(FORM_NAME, steps, summary)?
        .with_intro(INTRO)
        .with_cancel_text(CANCEL_TEXT)
        .with_help_text(HELP_TEXT))
}
