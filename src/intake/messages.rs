//! Outbound message rendering.
//!
//! Every message the bot sends is built here from typed inputs — no
//! placeholder-token templates. Markup is Telegram HTML.

use crate::error::ValidationError;
use crate::intake::model::{LeadProfile, LeadRecord};
use crate::intake::step::DialogueStep;
use crate::intake::validate::{MAX_AGE, MIN_AGE};

/// Shown when a record has no username.
const NO_USERNAME: &str = "not provided";

/// Welcome for the guided flow. The first step prompt follows separately.
pub fn welcome_guided() -> String {
    "🇳🇴 Welcome!\n\n\
     You've reached a recruitment agency hiring for Norway! 🇳🇴\n\n\
     Salaries for our openings are 3300-7400€/month.\n\n\
     Let's fill in a short application — I'll ask a few questions."
        .to_string()
}

/// Welcome for the quick-form flow, with the one-message form example.
pub fn welcome_quick() -> String {
    "🇳🇴 Welcome!\n\n\
     You've reached a recruitment agency hiring for Norway! 🇳🇴\n\n\
     Salaries for our openings are 3300-7400€/month.\n\n\
     Fill in the application like this:\n\n\
     <b>1. Your city\n2. Your age</b>\n\
     Example: <i>Oslo, 30</i>"
        .to_string()
}

/// Prompt for the field a dialogue step is waiting on.
pub fn step_prompt(step: DialogueStep) -> &'static str {
    match step {
        DialogueStep::AwaitingName => "👤 What is your name?",
        DialogueStep::AwaitingAge => "📅 How old are you?",
        DialogueStep::AwaitingWorkplace => "🏭 Where do you currently work?",
        DialogueStep::AwaitingCitizenship => "🌍 What is your citizenship?",
        DialogueStep::Completed => "",
    }
}

/// Re-prompt after a failed answer; the step does not advance.
pub fn step_retry(step: DialogueStep, err: &ValidationError) -> String {
    match err {
        ValidationError::TooShort { field } => {
            format!("❌ That {field} looks too short. {}", step_prompt(step))
        }
        ValidationError::NotANumber | ValidationError::OutOfRange { .. } => {
            format!("{} {}", invalid_age(), step_prompt(step))
        }
    }
}

/// Quick-form format hint.
pub fn invalid_format() -> String {
    "❌ Wrong format. Send your details as: <b>City, Age</b>\nExample: <i>Oslo, 30</i>".to_string()
}

/// Age range hint, shared by both flows.
pub fn invalid_age() -> String {
    format!("❌ Please enter a valid age ({MIN_AGE} to {MAX_AGE}).")
}

/// Summary of an existing registration.
pub fn already_registered(record: &LeadRecord) -> String {
    let username = record
        .username
        .as_deref()
        .map(|u| format!("@{u}"))
        .unwrap_or_else(|| NO_USERNAME.to_string());

    let fields = match &record.profile {
        LeadProfile::Basic { city, age } => {
            format!("📍 City: {city}\n📅 Age: {age}")
        }
        LeadProfile::Extended {
            name,
            age,
            workplace,
            citizenship,
        } => format!(
            "👤 Name: {name}\n📅 Age: {age}\n🏭 Workplace: {workplace}\n🌍 Citizenship: {citizenship}"
        ),
    };

    format!("✅ You are already registered!\n\n{fields}\n📱 Username: {username}")
}

/// Sent once the application is saved.
pub fn form_completed() -> String {
    "✅ Your details have been saved! Our manager will contact you.".to_string()
}

/// Handoff text; sent together with the manager button.
pub fn contact_manager() -> String {
    "📞 To reach the manager, use the button below:".to_string()
}

/// Label for the manager contact button.
pub fn manager_button_label() -> String {
    "💬 Message the manager".to_string()
}

/// Profile URL for the manager handle; a leading `@` is stripped.
pub fn manager_url(handle: &str) -> String {
    format!("https://t.me/{}", handle.trim_start_matches('@'))
}

/// Nudge for users who message without starting.
pub fn use_start_hint() -> String {
    "👋 Please send /start to begin your application.".to_string()
}

/// Generic failure reply; the user may retry the same step.
pub fn generic_error() -> String {
    "❌ Something went wrong. Please try again later.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::model::LeadRecord;

    fn basic_record(username: Option<&str>) -> LeadRecord {
        LeadRecord::new(
            1,
            username.map(String::from),
            LeadProfile::Basic {
                city: "Oslo".into(),
                age: 30,
            },
        )
    }

    #[test]
    fn already_registered_includes_fields() {
        let text = already_registered(&basic_record(Some("jon_doe")));
        assert!(text.contains("City: Oslo"));
        assert!(text.contains("Age: 30"));
        assert!(text.contains("@jon_doe"));
    }

    #[test]
    fn already_registered_username_fallback() {
        let text = already_registered(&basic_record(None));
        assert!(text.contains("Username: not provided"));
        assert!(!text.contains('@'));
    }

    #[test]
    fn already_registered_extended_fields() {
        let record = LeadRecord::new(
            2,
            None,
            LeadProfile::Extended {
                name: "Jon".into(),
                age: 17,
                workplace: "Dock".into(),
                citizenship: "Norway".into(),
            },
        );
        let text = already_registered(&record);
        assert!(text.contains("Name: Jon"));
        assert!(text.contains("Workplace: Dock"));
        assert!(text.contains("Citizenship: Norway"));
    }

    #[test]
    fn manager_url_strips_at() {
        assert_eq!(manager_url("@manager"), "https://t.me/manager");
        assert_eq!(manager_url("manager"), "https://t.me/manager");
    }

    #[test]
    fn every_active_step_has_a_prompt() {
        use DialogueStep::*;
        for step in [AwaitingName, AwaitingAge, AwaitingWorkplace, AwaitingCitizenship] {
            assert!(!step_prompt(step).is_empty(), "{step} needs a prompt");
        }
    }

    #[test]
    fn retry_keeps_the_step_prompt_visible() {
        let retry = step_retry(
            DialogueStep::AwaitingAge,
            &ValidationError::OutOfRange { min: 16, max: 65 },
        );
        assert!(retry.contains("16 to 65"));
        assert!(retry.contains(step_prompt(DialogueStep::AwaitingAge)));
    }
}
