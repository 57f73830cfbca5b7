//! Scripted beats around onboarding: the opening greeting, the
//! acknowledgement after each captured answer, and the hand-off once the
//! profile is complete. They are fed to the model as instructions, never
//! sent to the user verbatim.

use super::fields::ProfileField;
use super::sequencer::TurnEvent;
use crate::database::models::IntensityMode;

pub fn first_contact_greeting(mode: IntensityMode) -> &'static str {
    match mode {
        IntensityMode::Standard => {
            "Welcome to the war room. I'm your counselor. Before we plan any campaign, I need to know who I'm fighting beside."
        }
        IntensityMode::Intense => {
            "You made it to the war room. Good. Excuses stay at the door. First, I need to know who you are."
        }
        IntensityMode::Ruthless => {
            "Stand up straight. You came here because something is beating you. That ends now. Identify yourself."
        }
    }
}

/// Instruction line describing what just happened, if anything noteworthy did.
pub fn hook_for(event: &TurnEvent, codename: Option<&str>, mode: IntensityMode) -> Option<String> {
    match event {
        TurnEvent::Greeted => Some(format!(
            "This is first contact. Open with the spirit of: \"{}\" Then ask for their codename.",
            first_contact_greeting(mode)
        )),
        TurnEvent::Captured {
            field: ProfileField::Codename,
            next,
        } => Some(format!(
            "They just gave their codename: {}. Use it from now on.{}",
            codename.unwrap_or("unknown"),
            next.map(|_| " Keep the briefing moving.").unwrap_or_default()
        )),
        TurnEvent::Captured { field, next: None } => Some(format!(
            "They answered the final onboarding question ({}). The profile is complete: \
             declare the briefing over and issue their first order.",
            field
        )),
        TurnEvent::Captured { field, next: Some(_) } => Some(format!(
            "Acknowledge their answer about {} in one short line before the next question.",
            field.as_str().replace('_', " ")
        )),
        TurnEvent::Unanswered { field } => Some(format!(
            "Their last reply did not answer the {} question. Do not move on; ask it again, plainly.",
            field.as_str().replace('_', " ")
        )),
        TurnEvent::Conversing => None,
    }
}
