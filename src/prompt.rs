//! Prompt assembly for the counselor, the habit nudge and the tactical
//! analysis.

use serde::Serialize;

use crate::database::models::{CombatantProfile, IntensityMode, WarLog};
use crate::disc::DiscType;
use crate::llm::{ChatMessage, Role};
use crate::onboarding::first_contact::hook_for;
use crate::onboarding::{next_field, ProfileField, TurnEvent};

const PERSONA: &str = "You are the Warfare Counselor, a hard-edged strategic mentor who treats \
personal growth as a military campaign. You speak in short, vivid sentences, use military \
metaphor sparingly, and always end with a concrete next action. Never mention that you are an AI model.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "variant", content = "field", rename_all = "snake_case")]
pub enum PromptVariant {
    FirstContact,
    Onboarding(ProfileField),
    Conversation,
}

/// Pick the prompt variant for this turn.
///
/// `Conversation` requires `profile_complete`; a stale flag on an otherwise
/// full profile re-asks the final question rather than skipping ahead.
pub fn select_variant(profile: Option<&CombatantProfile>, event: &TurnEvent) -> PromptVariant {
    if *event == TurnEvent::Greeted {
        return PromptVariant::FirstContact;
    }

    match profile {
        None => PromptVariant::FirstContact,
        Some(profile) => match next_field(profile) {
            Some(field) => PromptVariant::Onboarding(field),
            None if profile.profile_complete => PromptVariant::Conversation,
            None => PromptVariant::Onboarding(ProfileField::CommitmentLevel),
        },
    }
}

pub struct ChatPromptInput<'a> {
    pub profile: Option<&'a CombatantProfile>,
    pub event: &'a TurnEvent,
    pub intensity: IntensityMode,
    /// Per-request override: force the ruthless tone for this turn.
    pub ruthless: bool,
    pub history: &'a [ChatMessage],
    pub message: &'a str,
}

#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub variant: PromptVariant,
    pub messages: Vec<ChatMessage>,
}

pub fn build_chat_prompt(input: &ChatPromptInput<'_>) -> BuiltPrompt {
    let variant = select_variant(input.profile, input.event);
    let intensity = if input.ruthless {
        IntensityMode::Ruthless
    } else {
        input.intensity
    };

    let mut system = String::from(PERSONA);
    system.push_str("\n\n");
    system.push_str(tone_instruction(intensity));

    if let Some(disc) = input
        .profile
        .and_then(|p| p.disc_type.as_deref())
        .and_then(DiscType::from_str)
    {
        system.push_str(&format!(
            "\nThey tested as DISC type {} ({}). {}",
            disc.as_str(),
            disc.label(),
            disc.tone_guidance()
        ));
    }

    let codename = input.profile.and_then(|p| p.codename.as_deref());

    match variant {
        PromptVariant::FirstContact => {
            system.push_str(
                "\n\nMODE: FIRST CONTACT. You have never spoken to this person. Do not give advice yet. \
                 Introduce yourself in two sentences and ask for the codename they want to be called by.",
            );
        }
        PromptVariant::Onboarding(field) => {
            system.push_str(&format!(
                "\n\nMODE: ONBOARDING BRIEFING, question {} of {}. Do not give advice yet. \
                 Your only goal this turn is to get an answer to this question, asked in your own voice:\n\"{}\"",
                field.position(),
                ProfileField::ORDER.len(),
                field.question()
            ));
            if let Some(profile) = input.profile {
                let known = profile_summary(profile);
                if !known.is_empty() {
                    system.push_str("\nWhat you know so far:\n");
                    system.push_str(&known);
                }
            }
        }
        PromptVariant::Conversation => {
            system.push_str(
                "\n\nMODE: COUNSEL. The briefing is complete. Give strategic counsel on what they bring you, \
                 grounded in their profile:\n",
            );
            if let Some(profile) = input.profile {
                system.push_str(&profile_summary(profile));
            }
        }
    }

    if let Some(hook) = hook_for(input.event, codename, intensity) {
        system.push_str("\n\nNOTE: ");
        system.push_str(&hook);
    }

    let mut messages = Vec::with_capacity(input.history.len() + 2);
    messages.push(ChatMessage::system(system));
    messages.extend(
        input
            .history
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned(),
    );
    messages.push(ChatMessage::user(input.message));

    BuiltPrompt { variant, messages }
}

fn tone_instruction(mode: IntensityMode) -> &'static str {
    match mode {
        IntensityMode::Standard => "TONE: firm but warm. Challenge excuses without contempt.",
        IntensityMode::Intense => "TONE: intense. Push hard, name weaknesses plainly, demand commitment.",
        IntensityMode::Ruthless => {
            "TONE: ruthless. No comfort, no cushioning. Call out every excuse and issue orders, not suggestions."
        }
    }
}

fn profile_summary(profile: &CombatantProfile) -> String {
    profile
        .answered()
        .into_iter()
        .map(|(field, value)| format!("- {}: {}", field.as_str().replace('_', " "), value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt for a one- or two-sentence nudge after a missed habit.
pub fn build_nudge_prompt(
    habit: &str,
    missed_days: i64,
    reason: Option<&str>,
    codename: Option<&str>,
    intensity: IntensityMode,
) -> Vec<ChatMessage> {
    let system = format!(
        "{}\n\n{}\nWrite a single motivational nudge of at most two sentences. No greeting, no hashtags, no quotes.",
        PERSONA,
        tone_instruction(intensity)
    );

    let mut user = format!(
        "{} has missed the habit \"{}\" for {} day{}.",
        codename.unwrap_or("The recruit"),
        habit,
        missed_days,
        if missed_days == 1 { "" } else { "s" }
    );
    if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
        user.push_str(&format!(" Their stated reason: {}", reason.trim()));
    }

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Prompt asking for a JSON tactical analysis of recent war logs.
pub fn build_tactical_prompt(profile: Option<&CombatantProfile>, logs: &[WarLog]) -> Vec<ChatMessage> {
    let system = format!(
        "{}\n\nYou are writing a tactical analysis. Respond with one JSON object and nothing else, with keys: \
         \"summary\" (string), \"patterns\" (array of strings), \"strengths\" (array of strings), \
         \"weaknesses\" (array of strings), \"recommendations\" (array of strings), \
         \"threat_level\" (one of \"low\", \"moderate\", \"high\", \"critical\").",
        PERSONA
    );

    let mut user = String::new();
    if let Some(profile) = profile {
        user.push_str("PROFILE\n");
        user.push_str(&profile_summary(profile));
        user.push_str("\n\n");
    }
    user.push_str("WAR LOGS (newest first)\n");
    for log in logs {
        user.push_str(&format!(
            "- [{}] {}: {}",
            log.created_at.format("%Y-%m-%d"),
            log.title,
            log.dilemma
        ));
        if let Some(outcome) = &log.outcome {
            user.push_str(&format!(" | outcome: {}", outcome));
        }
        user.push('\n');
    }

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}
