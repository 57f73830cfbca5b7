//! Onboarding: the combatant profile questionnaire, asked one field per chat
//! turn in a fixed order.

pub mod extract;
pub mod fields;
pub mod first_contact;
pub mod sequencer;

pub use fields::{ProfileAnswer, ProfileField};
pub use sequencer::{advance, next_field, stage_for, Advance, OnboardingStage, TurnEvent};
