//! Forward-only onboarding state machine.
//!
//! The stage is a pure function of the profile: no profile means first
//! contact, otherwise the first unset field in [`ProfileField::ORDER`] is the
//! question being asked, and a profile with every field set is complete.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::extract::extract_answer;
use super::fields::ProfileField;
use crate::database::models::CombatantProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "field", rename_all = "snake_case")]
pub enum OnboardingStage {
    FirstContact,
    Collecting(ProfileField),
    Complete,
}

/// First unset field in ask order.
pub fn next_field(profile: &CombatantProfile) -> Option<ProfileField> {
    ProfileField::ORDER
        .iter()
        .copied()
        .find(|field| !profile.is_set(*field))
}

pub fn stage_for(profile: Option<&CombatantProfile>) -> OnboardingStage {
    match profile {
        None => OnboardingStage::FirstContact,
        Some(profile) => match next_field(profile) {
            Some(field) => OnboardingStage::Collecting(field),
            None => OnboardingStage::Complete,
        },
    }
}

/// What a single user message did to the onboarding state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// No profile existed and the message carried no codename.
    Greeted,
    /// `field` was captured; `next` is the following question, if any.
    Captured {
        field: ProfileField,
        next: Option<ProfileField>,
    },
    /// The reply did not yield a usable answer; `field` is asked again.
    Unanswered { field: ProfileField },
    /// Onboarding was already complete.
    Conversing,
}

#[derive(Debug, Clone)]
pub struct Advance {
    pub profile: CombatantProfile,
    pub event: TurnEvent,
    /// True when the profile differs from what was passed in and needs saving.
    pub changed: bool,
}

impl Advance {
    pub fn stage(&self) -> OnboardingStage {
        stage_for(Some(&self.profile))
    }
}

/// Apply one user message to the profile.
///
/// Only the pending field is ever written, so answers can't land out of
/// order. On first contact the message is scanned for an unprompted
/// codename ("I'm ___", "call me ___"); the empty profile is still created
/// so the next turn asks for the codename explicitly.
pub fn advance(
    profile: Option<CombatantProfile>,
    user_id: &str,
    message: &str,
    now: DateTime<Utc>,
) -> Advance {
    let stage = stage_for(profile.as_ref());
    let first_contact = profile.is_none();
    let mut profile = profile.unwrap_or_else(|| CombatantProfile::empty(user_id, now));

    let field = match stage {
        OnboardingStage::Complete => {
            let changed = !profile.profile_complete;
            profile.sync_completion();
            return Advance {
                profile,
                event: TurnEvent::Conversing,
                changed,
            };
        }
        OnboardingStage::FirstContact => ProfileField::Codename,
        OnboardingStage::Collecting(field) => field,
    };

    match extract_answer(field, message, !first_contact) {
        Some(answer) => {
            debug!("Captured {} for {}", field, user_id);
            profile.set_field(field, answer);
            profile.sync_completion();
            profile.updated_at = now;
            Advance {
                event: TurnEvent::Captured {
                    field,
                    next: next_field(&profile),
                },
                profile,
                changed: true,
            }
        }
        None if first_contact => Advance {
            profile,
            event: TurnEvent::Greeted,
            changed: true,
        },
        None => {
            let changed = profile.profile_complete;
            profile.sync_completion();
            Advance {
                profile,
                event: TurnEvent::Unanswered { field },
                changed,
            }
        }
    }
}
