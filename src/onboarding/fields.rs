//! The fixed, ordered list of onboarding questions.

use serde::{Deserialize, Serialize};

use crate::database::models::CombatantProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Codename,
    Age,
    PhysicalCondition,
    Occupation,
    LivingSituation,
    RelationshipStatus,
    PrimaryMission,
    GreatestEnemy,
    PastDefeats,
    DailyRoutine,
    CoreValues,
    CommitmentLevel,
}

impl ProfileField {
    /// Ask order. Onboarding only ever moves forward through this list.
    pub const ORDER: [ProfileField; 12] = [
        ProfileField::Codename,
        ProfileField::Age,
        ProfileField::PhysicalCondition,
        ProfileField::Occupation,
        ProfileField::LivingSituation,
        ProfileField::RelationshipStatus,
        ProfileField::PrimaryMission,
        ProfileField::GreatestEnemy,
        ProfileField::PastDefeats,
        ProfileField::DailyRoutine,
        ProfileField::CoreValues,
        ProfileField::CommitmentLevel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::Codename => "codename",
            ProfileField::Age => "age",
            ProfileField::PhysicalCondition => "physical_condition",
            ProfileField::Occupation => "occupation",
            ProfileField::LivingSituation => "living_situation",
            ProfileField::RelationshipStatus => "relationship_status",
            ProfileField::PrimaryMission => "primary_mission",
            ProfileField::GreatestEnemy => "greatest_enemy",
            ProfileField::PastDefeats => "past_defeats",
            ProfileField::DailyRoutine => "daily_routine",
            ProfileField::CoreValues => "core_values",
            ProfileField::CommitmentLevel => "commitment_level",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ORDER.iter().copied().find(|field| field.as_str() == s)
    }

    /// 1-based position, for "question 3 of 12" style progress.
    pub fn position(&self) -> usize {
        Self::ORDER
            .iter()
            .position(|field| field == self)
            .map(|idx| idx + 1)
            .unwrap_or(0)
    }

    pub fn question(&self) -> &'static str {
        match self {
            ProfileField::Codename => "What do I call you, soldier? Give me your codename.",
            ProfileField::Age => "How many years have you survived so far?",
            ProfileField::PhysicalCondition => {
                "Report your physical condition. Training, injuries, energy. Be honest."
            }
            ProfileField::Occupation => "What is your trade? How do you earn your rations?",
            ProfileField::LivingSituation => "Describe your base of operations. Who lives there with you?",
            ProfileField::RelationshipStatus => "What alliances do you hold? Partner, family, none?",
            ProfileField::PrimaryMission => "What is the one mission you must win this year?",
            ProfileField::GreatestEnemy => {
                "Name your greatest enemy. The habit, fear or weakness that keeps beating you."
            }
            ProfileField::PastDefeats => "Tell me about a past defeat and what it cost you.",
            ProfileField::DailyRoutine => "Walk me through a typical day, from waking to sleep.",
            ProfileField::CoreValues => "What values will you not trade, no matter the pressure?",
            ProfileField::CommitmentLevel => {
                "How hard do you want me to push you: standard, intense, or ruthless?"
            }
        }
    }
}

impl std::fmt::Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated answer, ready to be written into its column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileAnswer {
    Text(String),
    Number(i64),
}

impl CombatantProfile {
    pub fn is_set(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::Codename => self.codename.is_some(),
            ProfileField::Age => self.age.is_some(),
            ProfileField::PhysicalCondition => self.physical_condition.is_some(),
            ProfileField::Occupation => self.occupation.is_some(),
            ProfileField::LivingSituation => self.living_situation.is_some(),
            ProfileField::RelationshipStatus => self.relationship_status.is_some(),
            ProfileField::PrimaryMission => self.primary_mission.is_some(),
            ProfileField::GreatestEnemy => self.greatest_enemy.is_some(),
            ProfileField::PastDefeats => self.past_defeats.is_some(),
            ProfileField::DailyRoutine => self.daily_routine.is_some(),
            ProfileField::CoreValues => self.core_values.is_some(),
            ProfileField::CommitmentLevel => self.commitment_level.is_some(),
        }
    }

    pub fn field_value(&self, field: ProfileField) -> Option<String> {
        match field {
            ProfileField::Codename => self.codename.clone(),
            ProfileField::Age => self.age.map(|age| age.to_string()),
            ProfileField::PhysicalCondition => self.physical_condition.clone(),
            ProfileField::Occupation => self.occupation.clone(),
            ProfileField::LivingSituation => self.living_situation.clone(),
            ProfileField::RelationshipStatus => self.relationship_status.clone(),
            ProfileField::PrimaryMission => self.primary_mission.clone(),
            ProfileField::GreatestEnemy => self.greatest_enemy.clone(),
            ProfileField::PastDefeats => self.past_defeats.clone(),
            ProfileField::DailyRoutine => self.daily_routine.clone(),
            ProfileField::CoreValues => self.core_values.clone(),
            ProfileField::CommitmentLevel => self.commitment_level.clone(),
        }
    }

    pub fn set_field(&mut self, field: ProfileField, answer: ProfileAnswer) {
        let text = match &answer {
            ProfileAnswer::Text(text) => text.clone(),
            ProfileAnswer::Number(n) => n.to_string(),
        };

        match field {
            ProfileField::Age => {
                self.age = match answer {
                    ProfileAnswer::Number(n) => Some(n),
                    ProfileAnswer::Text(text) => text.trim().parse().ok(),
                }
            }
            ProfileField::Codename => self.codename = Some(text),
            ProfileField::PhysicalCondition => self.physical_condition = Some(text),
            ProfileField::Occupation => self.occupation = Some(text),
            ProfileField::LivingSituation => self.living_situation = Some(text),
            ProfileField::RelationshipStatus => self.relationship_status = Some(text),
            ProfileField::PrimaryMission => self.primary_mission = Some(text),
            ProfileField::GreatestEnemy => self.greatest_enemy = Some(text),
            ProfileField::PastDefeats => self.past_defeats = Some(text),
            ProfileField::DailyRoutine => self.daily_routine = Some(text),
            ProfileField::CoreValues => self.core_values = Some(text),
            ProfileField::CommitmentLevel => self.commitment_level = Some(text),
        }
    }

    /// Recompute `profile_complete` from the answer columns.
    pub fn sync_completion(&mut self) -> bool {
        self.profile_complete = ProfileField::ORDER.iter().all(|field| self.is_set(*field));
        self.profile_complete
    }

    /// Answered fields in ask order, for prompt context.
    pub fn answered(&self) -> Vec<(ProfileField, String)> {
        ProfileField::ORDER
            .iter()
            .filter_map(|field| self.field_value(*field).map(|value| (*field, value)))
            .collect()
    }
}
