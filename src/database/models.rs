use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How hard the counselor pushes. Mirrored on `users.intensity_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityMode {
    #[default]
    Standard,
    Intense,
    Ruthless,
}

impl IntensityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntensityMode::Standard => "standard",
            IntensityMode::Intense => "intense",
            IntensityMode::Ruthless => "ruthless",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(IntensityMode::Standard),
            "intense" => Some(IntensityMode::Intense),
            "ruthless" => Some(IntensityMode::Ruthless),
            _ => None,
        }
    }
}

impl std::fmt::Display for IntensityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub codename: Option<String>,
    pub intensity_mode: String,
    pub onboarding_complete: bool,
    pub subscription_status: String,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn intensity(&self) -> IntensityMode {
        IntensityMode::from_str(&self.intensity_mode).unwrap_or_default()
    }
}

/// Onboarding answers, one row per user.
///
/// `profile_complete` is derived from the answer columns and is only ever
/// written through [`CombatantProfile::sync_completion`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct CombatantProfile {
    pub user_id: String,
    pub codename: Option<String>,
    pub age: Option<i64>,
    pub physical_condition: Option<String>,
    pub occupation: Option<String>,
    pub living_situation: Option<String>,
    pub relationship_status: Option<String>,
    pub primary_mission: Option<String>,
    pub greatest_enemy: Option<String>,
    pub past_defeats: Option<String>,
    pub daily_routine: Option<String>,
    pub core_values: Option<String>,
    pub commitment_level: Option<String>,
    pub disc_type: Option<String>,
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CombatantProfile {
    pub fn empty(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatRecord {
    pub id: i64,
    pub user_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WarLog {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub dilemma: String,
    pub counsel: Option<String>,
    pub outcome: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ritual {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub streak: i64,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WarCodeFragment {
    pub id: i64,
    pub user_id: String,
    pub fragment: String,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HabitNudge {
    pub id: i64,
    pub user_id: String,
    pub habit: String,
    pub missed_days: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Active,
    Completed,
    Abandoned,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::Active => "active",
            MissionStatus::Completed => "completed",
            MissionStatus::Abandoned => "abandoned",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Mission {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub due_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub target_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Decision {
    pub id: i64,
    pub user_id: String,
    pub question: String,
    pub choice: Option<String>,
    pub rationale: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CheckIn {
    pub id: i64,
    pub user_id: String,
    pub mood: i64,
    pub energy: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
