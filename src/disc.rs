//! DISC personality quiz scoring.
//!
//! Five questions, each answered with one of the four types. Every question
//! carries a weight; a type's score is its share of the total weight as a
//! whole percentage.

use serde::{Deserialize, Serialize};

use crate::error::{CounselorError, CounselorResult};

pub const QUESTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscType {
    D,
    I,
    S,
    C,
}

impl DiscType {
    /// Tie-break order.
    pub const ALL: [DiscType; 4] = [DiscType::D, DiscType::I, DiscType::S, DiscType::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscType::D => "D",
            DiscType::I => "I",
            DiscType::S => "S",
            DiscType::C => "C",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D" => Some(DiscType::D),
            "I" => Some(DiscType::I),
            "S" => Some(DiscType::S),
            "C" => Some(DiscType::C),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DiscType::D => "Dominant",
            DiscType::I => "Influential",
            DiscType::S => "Steady",
            DiscType::C => "Conscientious",
        }
    }

    /// How the counselor should pitch its advice to this type.
    pub fn tone_guidance(&self) -> &'static str {
        match self {
            DiscType::D => "Be direct and brief. Lead with the objective and the order; skip the cushioning.",
            DiscType::I => "Keep energy high. Frame orders as a story of victory and recognition.",
            DiscType::S => "Be steady and concrete. Give one clear step at a time and explain how it protects what they value.",
            DiscType::C => "Be precise. Give reasons, numbers and a structured plan; avoid exaggeration.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscScores {
    #[serde(rename = "D")]
    pub d: u32,
    #[serde(rename = "I")]
    pub i: u32,
    #[serde(rename = "S")]
    pub s: u32,
    #[serde(rename = "C")]
    pub c: u32,
}

impl DiscScores {
    pub fn get(&self, kind: DiscType) -> u32 {
        match kind {
            DiscType::D => self.d,
            DiscType::I => self.i,
            DiscType::S => self.s,
            DiscType::C => self.c,
        }
    }

    fn set(&mut self, kind: DiscType, value: u32) {
        match kind {
            DiscType::D => self.d = value,
            DiscType::I => self.i = value,
            DiscType::S => self.s = value,
            DiscType::C => self.c = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscResult {
    pub primary_type: DiscType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_type: Option<DiscType>,
    pub scores: DiscScores,
}

/// Score with every question weighted equally.
pub fn score(answers: &[DiscType]) -> CounselorResult<DiscResult> {
    score_weighted(answers, &[1.0; QUESTION_COUNT])
}

pub fn score_weighted(answers: &[DiscType], weights: &[f64; QUESTION_COUNT]) -> CounselorResult<DiscResult> {
    if answers.len() != QUESTION_COUNT {
        return Err(CounselorError::ValidationError(format!(
            "DISC quiz needs {} answers, got {}",
            QUESTION_COUNT,
            answers.len()
        )));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(CounselorError::ValidationError(
            "DISC weights must be non-negative".to_string(),
        ));
    }

    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(CounselorError::ValidationError(
            "DISC weights must not all be zero".to_string(),
        ));
    }

    let mut scores = DiscScores::default();
    for kind in DiscType::ALL {
        let tally: f64 = answers
            .iter()
            .zip(weights.iter())
            .filter(|(answer, _)| **answer == kind)
            .map(|(_, weight)| weight)
            .sum();
        scores.set(kind, (tally / total * 100.0).round() as u32);
    }

    // max_by_key keeps the last maximum; walk in reverse so ties go to the
    // earlier type in D, I, S, C order.
    let primary_type = DiscType::ALL
        .iter()
        .rev()
        .copied()
        .max_by_key(|kind| scores.get(*kind))
        .unwrap_or(DiscType::D);

    let secondary_type = DiscType::ALL
        .iter()
        .rev()
        .copied()
        .filter(|kind| *kind != primary_type && scores.get(*kind) > 0)
        .max_by_key(|kind| scores.get(*kind));

    Ok(DiscResult {
        primary_type,
        secondary_type,
        scores,
    })
}
