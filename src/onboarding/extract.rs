//! Pulling a usable answer for the pending field out of a free-text reply.

use once_cell::sync::Lazy;
use regex::Regex;

use super::fields::{ProfileAnswer, ProfileField};
use crate::database::models::IntensityMode;

const MAX_CODENAME_CHARS: usize = 32;
const MAX_ANSWER_CHARS: usize = 500;
const MIN_AGE: i64 = 13;
const MAX_AGE: i64 = 120;

static CODENAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:call me|my name is|my codename is|codename is|codename:|name's|i'm|i am|im)\s+([a-z][a-z0-9_\-']{0,31})",
    )
    .expect("codename pattern is valid")
});

static BARE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_\-']{0,31}$").expect("bare name pattern is valid"));

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,3})\b").expect("number pattern is valid"));

/// Words that follow "I'm" without being a name.
const NOT_A_NAME: &[&str] = &[
    "a", "an", "the", "not", "so", "very", "just", "here", "ready", "tired", "fine", "good",
    "ok", "okay", "back", "done", "new", "lost", "stuck", "trying", "going", "feeling",
];

/// Extract the answer for `field` from `message`.
///
/// `prompted` is true when the field's question was the last thing asked;
/// only then is a bare one-word reply accepted as a codename.
pub fn extract_answer(field: ProfileField, message: &str, prompted: bool) -> Option<ProfileAnswer> {
    match field {
        ProfileField::Codename => extract_codename(message, prompted).map(ProfileAnswer::Text),
        ProfileField::Age => extract_age(message).map(ProfileAnswer::Number),
        ProfileField::CommitmentLevel => {
            extract_intensity(message).map(|mode| ProfileAnswer::Text(mode.as_str().to_string()))
        }
        _ => extract_free_text(message).map(ProfileAnswer::Text),
    }
}

pub fn extract_codename(message: &str, allow_bare: bool) -> Option<String> {
    let trimmed = message.trim().trim_end_matches(['.', '!', '?']);

    for captures in CODENAME_PATTERN.captures_iter(trimmed) {
        if let Some(name) = captures.get(1) {
            let name = name.as_str().trim_matches('\'');
            if !name.is_empty() && !NOT_A_NAME.contains(&name.to_lowercase().as_str()) {
                return Some(capitalize(name));
            }
        }
    }

    if allow_bare && BARE_NAME.is_match(trimmed) && !NOT_A_NAME.contains(&trimmed.to_lowercase().as_str()) {
        return Some(capitalize(&trimmed.chars().take(MAX_CODENAME_CHARS).collect::<String>()));
    }

    None
}

pub fn extract_age(message: &str) -> Option<i64> {
    NUMBER
        .captures_iter(message)
        .filter_map(|captures| captures.get(1)?.as_str().parse::<i64>().ok())
        .find(|age| (MIN_AGE..=MAX_AGE).contains(age))
}

pub fn extract_intensity(message: &str) -> Option<IntensityMode> {
    let lower = message.to_lowercase();

    if ["ruthless", "brutal", "no mercy", "savage", "merciless"]
        .iter()
        .any(|word| lower.contains(word))
    {
        return Some(IntensityMode::Ruthless);
    }
    if ["intense", "hard", "push me", "aggressive"]
        .iter()
        .any(|word| lower.contains(word))
    {
        return Some(IntensityMode::Intense);
    }
    if ["standard", "normal", "balanced", "gentle", "easy", "moderate"]
        .iter()
        .any(|word| lower.contains(word))
    {
        return Some(IntensityMode::Standard);
    }

    // "8/10", "a 3", ...
    NUMBER
        .captures(&lower)
        .and_then(|captures| captures.get(1)?.as_str().parse::<u32>().ok())
        .filter(|n| (1..=10).contains(n))
        .map(|n| match n {
            8..=10 => IntensityMode::Ruthless,
            5..=7 => IntensityMode::Intense,
            _ => IntensityMode::Standard,
        })
}

pub fn extract_free_text(message: &str) -> Option<String> {
    let trimmed = message.trim();
    if trimmed.chars().filter(|c| c.is_alphanumeric()).count() < 2 {
        return None;
    }
    Some(trimmed.chars().take(MAX_ANSWER_CHARS).collect())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
