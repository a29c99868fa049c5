use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque ID types for type safety
pub type ChannelId = String;
pub type ParticipantId = String;
pub type SubjectId = String;
pub type RoundId = String;

/// Opaque handle to a resolved portrait (URL, attachment id, cache key, ...).
/// The engine never looks inside it.
pub type PortraitHandle = String;

/// A quiz subject from the catalog. Immutable once a round references it;
/// only the catalog collaborator ever rewrites catalog entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub native_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub portrait_ref: Option<PortraitHandle>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundMode {
    StructuredChoice,
    FreeText,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEndReason {
    /// All rounds played.
    Completed,
    /// No unused eligible subject remained (or the catalog was unreachable).
    SubjectsExhausted,
    /// Explicit stop request.
    Aborted,
}

/// The participant credited with winning a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WinnerInfo {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub points: u32,
    /// Match confidence for free-text wins; None for structured choices.
    pub confidence: Option<u8>,
}

/// Cumulative per-participant statistics, persisted by the score ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreEntry {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub total_points: u64,
    pub correct_count: u32,
    /// RFC3339 timestamp of the most recent win.
    pub last_played_at: String,
}

/// Engine tuning knobs. Everything has a default; everything can come from
/// the environment.
#[derive(Debug, Clone)]
pub struct QuizConfig {
    /// How long a round stays open for answers.
    pub round_timeout: Duration,
    /// Base points for a correct answer.
    pub points_correct: u32,
    /// Extra points when the winning answer arrives within `fast_window`.
    pub fast_bonus: u32,
    pub fast_window: Duration,
    pub rounds_per_session: u32,
    /// Minimum fuzzy confidence for a free-text answer to win.
    pub correct_threshold: u8,
    /// Confidence at or above this (but below `correct_threshold`) is a
    /// near-miss: no attempt consumed, participant may retry.
    pub near_miss_threshold: u8,
    /// Pause between a round's reveal and the next presentation.
    pub intermission: Duration,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            round_timeout: Duration::from_secs(30),
            points_correct: 10,
            fast_bonus: 5,
            fast_window: Duration::from_secs(10),
            rounds_per_session: 10,
            correct_threshold: 80,
            near_miss_threshold: 60,
            intermission: Duration::from_secs(3),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl QuizConfig {
    /// Load configuration from `QUIZ_*` environment variables, falling back
    /// to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            round_timeout: env_u64("QUIZ_ROUND_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.round_timeout),
            points_correct: env_u64("QUIZ_POINTS_CORRECT")
                .map(|v| v as u32)
                .unwrap_or(defaults.points_correct),
            fast_bonus: env_u64("QUIZ_FAST_BONUS")
                .map(|v| v as u32)
                .unwrap_or(defaults.fast_bonus),
            fast_window: env_u64("QUIZ_FAST_WINDOW_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.fast_window),
            rounds_per_session: env_u64("QUIZ_ROUNDS_PER_SESSION")
                .map(|v| v as u32)
                .unwrap_or(defaults.rounds_per_session),
            correct_threshold: env_u64("QUIZ_CORRECT_THRESHOLD")
                .map(|v| (v as u8).min(100))
                .unwrap_or(defaults.correct_threshold),
            near_miss_threshold: env_u64("QUIZ_NEAR_MISS_THRESHOLD")
                .map(|v| (v as u8).min(100))
                .unwrap_or(defaults.near_miss_threshold),
            intermission: env_u64("QUIZ_INTERMISSION_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.intermission),
        }
    }
}
