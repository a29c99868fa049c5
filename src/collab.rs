//! Abstract collaborator contracts.
//!
//! The engine is presentation- and platform-agnostic: catalog access,
//! portrait resolution, and rendering all live behind these traits. The
//! engine emits data, never markup.

use crate::types::*;
use async_trait::async_trait;
use serde::Serialize;

pub type CollabResult<T> = Result<T, CollabError>;

/// Errors surfaced by external collaborators. Never fatal to a session:
/// callers log them and degrade (text-only round, fewer hint fields).
#[derive(Debug, thiserror::Error)]
pub enum CollabError {
    #[error("catalog unavailable: {0}")]
    Catalog(String),

    #[error("portrait resolution failed: {0}")]
    Portrait(String),

    #[error("presentation failed: {0}")]
    Presentation(String),
}

/// Everything the presentation layer needs to render one question.
#[derive(Debug, Clone, Serialize)]
pub struct RoundView {
    pub channel_id: ChannelId,
    pub round_id: RoundId,
    pub round_no: u32,
    pub rounds_total: u32,
    pub mode: RoundMode,
    /// Labels in display order; empty for free-text rounds.
    pub choice_labels: Vec<String>,
    pub portrait: Option<PortraitHandle>,
    pub category_hint: Option<String>,
    /// RFC3339 answer deadline.
    pub deadline: String,
    pub timeout_secs: u64,
}

/// Reveal data emitted when a round resolves, by win or by timeout.
#[derive(Debug, Clone, Serialize)]
pub struct RevealView {
    pub channel_id: ChannelId,
    pub round_id: RoundId,
    pub round_no: u32,
    pub subject_name: String,
    pub native_name: Option<String>,
    pub aliases: Vec<String>,
    pub summary: Option<String>,
    pub winner: Option<WinnerInfo>,
    pub timed_out: bool,
}

/// Read-only source of quiz subjects.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Snapshot of subjects eligible for selection, taken at round-selection
    /// time.
    async fn list_eligible_subjects(&self) -> CollabResult<Vec<Subject>>;

    /// Cache-fill callback: a portrait was resolved for a subject that had
    /// no `portrait_ref`. Catalogs that persist subjects can record it;
    /// the default discards it.
    async fn record_portrait(
        &self,
        _subject_id: &SubjectId,
        _portrait: &PortraitHandle,
    ) -> CollabResult<()> {
        Ok(())
    }
}

/// Resolves a displayable portrait for a subject. May be slow or fail;
/// failures degrade the round to text-only.
#[async_trait]
pub trait PortraitResolver: Send + Sync {
    async fn resolve_portrait(&self, subject: &Subject) -> CollabResult<Option<PortraitHandle>>;
}

/// Outbound presentation surface.
#[async_trait]
pub trait PresentationSink: Send + Sync {
    async fn present_round(&self, view: &RoundView) -> CollabResult<()>;
    async fn present_reveal(&self, view: &RevealView) -> CollabResult<()>;
    async fn present_leaderboard(
        &self,
        channel_id: &ChannelId,
        entries: &[ScoreEntry],
    ) -> CollabResult<()>;
}
