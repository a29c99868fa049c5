//! Engine state: the per-channel session registry and everything that
//! mutates it.

mod round;
mod score;
mod session;

pub use round::AnswerOutcome;
pub use score::ScoreLedger;
pub use session::Session;

use crate::collab::{CatalogSource, PortraitResolver, PresentationSink};
use crate::store::{ScoreStore, StoreError};
use crate::types::{ChannelId, QuizConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Errors surfaced to the dispatcher. Late answers on resolved rounds are
/// *not* errors; they come back as [`AnswerOutcome`] variants.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("a quiz session is already active in this channel")]
    SessionActive,

    #[error("no quiz session is active in this channel")]
    NoSession,

    #[error("choice index {index} is out of range for {len} choices")]
    ChoiceOutOfRange { index: usize, len: usize },

    #[error("answer text is empty")]
    EmptyAnswer,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Shared engine state. One `Arc<QuizState>` serves every channel; sessions
/// for different channels never share mutable state beyond the registry map
/// itself.
pub struct QuizState {
    pub config: QuizConfig,
    pub(crate) catalog: Arc<dyn CatalogSource>,
    pub(crate) portraits: Arc<dyn PortraitResolver>,
    pub(crate) presenter: Arc<dyn PresentationSink>,
    pub ledger: ScoreLedger,
    /// The map entry *is* the single session slot per channel: a second
    /// session for a channel cannot exist, it is structurally just an
    /// occupied key.
    pub(crate) sessions: RwLock<HashMap<ChannelId, Arc<Session>>>,
}

impl QuizState {
    /// Build the engine, loading the score ledger from the store.
    pub async fn open(
        config: QuizConfig,
        catalog: Arc<dyn CatalogSource>,
        portraits: Arc<dyn PortraitResolver>,
        presenter: Arc<dyn PresentationSink>,
        store: Arc<dyn ScoreStore>,
    ) -> Result<Arc<Self>, QuizError> {
        let ledger = ScoreLedger::open(store).await?;
        Ok(Arc::new(Self {
            config,
            catalog,
            portraits,
            presenter,
            ledger,
            sessions: RwLock::new(HashMap::new()),
        }))
    }

    /// Get the active session for a channel, if any.
    pub async fn session(&self, channel_id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(channel_id).cloned()
    }

    pub async fn has_session(&self, channel_id: &str) -> bool {
        self.sessions.read().await.contains_key(channel_id)
    }
}
