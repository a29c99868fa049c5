//! Durable score ledger shared across sessions and channels.

use crate::store::{ScoreStore, StoreResult};
use crate::types::{ParticipantId, ScoreEntry};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory view of the persistent scoreboard. Writers hold the entry lock
/// across the persist call, so the store always sees monotonically newer
/// snapshots.
pub struct ScoreLedger {
    store: Arc<dyn ScoreStore>,
    entries: RwLock<HashMap<ParticipantId, ScoreEntry>>,
}

impl ScoreLedger {
    /// Load the ledger from the store. A missing store is an empty ledger.
    pub async fn open(store: Arc<dyn ScoreStore>) -> StoreResult<Self> {
        let entries = store.load().await?;
        debug!(participants = entries.len(), "score ledger loaded");
        Ok(Self {
            store,
            entries: RwLock::new(entries),
        })
    }

    /// Credit a round win: add the points, bump the correct-answer count,
    /// refresh the display name, and persist. Returns the updated entry.
    pub async fn record_win(
        &self,
        participant_id: &str,
        display_name: &str,
        points: u32,
    ) -> StoreResult<ScoreEntry> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(participant_id.to_string())
            .or_insert_with(|| ScoreEntry {
                participant_id: participant_id.to_string(),
                display_name: display_name.to_string(),
                total_points: 0,
                correct_count: 0,
                last_played_at: String::new(),
            });
        entry.total_points += u64::from(points);
        entry.correct_count += 1;
        entry.display_name = display_name.to_string();
        entry.last_played_at = chrono::Utc::now().to_rfc3339();
        let updated = entry.clone();

        self.store.persist(&entries).await?;
        debug!(
            participant_id,
            total_points = updated.total_points,
            "score recorded"
        );
        Ok(updated)
    }

    pub async fn get(&self, participant_id: &str) -> Option<ScoreEntry> {
        self.entries.read().await.get(participant_id).cloned()
    }

    /// Top `n` entries by total points, descending. Ties rank the earlier
    /// `last_played_at` first, with the participant id as a final stable
    /// tiebreak.
    pub async fn top_n(&self, n: usize) -> Vec<ScoreEntry> {
        let entries = self.entries.read().await;
        let mut ranked: Vec<ScoreEntry> = entries.values().cloned().collect();
        ranked.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then_with(|| a.last_played_at.cmp(&b.last_played_at))
                .then_with(|| a.participant_id.cmp(&b.participant_id))
        });
        ranked.truncate(n);
        ranked
    }
}
