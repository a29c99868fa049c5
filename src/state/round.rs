//! Answer arbitration: first correct answer wins, decided under the session
//! lock so concurrent submissions can never produce two winners.

use super::session::Session;
use super::{QuizError, QuizState};
use crate::collab::RevealView;
use crate::matcher;
use crate::types::*;
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to one submitted answer. Everything here is a normal
/// gameplay outcome; [`QuizError`] is reserved for malformed requests.
#[derive(Debug, Clone)]
pub enum AnswerOutcome {
    /// First correct answer of the round.
    Win {
        winner: WinnerInfo,
        subject_name: String,
    },
    /// Incorrect; the participant's attempt for this round is spent.
    Wrong { confidence: Option<u8> },
    /// Close but not correct; no attempt is spent, the participant may try
    /// again.
    NearMiss { confidence: u8 },
    /// The round already has a winner or timed out.
    AlreadyResolved,
    /// The participant already spent their attempt this round.
    AlreadyAttempted,
    /// The session is between rounds.
    NoActiveRound,
    /// A choice index was submitted for a free-text round.
    ModeMismatch,
}

struct WinContext {
    winner: WinnerInfo,
    subject_name: String,
    reveal: RevealView,
}

impl QuizState {
    /// Submit a structured-choice answer by label index.
    pub async fn submit_choice(
        self: &Arc<Self>,
        channel_id: &str,
        participant_id: &str,
        display_name: &str,
        index: usize,
    ) -> Result<AnswerOutcome, QuizError> {
        let session = self.session(channel_id).await.ok_or(QuizError::NoSession)?;

        let win = {
            let mut inner = session.inner.lock().await;
            let Some(round) = inner.current.as_mut() else {
                return Ok(AnswerOutcome::NoActiveRound);
            };
            if round.resolved {
                return Ok(AnswerOutcome::AlreadyResolved);
            }
            if round.mode != RoundMode::StructuredChoice {
                return Ok(AnswerOutcome::ModeMismatch);
            }
            if index >= round.choice_labels.len() {
                return Err(QuizError::ChoiceOutOfRange {
                    index,
                    len: round.choice_labels.len(),
                });
            }
            if !round.attempted.insert(participant_id.to_string()) {
                return Ok(AnswerOutcome::AlreadyAttempted);
            }

            if index != round.correct_index {
                debug!(channel_id, participant_id, index, "wrong choice");
                return Ok(AnswerOutcome::Wrong { confidence: None });
            }
            self.mark_won(channel_id, round, participant_id, display_name, None)
        };

        Ok(self.settle_win(&session, win).await)
    }

    /// Submit a free-text guess. Accepted in both round modes; in structured
    /// rounds it lets participants answer without touching the labels.
    pub async fn submit_free_text(
        self: &Arc<Self>,
        channel_id: &str,
        participant_id: &str,
        display_name: &str,
        text: &str,
    ) -> Result<AnswerOutcome, QuizError> {
        if text.trim().is_empty() {
            return Err(QuizError::EmptyAnswer);
        }
        let session = self.session(channel_id).await.ok_or(QuizError::NoSession)?;

        let win = {
            let mut inner = session.inner.lock().await;
            let Some(round) = inner.current.as_mut() else {
                return Ok(AnswerOutcome::NoActiveRound);
            };
            if round.resolved {
                return Ok(AnswerOutcome::AlreadyResolved);
            }
            if round.attempted.contains(participant_id) {
                return Ok(AnswerOutcome::AlreadyAttempted);
            }

            let confidence = matcher::score_subject(text, &round.subject);
            debug!(channel_id, participant_id, confidence, "free-text guess");

            if confidence < self.config.correct_threshold {
                if confidence >= self.config.near_miss_threshold {
                    // close guesses cost nothing, the participant may refine
                    return Ok(AnswerOutcome::NearMiss { confidence });
                }
                round.attempted.insert(participant_id.to_string());
                return Ok(AnswerOutcome::Wrong {
                    confidence: Some(confidence),
                });
            }

            round.attempted.insert(participant_id.to_string());
            self.mark_won(
                channel_id,
                round,
                participant_id,
                display_name,
                Some(confidence),
            )
        };

        Ok(self.settle_win(&session, win).await)
    }

    /// Resolve a round as winner, inside the session lock. The stale-timer
    /// guard is the `resolved` flag plus the round id check in
    /// [`Self::resolve_timeout`].
    fn mark_won(
        &self,
        channel_id: &str,
        round: &mut super::session::ActiveRound,
        participant_id: &str,
        display_name: &str,
        confidence: Option<u8>,
    ) -> WinContext {
        round.resolved = true;
        round.timer.cancel();

        let elapsed = round.started_at.elapsed();
        let mut points = self.config.points_correct;
        if elapsed <= self.config.fast_window {
            points += self.config.fast_bonus;
        }
        let winner = WinnerInfo {
            participant_id: participant_id.to_string(),
            display_name: display_name.to_string(),
            points,
            confidence,
        };
        debug!(
            channel_id,
            participant_id,
            points,
            elapsed_ms = elapsed.as_millis() as u64,
            "round won"
        );
        WinContext {
            winner: winner.clone(),
            subject_name: round.subject.name.clone(),
            reveal: round.reveal(channel_id, Some(winner), false),
        }
    }

    /// Post-win work done outside the session lock: credit the ledger,
    /// present the reveal, queue the next round.
    async fn settle_win(self: &Arc<Self>, session: &Arc<Session>, win: WinContext) -> AnswerOutcome {
        if let Err(e) = self
            .ledger
            .record_win(
                &win.winner.participant_id,
                &win.winner.display_name,
                win.winner.points,
            )
            .await
        {
            // the win stands even if persistence is down
            warn!(participant_id = %win.winner.participant_id, error = %e, "score persistence failed");
        }

        if let Err(e) = self.presenter.present_reveal(&win.reveal).await {
            warn!(channel_id = %session.channel_id, error = %e, "reveal presentation failed");
        }
        self.schedule_advance(session.clone());

        AnswerOutcome::Win {
            winner: win.winner,
            subject_name: win.subject_name,
        }
    }

    /// Timer callback: reveal an unanswered round. A stale timer (round
    /// already advanced, or won in the same instant) finds the id or the
    /// `resolved` flag mismatched and does nothing.
    pub(crate) async fn resolve_timeout(self: &Arc<Self>, channel_id: &str, round_id: &str) {
        let Some(session) = self.session(channel_id).await else {
            return;
        };

        let reveal = {
            let mut inner = session.inner.lock().await;
            let Some(round) = inner.current.as_mut() else {
                return;
            };
            if round.id != round_id || round.resolved {
                return;
            }
            round.resolved = true;
            debug!(channel_id, round_id, "round timed out");
            round.reveal(channel_id, None, true)
        };

        if let Err(e) = self.presenter.present_reveal(&reveal).await {
            warn!(channel_id, error = %e, "reveal presentation failed");
        }
        self.schedule_advance(session);
    }
}
