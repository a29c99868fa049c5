//! Session lifecycle: starting sessions, selecting subjects, advancing
//! rounds, and tearing everything down.

use super::{QuizError, QuizState};
use crate::collab::{RevealView, RoundView};
use crate::timer::RoundTimer;
use crate::types::*;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use ulid::Ulid;

/// One quiz session in one channel. All round state lives behind a single
/// mutex; answer arbitration is a short critical section on it.
pub struct Session {
    pub channel_id: ChannelId,
    pub rounds_total: u32,
    pub started_at: String,
    pub(crate) inner: Mutex<SessionInner>,
}

pub(crate) struct SessionInner {
    /// 1-based number of the round currently (or last) played; 0 before the
    /// first round starts.
    pub round_index: u32,
    pub used_subjects: HashSet<SubjectId>,
    pub current: Option<ActiveRound>,
    pub ended: bool,
}

pub(crate) struct ActiveRound {
    pub id: RoundId,
    pub round_no: u32,
    pub subject: Subject,
    pub mode: RoundMode,
    /// Display-ordered labels; empty in free-text mode.
    pub choice_labels: Vec<String>,
    /// Index of the correct label; unused in free-text mode.
    pub correct_index: usize,
    pub started_at: tokio::time::Instant,
    pub deadline: String,
    /// Participants who have spent their one attempt this round.
    pub attempted: HashSet<ParticipantId>,
    pub resolved: bool,
    pub timer: RoundTimer,
}

impl ActiveRound {
    pub(crate) fn reveal(
        &self,
        channel_id: &str,
        winner: Option<WinnerInfo>,
        timed_out: bool,
    ) -> RevealView {
        RevealView {
            channel_id: channel_id.to_string(),
            round_id: self.id.clone(),
            round_no: self.round_no,
            subject_name: self.subject.name.clone(),
            native_name: self.subject.native_name.clone(),
            aliases: self.subject.aliases.clone(),
            summary: self.subject.summary.clone(),
            winner,
            timed_out,
        }
    }
}

impl QuizState {
    /// Start a session in a channel and present its first round. Fails if
    /// the channel already has one.
    pub async fn start_session(
        self: &Arc<Self>,
        channel_id: &str,
    ) -> Result<Arc<Session>, QuizError> {
        let session = {
            let mut sessions = self.sessions.write().await;
            if sessions.contains_key(channel_id) {
                return Err(QuizError::SessionActive);
            }
            let session = Arc::new(Session {
                channel_id: channel_id.to_string(),
                rounds_total: self.config.rounds_per_session,
                started_at: chrono::Utc::now().to_rfc3339(),
                inner: Mutex::new(SessionInner {
                    round_index: 0,
                    used_subjects: HashSet::new(),
                    current: None,
                    ended: false,
                }),
            });
            sessions.insert(channel_id.to_string(), session.clone());
            session
        };
        info!(channel_id, rounds = session.rounds_total, "session started");

        self.begin_next_round(session.clone()).await;
        Ok(session)
    }

    /// Abort the channel's session immediately, revealing nothing further.
    pub async fn abort_session(self: &Arc<Self>, channel_id: &str) -> Result<(), QuizError> {
        let session = self.session(channel_id).await.ok_or(QuizError::NoSession)?;
        self.finish_session(&session, SessionEndReason::Aborted)
            .await;
        Ok(())
    }

    /// End a session exactly once: cancel any live timer, free the channel
    /// slot, and present the leaderboard.
    pub(crate) async fn finish_session(
        self: &Arc<Self>,
        session: &Arc<Session>,
        reason: SessionEndReason,
    ) {
        {
            let mut inner = session.inner.lock().await;
            if inner.ended {
                return;
            }
            inner.ended = true;
            if let Some(round) = inner.current.take() {
                round.timer.cancel();
            }
        }
        self.sessions.write().await.remove(&session.channel_id);
        info!(channel_id = %session.channel_id, ?reason, "session ended");

        let top = self.ledger.top_n(10).await;
        if let Err(e) = self
            .presenter
            .present_leaderboard(&session.channel_id, &top)
            .await
        {
            warn!(channel_id = %session.channel_id, error = %e, "leaderboard presentation failed");
        }
    }

    /// Advance to the next round after the intermission pause.
    pub(crate) fn schedule_advance(self: &Arc<Self>, session: Arc<Session>) {
        let state = Arc::clone(self);
        let pause = self.config.intermission;
        tokio::spawn(async move {
            tokio::time::sleep(pause).await;
            state.begin_next_round(session).await;
        });
    }

    /// Select a subject, arm the timer, and present the round. Ends the
    /// session when the round budget or the subject pool runs out.
    pub(crate) async fn begin_next_round(self: &Arc<Self>, session: Arc<Session>) {
        let (round_no, used) = {
            let mut inner = session.inner.lock().await;
            if inner.ended {
                return;
            }
            if inner.round_index >= session.rounds_total {
                drop(inner);
                self.finish_session(&session, SessionEndReason::Completed)
                    .await;
                return;
            }
            inner.round_index += 1;
            (inner.round_index, inner.used_subjects.clone())
        };

        let eligible = match self.catalog.list_eligible_subjects().await {
            Ok(subjects) => subjects,
            Err(e) => {
                warn!(channel_id = %session.channel_id, error = %e, "catalog lookup failed");
                self.finish_session(&session, SessionEndReason::SubjectsExhausted)
                    .await;
                return;
            }
        };
        let unused: Vec<&Subject> = eligible.iter().filter(|s| !used.contains(&s.id)).collect();
        if unused.is_empty() {
            self.finish_session(&session, SessionEndReason::SubjectsExhausted)
                .await;
            return;
        }

        // rng is scoped so it is dropped before the next await
        let (subject, mode, choice_labels, correct_index) = {
            let mut rng = rand::rng();

            let with_portrait: Vec<&&Subject> =
                unused.iter().filter(|s| s.portrait_ref.is_some()).collect();
            let subject: Subject = if with_portrait.is_empty() {
                (**unused.choose(&mut rng).unwrap_or(&unused[0])).clone()
            } else {
                (***with_portrait.choose(&mut rng).unwrap_or(&with_portrait[0])).clone()
            };

            let mut distractors: Vec<String> = eligible
                .iter()
                .filter(|s| s.id != subject.id)
                .map(|s| s.name.clone())
                .collect();
            distractors.sort_unstable();
            distractors.dedup();

            let structured = distractors.len() >= 3 && rng.random_bool(0.5);
            if structured {
                let mut labels: Vec<String> =
                    distractors.choose_multiple(&mut rng, 3).cloned().collect();
                let correct_index = rng.random_range(0..=labels.len());
                labels.insert(correct_index, subject.name.clone());
                (subject, RoundMode::StructuredChoice, labels, correct_index)
            } else {
                (subject, RoundMode::FreeText, Vec::new(), 0)
            }
        };

        let portrait = match &subject.portrait_ref {
            Some(handle) => Some(handle.clone()),
            None => match self.portraits.resolve_portrait(&subject).await {
                Ok(Some(handle)) => {
                    // cache-fill so the catalog can skip resolution next time
                    if let Err(e) = self.catalog.record_portrait(&subject.id, &handle).await {
                        debug!(subject_id = %subject.id, error = %e, "portrait cache-fill failed");
                    }
                    Some(handle)
                }
                Ok(None) => None,
                Err(e) => {
                    warn!(subject_id = %subject.id, error = %e, "portrait resolution failed");
                    None
                }
            },
        };

        let round_id = Ulid::new().to_string();
        let timeout = self.config.round_timeout;
        let deadline = (chrono::Utc::now() + chrono::Duration::seconds(timeout.as_secs() as i64))
            .to_rfc3339();

        let timer = {
            let state = Arc::clone(self);
            let channel_id = session.channel_id.clone();
            let timer_round_id = round_id.clone();
            RoundTimer::start(timeout, move || async move {
                state.resolve_timeout(&channel_id, &timer_round_id).await;
            })
        };

        let view = RoundView {
            channel_id: session.channel_id.clone(),
            round_id: round_id.clone(),
            round_no,
            rounds_total: session.rounds_total,
            mode,
            choice_labels: choice_labels.clone(),
            portrait,
            category_hint: subject.category.clone(),
            deadline: deadline.clone(),
            timeout_secs: timeout.as_secs(),
        };

        {
            let mut inner = session.inner.lock().await;
            if inner.ended {
                timer.cancel();
                return;
            }
            inner.used_subjects.insert(subject.id.clone());
            debug!(
                channel_id = %session.channel_id,
                round_id = %round_id,
                round_no,
                subject_id = %subject.id,
                ?mode,
                "round started"
            );
            inner.current = Some(ActiveRound {
                id: round_id,
                round_no,
                subject,
                mode,
                choice_labels,
                correct_index,
                started_at: tokio::time::Instant::now(),
                deadline,
                attempted: HashSet::new(),
                resolved: false,
                timer,
            });
        }

        if let Err(e) = self.presenter.present_round(&view).await {
            warn!(channel_id = %session.channel_id, error = %e, "round presentation failed");
        }
    }
}
