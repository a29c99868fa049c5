//! End-to-end engine scenarios driven purely through the public API, with
//! in-memory collaborators standing in for the host platform.

use async_trait::async_trait;
use portraitquiz::collab::*;
use portraitquiz::state::{AnswerOutcome, QuizState};
use portraitquiz::store::MemoryScoreStore;
use portraitquiz::types::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

fn subject(id: &str, name: &str, aliases: &[&str]) -> Subject {
    Subject {
        id: id.to_string(),
        name: name.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        native_name: None,
        category: Some("actor".to_string()),
        portrait_ref: Some(format!("portrait:{id}")),
        summary: None,
    }
}

struct FixedCatalog(Vec<Subject>);

#[async_trait]
impl CatalogSource for FixedCatalog {
    async fn list_eligible_subjects(&self) -> CollabResult<Vec<Subject>> {
        Ok(self.0.clone())
    }
}

struct NoPortraits;

#[async_trait]
impl PortraitResolver for NoPortraits {
    async fn resolve_portrait(&self, _subject: &Subject) -> CollabResult<Option<PortraitHandle>> {
        Ok(None)
    }
}

#[derive(Default)]
struct Captured {
    rounds: Vec<RoundView>,
    reveals: Vec<RevealView>,
    leaderboards: Vec<Vec<ScoreEntry>>,
}

#[derive(Default)]
struct CapturingSink {
    captured: Mutex<Captured>,
}

#[async_trait]
impl PresentationSink for CapturingSink {
    async fn present_round(&self, view: &RoundView) -> CollabResult<()> {
        self.captured.lock().await.rounds.push(view.clone());
        Ok(())
    }

    async fn present_reveal(&self, view: &RevealView) -> CollabResult<()> {
        self.captured.lock().await.reveals.push(view.clone());
        Ok(())
    }

    async fn present_leaderboard(
        &self,
        _channel_id: &ChannelId,
        entries: &[ScoreEntry],
    ) -> CollabResult<()> {
        self.captured
            .lock()
            .await
            .leaderboards
            .push(entries.to_vec());
        Ok(())
    }
}

fn config(rounds: u32) -> QuizConfig {
    QuizConfig {
        rounds_per_session: rounds,
        intermission: Duration::from_secs(1),
        ..QuizConfig::default()
    }
}

async fn engine(
    cfg: QuizConfig,
    subjects: Vec<Subject>,
) -> (Arc<QuizState>, Arc<CapturingSink>) {
    let sink = Arc::new(CapturingSink::default());
    let state = QuizState::open(
        cfg,
        Arc::new(FixedCatalog(subjects)),
        Arc::new(NoPortraits),
        sink.clone(),
        Arc::new(MemoryScoreStore::default()),
    )
    .await
    .unwrap();
    (state, sink)
}

#[tokio::test(start_paused = true)]
async fn test_free_text_session_end_to_end() {
    let subjects = vec![subject("s1", "Omar Sharif", &["Umar Sharif"])];
    let (state, sink) = engine(config(1), subjects).await;

    state.start_session("lobby").await.unwrap();
    {
        let captured = sink.captured.lock().await;
        assert_eq!(captured.rounds.len(), 1);
        assert_eq!(captured.rounds[0].mode, RoundMode::FreeText);
        assert_eq!(captured.rounds[0].rounds_total, 1);
    }

    let outcome = state
        .submit_free_text("lobby", "p1", "Amira", "umar shareef")
        .await
        .unwrap();
    match outcome {
        AnswerOutcome::Win { winner, subject_name } => {
            assert_eq!(subject_name, "Omar Sharif");
            assert_eq!(winner.points, 15);
            assert_eq!(winner.confidence, Some(100));
        }
        other => panic!("expected win, got {other:?}"),
    }

    // the single-round budget is spent, the session winds down after the
    // intermission
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!state.has_session("lobby").await);

    let captured = sink.captured.lock().await;
    assert_eq!(captured.reveals.len(), 1);
    assert!(!captured.reveals[0].timed_out);
    assert_eq!(captured.leaderboards.len(), 1);
    assert_eq!(captured.leaderboards[0][0].participant_id, "p1");
    assert_eq!(captured.leaderboards[0][0].total_points, 15);
}

#[tokio::test(start_paused = true)]
async fn test_structured_round_first_correct_wins() {
    let subjects = vec![
        subject("s1", "Omar Sharif", &[]),
        subject("s2", "Fairuz", &[]),
        subject("s3", "Umm Kulthum", &[]),
        subject("s4", "Adel Emam", &[]),
    ];
    let (state, sink) = engine(config(1), subjects).await;

    // mode selection is random per round, so open fresh channels until a
    // structured round comes up
    let channel = {
        let mut found = None;
        for i in 0..64 {
            let channel = format!("lobby{i}");
            state.start_session(&channel).await.unwrap();
            let structured = {
                let captured = sink.captured.lock().await;
                captured.rounds.last().unwrap().mode == RoundMode::StructuredChoice
            };
            if structured {
                found = Some(channel);
                break;
            }
            state.abort_session(&channel).await.unwrap();
        }
        found.expect("no structured round in 64 sessions")
    };

    let labels = {
        let captured = sink.captured.lock().await;
        captured.rounds.last().unwrap().choice_labels.clone()
    };
    assert_eq!(labels.len(), 4);

    // four participants cover all four labels, so exactly one must win
    let mut wins = 0;
    for (i, _) in labels.iter().enumerate() {
        let pid = format!("p{i}");
        let outcome = state
            .submit_choice(&channel, &pid, &pid, i)
            .await
            .unwrap();
        match outcome {
            AnswerOutcome::Win { winner, subject_name } => {
                wins += 1;
                assert_eq!(labels[i], subject_name);
                assert_eq!(winner.confidence, None);
            }
            AnswerOutcome::Wrong { confidence: None } | AnswerOutcome::AlreadyResolved => {}
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(wins, 1);

    let outcome = state
        .submit_choice(&channel, "p9", "Latecomer", 0)
        .await
        .unwrap();
    assert!(matches!(outcome, AnswerOutcome::AlreadyResolved));
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_round_times_out_and_advances() {
    let subjects = vec![
        subject("s1", "Omar Sharif", &[]),
        subject("s2", "Fairuz", &[]),
    ];
    let (state, sink) = engine(config(2), subjects).await;
    state.start_session("lobby").await.unwrap();

    // past the deadline, before the intermission ends
    tokio::time::sleep(Duration::from_millis(30_500)).await;
    {
        let captured = sink.captured.lock().await;
        assert_eq!(captured.reveals.len(), 1);
        assert!(captured.reveals[0].timed_out);
        assert!(captured.reveals[0].winner.is_none());
    }

    // the next round starts on its own
    tokio::time::sleep(Duration::from_secs(1)).await;
    let captured = sink.captured.lock().await;
    assert_eq!(captured.rounds.len(), 2);
    assert_ne!(captured.rounds[0].round_id, captured.rounds[1].round_id);
    assert_ne!(captured.rounds[0].round_no, captured.rounds[1].round_no);
}

#[tokio::test(start_paused = true)]
async fn test_scores_accumulate_across_sessions() {
    let subjects = vec![subject("s1", "Omar Sharif", &[])];
    let (state, sink) = engine(config(1), subjects).await;

    for _ in 0..2 {
        state.start_session("lobby").await.unwrap();
        state
            .submit_free_text("lobby", "p1", "Amira", "omar sharif")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!state.has_session("lobby").await);
    }

    let captured = sink.captured.lock().await;
    let last = captured.leaderboards.last().unwrap();
    assert_eq!(last[0].total_points, 30);
    assert_eq!(last[0].correct_count, 2);
}
