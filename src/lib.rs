//! Quiz session engine: per-channel round orchestration with a cancellable
//! countdown, first-correct-wins answer arbitration across choice and
//! free-text submissions, fuzzy name matching tuned for transliterated
//! names, and a durable score ledger.
//!
//! The crate is platform-agnostic. A host (chat bot, web service, REPL)
//! provides the [`collab`] collaborators and drives the engine through
//! [`state::QuizState`].

pub mod collab;
pub mod matcher;
pub mod normalize;
pub mod state;
pub mod store;
pub mod timer;
pub mod types;
