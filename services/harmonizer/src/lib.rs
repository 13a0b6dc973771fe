//! Ocean record harmonizer.
//!
//! Brings CMIP6 model output and ORAS5 reanalysis onto one masked grid with
//! gap-filled coasts, a shared normalization and a reanalysis climatology, and
//! writes the artifacts a bias-correction model trains on.

pub mod config;
pub mod pipeline;
pub mod score;

pub use config::HarmonizerConfig;
pub use pipeline::{Harmonizer, PrepareSummary, PreparedRecord, RecordOutcome};
pub use score::{score_files, ScoreReport};
