//! Data models for pipeline records and reports.
//!
//! All models derive `Serialize`/`Deserialize` so the final output shape is
//! directly consumable by the summarization collaborator and by structured
//! logging.

mod record;
mod report;

pub use record::{EnrichedPaper, Fingerprint, MergedPaper, RawRecord, ScoredPaper, SignalSet};
pub use report::{PipelineState, RunReport, SourceTally};
