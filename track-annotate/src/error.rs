//! Error type for the per-track pipeline.
//!
//! Only the pipeline can fail. The algorithms themselves return `Option`
//! or plain values: "no airport" and "no hint" are ordinary outcomes.

/// Failure to annotate one track. Never aborts sibling tracks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotateError {
    #[error("track {name} has no valid samples")]
    EmptyTrack { name: String },
}
