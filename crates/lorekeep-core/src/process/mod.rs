//! Episode processing pipeline.

pub mod episode;

pub use episode::{validate_transcript, EpisodeProcessor, PipelineStage};
