//! State module for tracking analysis progress
//!
//! This module holds everything a run accumulates and where it is in the pipeline.
//!
//! # Components
//!
//! - `PipelineStage`: Tracks which stage of the two-stage pipeline a run has reached
//! - `AnalysisResult`: The facts collected about one page
//! - `ResultAccumulator`: Synchronized destination that pipeline tasks write into

mod result;
mod stage;

// Re-export main types
pub use result::{AnalysisResult, HeadingCounts, ResultAccumulator, HEADING_TAGS};
pub use stage::PipelineStage;
