/// Pipeline stage definitions for tracking analysis progress
///
/// A run moves forward through the stages only; there is no loop-back.
use std::fmt;

/// Represents the current stage of one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    // ===== Active Stages =====
    /// Fetching the page and parsing the base URL
    Prerequisite,

    /// Running the extraction tasks over the parsed page
    Analysis,

    // ===== Terminal Stages =====
    /// Every task of both stages succeeded
    Done,

    /// A task failed; the result holds whatever was collected before the failure
    Failed,
}

impl PipelineStage {
    /// Returns true if the run has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from this stage to `next` is allowed
    ///
    /// Valid transitions:
    /// - Prerequisite → Analysis | Failed
    /// - Analysis → Done | Failed
    pub fn can_transition_to(&self, next: PipelineStage) -> bool {
        matches!(
            (self, next),
            (Self::Prerequisite, Self::Analysis)
                | (Self::Prerequisite, Self::Failed)
                | (Self::Analysis, Self::Done)
                | (Self::Analysis, Self::Failed)
        )
    }

    /// Returns the stage's string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prerequisite => "prerequisite",
            Self::Analysis => "analysis",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns all stages in pipeline order
    pub fn all_stages() -> Vec<Self> {
        vec![Self::Prerequisite, Self::Analysis, Self::Done, Self::Failed]
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for PipelineStage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
