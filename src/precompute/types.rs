use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::EmbeddingVector;

/// Lifecycle of one background precompute run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecomputeStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl PrecomputeStatus {
    /// Completed and Failed are final; the snapshot never changes after.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Who will receive the bridge in a bridged task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    Human,
    Model,
}

/// What kind of task is being precomputed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecomputeMode {
    /// Single seed word; submissions converge on it.
    Seeded,
    /// Anchor/target pair; submissions bridge between them. A model
    /// recipient gets a generative baseline bridge precomputed.
    Bridged { recipient: Recipient },
}

impl PrecomputeMode {
    pub(crate) fn wants_generative_baseline(self) -> bool {
        matches!(
            self,
            Self::Bridged {
                recipient: Recipient::Model
            }
        )
    }
}

/// Point-in-time copy of a precompute record.
///
/// Every data field is optional: a subtask that failed (or has not finished
/// yet) leaves its fields empty, and callers fall back to computing the
/// value synchronously.
#[derive(Debug, Clone, Default)]
pub struct PrecomputeSnapshot {
    pub status: PrecomputeStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,

    pub anchor_embedding: Option<EmbeddingVector>,
    pub target_embedding: Option<EmbeddingVector>,
    /// Generative-provider baseline clues and their embeddings.
    pub generated_clues: Option<Vec<String>>,
    pub generated_embeddings: Option<Vec<EmbeddingVector>>,
    /// Vocabulary-search baseline words and their embeddings.
    pub lexical_bridge: Option<Vec<String>>,
    pub lexical_embeddings: Option<Vec<EmbeddingVector>>,
    /// Sorted relevance scores of random draws against this task's prompt.
    pub null_relevance_samples: Option<Vec<f32>>,
}

/// Counts of tracked tasks by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub total_tracked: usize,
    pub active_tasks: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
}
