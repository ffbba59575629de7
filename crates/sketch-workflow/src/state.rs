//! Workflow state machine states.

/// User-visible pipeline state. Exactly one holds at a time.
///
/// Transitions:
/// - `Idle` → start → `Recording`
/// - `Recording` → stop → `ProcessingTranscriptAndPrompt` → `Idle` (prompt
///   populated) or `Error`
/// - `Idle` (non-empty prompt) → generate → `Generating` → `Idle` (image
///   replaced) or `Error`
/// - `Error` → any start/generate action clears the error and proceeds as
///   if from `Idle`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Recording,
    /// Awaiting transcription, then prompt expansion, sequentially.
    ProcessingTranscriptAndPrompt,
    /// Awaiting image generation.
    Generating,
    /// A step failed; carries the human-readable message.
    Error(String),
}

impl WorkflowState {
    pub fn is_error(&self) -> bool {
        matches!(self, WorkflowState::Error(_))
    }

    /// The stored failure message, if in `Error`.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            WorkflowState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}
