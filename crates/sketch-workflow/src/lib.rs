//! # Sketch Workflow - client-side voice-to-image orchestration
//!
//! Drives the user-facing cycle against a running sketch-gateway:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Workflow                             │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐     │
//! │  │ MicRecorder  │ → │ /transcribe  │ → │ /generate-   │     │
//! │  │   (cpal)     │   │              │   │   prompt     │     │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘     │
//! │                                               ▼             │
//! │                    user edits prompt → /generate-image      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! One workflow per session, one step in flight at a time; every failure is
//! stored as a readable message in `WorkflowState::Error` instead of
//! propagating.

pub mod api;
pub mod error;
pub mod recorder;
pub mod state;
pub mod workflow;

pub use api::{HttpSketchApi, SketchApi};
pub use error::{WorkflowError, WorkflowResult};
pub use recorder::{AudioClip, AudioRecorder, MicRecorder, RecorderConfig, ScriptedRecorder};
pub use state::WorkflowState;
pub use workflow::{ClipWaitPolicy, Workflow};
