//! # Sketch Provider — AI capability client
//!
//! Thin wrappers over an OpenAI-compatible provider for the three
//! capabilities the pipeline needs:
//!
//! ```text
//! audio bytes ──transcribe──▶ transcript ──expand_prompt──▶ prompt ──generate_image──▶ image URL
//! ```
//!
//! Plus a bounded constant-delay retry wrapper for the transient-failure-prone
//! transcription upload. Credentials are read once at startup into
//! [`ProviderConfig`] and passed explicitly — no global state.

pub mod client;
pub mod config;
pub mod error;
pub mod retry;

pub use client::{OpenAiClient, SketchProvider};
pub use config::ProviderConfig;
pub use error::{ProviderError, ProviderResult};
pub use retry::{with_retry, RetryPolicy};
