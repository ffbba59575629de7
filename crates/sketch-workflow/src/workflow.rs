//! Workflow - the client-side coordination layer
//!
//! Drives one record → transcribe → prompt → image cycle over the
//! `AudioRecorder` and `SketchApi` seams, tracking the user-visible
//! `WorkflowState` and storing every failure as a readable message.

use crate::api::SketchApi;
use crate::recorder::AudioRecorder;
use crate::state::WorkflowState;
use crate::WorkflowError;
use std::time::Duration;
use tracing::{info, warn};

/// Bounded wait for the captured clip to materialize after stop. The capture
/// mechanism may deliver the recording slightly after the stop action.
#[derive(Debug, Clone)]
pub struct ClipWaitPolicy {
    /// How many times to poll `take_clip` before giving up (default: 10).
    pub attempts: u32,
    /// Delay between polls (default: 100ms).
    pub interval: Duration,
}

impl Default for ClipWaitPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_millis(100),
        }
    }
}

/// One user session's workflow. No sharing, no concurrent steps: every
/// network call is awaited to completion before the next begins.
pub struct Workflow<R: AudioRecorder, A: SketchApi> {
    recorder: R,
    api: A,
    clip_wait: ClipWaitPolicy,
    state: WorkflowState,
    /// Generated prompt, editable by the user; literal input to image
    /// generation whenever the user triggers it.
    prompt: String,
    /// Latest image reference; replaced wholesale on regeneration.
    image_url: Option<String>,
}

impl<R: AudioRecorder, A: SketchApi> Workflow<R, A> {
    pub fn new(recorder: R, api: A) -> Self {
        Self {
            recorder,
            api,
            clip_wait: ClipWaitPolicy::default(),
            state: WorkflowState::Idle,
            prompt: String::new(),
            image_url: None,
        }
    }

    pub fn with_clip_wait(mut self, clip_wait: ClipWaitPolicy) -> Self {
        self.clip_wait = clip_wait;
        self
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// User edit of the generated prompt.
    pub fn set_prompt(&mut self, text: impl Into<String>) {
        self.prompt = text.into();
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Begin capturing audio. Valid from `Idle` or `Error` (clears the error).
    pub fn start_recording(&mut self) {
        match self.state {
            WorkflowState::Idle | WorkflowState::Error(_) => {}
            _ => {
                warn!(state = ?self.state, "start_recording ignored: step in flight");
                return;
            }
        }
        match self.recorder.start() {
            Ok(()) => {
                info!("recording started");
                self.state = WorkflowState::Recording;
            }
            Err(e) => self.fail(e),
        }
    }

    /// Stop capturing and run transcription then prompt expansion, in
    /// sequence. On success the editable prompt is populated and the state
    /// returns to `Idle`; on any step's failure the state is `Error` and no
    /// partial result is kept.
    pub async fn stop_and_process(&mut self) {
        if self.state != WorkflowState::Recording {
            warn!(state = ?self.state, "stop_and_process ignored: not recording");
            return;
        }
        self.state = WorkflowState::ProcessingTranscriptAndPrompt;
        self.recorder.stop();

        let clip = match self.await_clip().await {
            Some(clip) => clip,
            None => {
                self.fail(WorkflowError::NoAudio);
                return;
            }
        };

        let transcript = match self.api.transcribe(&clip).await {
            Ok(t) => t,
            Err(e) => {
                self.fail(e);
                return;
            }
        };
        info!(transcript = %transcript, "transcription complete");

        match self.api.generate_prompt(&transcript).await {
            Ok(prompt) => {
                self.prompt = prompt;
                self.state = WorkflowState::Idle;
            }
            Err(e) => self.fail(e),
        }
    }

    /// Generate (or regenerate) an image from the current prompt text.
    /// Valid from `Idle` or `Error` (clears the error); requires a non-empty
    /// prompt. The previous image reference is replaced wholesale.
    pub async fn generate_image(&mut self) {
        match self.state {
            WorkflowState::Idle | WorkflowState::Error(_) => {}
            _ => {
                warn!(state = ?self.state, "generate_image ignored: step in flight");
                return;
            }
        }
        if self.prompt.trim().is_empty() {
            self.fail(WorkflowError::Api("No prompt to generate from".to_string()));
            return;
        }
        self.state = WorkflowState::Generating;
        match self.api.generate_image(&self.prompt).await {
            Ok(url) => {
                info!(image_url = %url, "image generated");
                self.image_url = Some(url);
                self.state = WorkflowState::Idle;
            }
            Err(e) => self.fail(e),
        }
    }

    /// Poll for the captured clip with the bounded wait policy.
    async fn await_clip(&mut self) -> Option<crate::recorder::AudioClip> {
        for _ in 0..self.clip_wait.attempts {
            if let Some(clip) = self.recorder.take_clip() {
                return Some(clip);
            }
            tokio::time::sleep(self.clip_wait.interval).await;
        }
        self.recorder.take_clip()
    }

    fn fail(&mut self, err: WorkflowError) {
        warn!(error = %err, "workflow step failed");
        self.state = WorkflowState::Error(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{AudioClip, ScriptedRecorder};
    use crate::WorkflowResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct MockApi {
        transcribe_calls: Arc<AtomicU32>,
        prompt_calls: Arc<AtomicU32>,
        image_calls: Arc<AtomicU32>,
        transcript: Option<String>,
        prompt: Option<String>,
        image_url: Option<String>,
    }

    impl MockApi {
        fn happy() -> Self {
            Self {
                transcript: Some("a red fox".to_string()),
                prompt: Some("a red fox in watercolor".to_string()),
                image_url: Some("https://images.example/fox.png".to_string()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl SketchApi for MockApi {
        async fn transcribe(&self, _clip: &AudioClip) -> WorkflowResult<String> {
            self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
            self.transcript
                .clone()
                .ok_or_else(|| WorkflowError::Api("Failed to transcribe audio".to_string()))
        }

        async fn generate_prompt(&self, _transcript: &str) -> WorkflowResult<String> {
            self.prompt_calls.fetch_add(1, Ordering::SeqCst);
            self.prompt
                .clone()
                .ok_or_else(|| WorkflowError::Api("Error generating prompt".to_string()))
        }

        async fn generate_image(&self, _prompt: &str) -> WorkflowResult<String> {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
            self.image_url
                .clone()
                .ok_or_else(|| WorkflowError::Api("Error generating image".to_string()))
        }
    }

    fn test_clip() -> AudioClip {
        AudioClip {
            bytes: vec![0u8; 64],
            mime_type: "audio/wav".to_string(),
            file_name: "recording.wav".to_string(),
        }
    }

    fn fast_wait() -> ClipWaitPolicy {
        ClipWaitPolicy {
            attempts: 3,
            interval: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn full_cycle_populates_prompt_then_image() {
        let api = MockApi::happy();
        let image_calls = Arc::clone(&api.image_calls);
        let mut wf = Workflow::new(ScriptedRecorder::with_clip(test_clip()), api)
            .with_clip_wait(fast_wait());

        wf.start_recording();
        assert_eq!(*wf.state(), WorkflowState::Recording);

        wf.stop_and_process().await;
        assert_eq!(*wf.state(), WorkflowState::Idle);
        assert_eq!(wf.prompt(), "a red fox in watercolor");
        assert!(wf.image_url().is_none());

        wf.generate_image().await;
        assert_eq!(*wf.state(), WorkflowState::Idle);
        assert_eq!(wf.image_url(), Some("https://images.example/fox.png"));
        assert_eq!(image_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clip_arriving_late_is_still_picked_up() {
        let mut recorder = ScriptedRecorder::with_clip(test_clip());
        recorder.polls_until_ready = 2;
        let mut wf = Workflow::new(recorder, MockApi::happy()).with_clip_wait(fast_wait());

        wf.start_recording();
        wf.stop_and_process().await;
        assert_eq!(*wf.state(), WorkflowState::Idle);
        assert_eq!(wf.prompt(), "a red fox in watercolor");
    }

    #[tokio::test]
    async fn missing_audio_fails_without_calling_the_api() {
        let api = MockApi::happy();
        let transcribe_calls = Arc::clone(&api.transcribe_calls);
        let prompt_calls = Arc::clone(&api.prompt_calls);
        let mut wf = Workflow::new(ScriptedRecorder::empty(), api).with_clip_wait(fast_wait());

        wf.start_recording();
        wf.stop_and_process().await;

        assert!(wf.state().is_error());
        assert!(wf
            .state()
            .error_message()
            .unwrap()
            .contains("No audio recording available"));
        assert_eq!(transcribe_calls.load(Ordering::SeqCst), 0);
        assert_eq!(prompt_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn prompt_failure_surfaces_the_endpoint_message() {
        let api = MockApi {
            transcript: Some("a red fox".to_string()),
            prompt: None,
            ..MockApi::default()
        };
        let mut wf =
            Workflow::new(ScriptedRecorder::with_clip(test_clip()), api).with_clip_wait(fast_wait());

        wf.start_recording();
        wf.stop_and_process().await;

        assert_eq!(
            wf.state().error_message(),
            Some("Error generating prompt")
        );
        // Partial result discarded: the prompt stays empty.
        assert_eq!(wf.prompt(), "");
    }

    #[tokio::test]
    async fn start_recording_clears_a_previous_error() {
        let mut wf = Workflow::new(ScriptedRecorder::empty(), MockApi::happy())
            .with_clip_wait(fast_wait());
        wf.start_recording();
        wf.stop_and_process().await;
        assert!(wf.state().is_error());

        wf.start_recording();
        assert_eq!(*wf.state(), WorkflowState::Recording);
    }

    #[tokio::test]
    async fn empty_prompt_refuses_image_generation_locally() {
        let api = MockApi::happy();
        let image_calls = Arc::clone(&api.image_calls);
        let mut wf = Workflow::new(ScriptedRecorder::empty(), api).with_clip_wait(fast_wait());

        wf.generate_image().await;
        assert!(wf.state().is_error());
        assert_eq!(image_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn regeneration_replaces_the_image_wholesale() {
        let mut wf = Workflow::new(ScriptedRecorder::empty(), MockApi::happy())
            .with_clip_wait(fast_wait());
        wf.set_prompt("a red fox in watercolor");

        wf.generate_image().await;
        assert_eq!(wf.image_url(), Some("https://images.example/fox.png"));

        // User edits then regenerates; only the latest reference is kept.
        wf.set_prompt("a red fox in oil paint");
        wf.generate_image().await;
        assert_eq!(wf.image_url(), Some("https://images.example/fox.png"));
        assert_eq!(*wf.state(), WorkflowState::Idle);
    }

    #[tokio::test]
    async fn image_failure_keeps_the_previous_reference() {
        let api = MockApi {
            image_url: None,
            ..MockApi::default()
        };
        let mut wf = Workflow::new(ScriptedRecorder::empty(), api).with_clip_wait(fast_wait());
        wf.set_prompt("a red fox in watercolor");
        wf.image_url = Some("https://images.example/old.png".to_string());

        wf.generate_image().await;
        assert_eq!(wf.state().error_message(), Some("Error generating image"));
        assert_eq!(wf.image_url(), Some("https://images.example/old.png"));
    }
}
