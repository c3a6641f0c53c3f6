//! Channel-backed operator interaction
//!
//! The engine side holds a [`ChannelPrompt`] or [`ChannelPicker`]; the UI side
//! holds a reference to the same [`UiLink`] and loops on
//! [`UiLink::next_request`] / [`UiLink::answer`]. Each link carries one
//! outstanding question at a time.
//!
//! ```text
//! engine ── show("Center the camera…") ──▶ requests ──▶ UI
//! engine ◀──────── Continue / Cancel ◀──── answers ◀── UI
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use dabber_core::traits::{CandidatePicker, Prompt, PromptResponse};

/// Maximum prompt length; longer messages are truncated
pub const PROMPT_LEN: usize = 96;

/// Prompt text as delivered to the UI
pub type PromptText = heapless::String<PROMPT_LEN>;

/// Request/answer channel pair between the engine and a UI task
pub struct UiLink<M: RawMutex, A> {
    requests: Channel<M, PromptText, 1>,
    answers: Channel<M, A, 1>,
}

/// Link carrying continue/cancel answers
pub type PromptLink<M> = UiLink<M, PromptResponse>;

/// Link carrying candidate picks (`None` = cancelled)
pub type PickerLink<M> = UiLink<M, Option<usize>>;

impl<M: RawMutex, A> UiLink<M, A> {
    pub const fn new() -> Self {
        Self {
            requests: Channel::new(),
            answers: Channel::new(),
        }
    }

    /// UI side: wait for the engine's next question
    pub async fn next_request(&self) -> PromptText {
        self.requests.receive().await
    }

    /// UI side: answer the current question
    pub async fn answer(&self, answer: A) {
        self.answers.send(answer).await;
    }

    /// Engine side: ask and wait for the answer
    async fn ask(&self, message: &str) -> A {
        // Drop an answer the UI sent with no question pending
        let _ = self.answers.try_receive();
        self.requests.send(truncated(message)).await;
        self.answers.receive().await
    }
}

impl<M: RawMutex, A> Default for UiLink<M, A> {
    fn default() -> Self {
        Self::new()
    }
}

fn truncated(message: &str) -> PromptText {
    let mut text = PromptText::new();
    for c in message.chars() {
        if text.push(c).is_err() {
            break;
        }
    }
    text
}

/// [`Prompt`] answered through a [`PromptLink`]
pub struct ChannelPrompt<'a, M: RawMutex> {
    link: &'a PromptLink<M>,
}

impl<'a, M: RawMutex> ChannelPrompt<'a, M> {
    pub fn new(link: &'a PromptLink<M>) -> Self {
        Self { link }
    }
}

impl<M: RawMutex> Prompt for ChannelPrompt<'_, M> {
    async fn show(&mut self, message: &str) -> PromptResponse {
        debug!("prompt: {}", message);
        self.link.ask(message).await
    }
}

/// [`CandidatePicker`] answered through a [`PickerLink`]
pub struct ChannelPicker<'a, M: RawMutex> {
    link: &'a PickerLink<M>,
}

impl<'a, M: RawMutex> ChannelPicker<'a, M> {
    pub fn new(link: &'a PickerLink<M>) -> Self {
        Self { link }
    }
}

impl<M: RawMutex> CandidatePicker for ChannelPicker<'_, M> {
    async fn pick(&mut self, message: &str) -> Option<usize> {
        debug!("pick: {}", message);
        self.link.ask(message).await
    }
}
