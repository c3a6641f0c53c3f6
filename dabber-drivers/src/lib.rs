//! Concrete collaborators for the Dabber engine
//!
//! - [`transport::SerialTransport`]: line-based G-code link over any
//!   `embedded-io-async` byte stream, with `ok`/`busy` handling and timeouts
//! - [`prompt`]: channel-backed operator prompt and candidate picker, so a UI
//!   task can answer the engine's questions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate alloc;
#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod prompt;
pub mod transport;

pub use prompt::{ChannelPicker, ChannelPrompt, PickerLink, PromptLink, PromptText, UiLink};
pub use transport::SerialTransport;
