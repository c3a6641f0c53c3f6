//! Line assembly for the controller's response stream
//!
//! The serial link delivers arbitrary byte chunks. [`LineAssembler`] is a small
//! state machine that turns them into complete lines:
//! - `\n` terminates a line
//! - `\r` is dropped (controllers send `\r\n`)
//! - over-long lines are discarded up to the next `\n`
//! - lines that are not valid UTF-8 are discarded

use heapless::{String, Vec};

/// Maximum length of a received line
pub const MAX_LINE_LEN: usize = 128;

/// A complete received line, without terminator
pub type Line = String<MAX_LINE_LEN>;

/// Parsing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssembleState {
    /// Collecting bytes of the current line
    Collecting,
    /// Current line overflowed; skipping until the next newline
    Discarding,
}

/// Incremental byte-to-line assembler
#[derive(Debug, Clone)]
pub struct LineAssembler {
    state: AssembleState,
    buffer: Vec<u8, MAX_LINE_LEN>,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAssembler {
    /// Create a new assembler
    pub const fn new() -> Self {
        Self {
            state: AssembleState::Collecting,
            buffer: Vec::new(),
        }
    }

    /// Reset the assembler, dropping any partial line
    pub fn reset(&mut self) {
        self.state = AssembleState::Collecting;
        self.buffer.clear();
    }

    /// Feed a single byte
    ///
    /// Returns `Some(line)` when the byte completes a non-empty line.
    pub fn feed(&mut self, byte: u8) -> Option<Line> {
        match (self.state, byte) {
            (_, b'\r') => None,
            (AssembleState::Discarding, b'\n') => {
                self.reset();
                None
            }
            (AssembleState::Discarding, _) => None,
            (AssembleState::Collecting, b'\n') => {
                let line = core::str::from_utf8(&self.buffer)
                    .ok()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .and_then(|s| Line::try_from(s).ok());
                self.buffer.clear();
                line
            }
            (AssembleState::Collecting, _) => {
                if self.buffer.push(byte).is_err() {
                    self.buffer.clear();
                    self.state = AssembleState::Discarding;
                }
                None
            }
        }
    }
}
