//! Operator interaction traits

use core::future::Future;

/// Operator answer to a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PromptResponse {
    /// Operator finished the requested action
    Continue,
    /// Operator aborted the procedure
    Cancel,
}

/// Trait for blocking operator prompts
///
/// Every interactive procedure suspends on [`Prompt::show`] while the
/// operator jogs the machine by hand.
pub trait Prompt {
    /// Show a message and wait for continue or cancel
    fn show(&mut self, message: &str) -> impl Future<Output = PromptResponse>;
}

/// Trait for picking one of the candidate fiducials on the board preview
pub trait CandidatePicker {
    /// Show a message and wait for the operator to click a candidate
    ///
    /// Returns the candidate index, or `None` if the operator cancelled.
    fn pick(&mut self, message: &str) -> impl Future<Output = Option<usize>>;
}
