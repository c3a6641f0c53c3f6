//! Job execution
//!
//! Three ways through a board:
//!
//! - **Learning**: [`Engine::advance_to_next`](crate::Engine::advance_to_next)
//!   steps pad by pad while the operator watches, timing each pad.
//! - **Automated**: [`Engine::run_automated`](crate::Engine::run_automated)
//!   replays the remaining pads holding each for the learned average.
//! - **Unattended**: [`Engine::run_job`](crate::Engine::run_job) sends one
//!   fire-and-forget batch per pad with a fixed or area-scaled amount.

pub mod dispense;
pub mod phase;
pub mod run;
pub mod state;

pub use dispense::{dispense_amount, pad_batch};
pub use phase::{RunEvent, RunPhase};
pub use run::RunReport;
pub use state::JobRunState;
