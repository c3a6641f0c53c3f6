//! Collaborator traits
//!
//! These traits define the interface between the engine and the outside
//! world: the motion controller link, the camera, the operator, and time.
//! Methods that wait on hardware or a person return futures; the engine
//! never runs two of them at once.

pub mod clock;
pub mod prompt;
pub mod transport;
pub mod vision;

pub use clock::Clock;
pub use prompt::{CandidatePicker, Prompt, PromptResponse};
pub use transport::{MachinePosition, Transport, TransportError};
pub use vision::{PixelPoint, Vision, VisionError};
