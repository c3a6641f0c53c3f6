//! Controller link implementations

pub mod serial;

pub use serial::{LineReader, SerialTransport};
