//! Ambimix engine.
//!
//! Drives a [`Session`] over the core mixer, the preset store, and the
//! sleep timer, against pluggable audio output and level input ports.

pub mod error;
pub mod input;
pub mod output;
pub mod runtime;
pub mod session;

#[cfg(test)]
mod testing;

pub use error::{EngineError, EngineResult};
pub use input::{LevelInput, SliderLevels};
pub use output::{AudioOutput, PlayError, PlayFuture};
pub use runtime::{SessionHandle, SessionRuntime};
pub use session::{PendingPlay, Reply, Session};
