//! The stateful pieces driven by the engine: the countdown, the completion
//! responder, and the alert synthesizer.

pub mod alert;
pub mod countdown;
pub mod responder;
#[cfg(feature = "audio")]
pub mod rodio_output;
