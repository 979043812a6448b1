//! Application handlers.
//!
//! Command handlers that orchestrate the engine between the vignette store,
//! the session repository, and the speech service.

pub mod simulation;

pub use simulation::{
    EndSessionCommand, EndSessionError, EndSessionHandler, EndSessionResult,
    NarrateVoiceLineCommand, NarrateVoiceLineError, NarrateVoiceLineHandler, SendMessageCommand,
    SendMessageError, SendMessageHandler, SendMessageResult, StartSessionCommand,
    StartSessionError, StartSessionHandler, StartSessionResult,
};
