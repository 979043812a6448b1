//! Application layer - Commands and Handlers.
//!
//! Each handler loads what it needs through ports, runs the domain operation,
//! and persists the outcome.

pub mod handlers;

pub use handlers::{
    EndSessionCommand, EndSessionError, EndSessionHandler, EndSessionResult,
    NarrateVoiceLineCommand, NarrateVoiceLineError, NarrateVoiceLineHandler, SendMessageCommand,
    SendMessageError, SendMessageHandler, SendMessageResult, StartSessionCommand,
    StartSessionError, StartSessionHandler, StartSessionResult,
};
