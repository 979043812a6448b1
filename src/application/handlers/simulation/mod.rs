//! Simulation command handlers.

mod end_session;
mod narrate_voice_line;
mod send_message;
mod start_session;

pub use end_session::{EndSessionCommand, EndSessionError, EndSessionHandler, EndSessionResult};
pub use narrate_voice_line::{
    NarrateVoiceLineCommand, NarrateVoiceLineError, NarrateVoiceLineHandler,
};
pub use send_message::{
    SendMessageCommand, SendMessageError, SendMessageHandler, SendMessageResult,
};
pub use start_session::{
    StartSessionCommand, StartSessionError, StartSessionHandler, StartSessionResult,
};
