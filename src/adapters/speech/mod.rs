//! Speech Adapters
//!
//! Audio synthesis is an external service; only the in-process stand-in
//! lives here.

mod mock;

pub use mock::{MockSpeechSynthesizer, SynthesisCall};
