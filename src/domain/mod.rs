//! Domain layer containing simulation logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, error codes, state machines)
//! - `vignette` - Authored scenario configuration and its validation
//! - `simulation` - Session state and the conversation engine

pub mod foundation;
pub mod simulation;
pub mod vignette;
