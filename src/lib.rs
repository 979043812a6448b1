//! Encounter Sim - Conversation simulation engine for communication training
//!
//! A trainee converses with a model-voiced persona defined by a vignette.
//! Each turn the engine assesses the trainee's message against a rubric,
//! updates the persona's emotional state, advances the scenario's phases,
//! and asks a model backend for the persona's reply.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
