//! stepwise - chain-of-thought reasoning over chat completion endpoints
//!
//! Asks a model for its reasoning one titled step at a time, feeding each step
//! back into the conversation, then requests a final answer.

pub mod config;
pub mod llm;
pub mod reasoning;
pub mod render;

pub use config::{ConfigError, ConfigLayer, LlmConfig, SessionLimits, Settings};
pub use reasoning::{Reasoner, SessionResult, SessionStream, StepRecord};
