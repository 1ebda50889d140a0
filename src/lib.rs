//! Recruit Intake — conversational lead-intake bot for a recruitment agency.
//!
//! Greets candidates on Telegram, collects a short profile (either a
//! single-message quick form or a guided multi-step dialogue), persists the
//! lead keyed by the Telegram user id, and hands the candidate off to a
//! human manager.

pub mod channels;
pub mod config;
pub mod error;
pub mod intake;
pub mod store;

pub use error::{Error, Result};
