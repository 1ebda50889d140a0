//! Lead intake — validators, dialogue state machine, and rendering.

pub mod engine;
pub mod messages;
pub mod model;
pub mod session;
pub mod step;
pub mod validate;

pub use engine::IntakeEngine;
pub use model::{LeadProfile, LeadRecord};
pub use session::{MemorySessionStore, SessionState, SessionStore};
pub use step::DialogueStep;
