//! Reasoning Lab: explore, experiment and find scientific solutions.
//!
//! Three independent workflows share one interactive session:
//! arXiv search, PDF analysis on the fast model, and hypothetical experiment
//! generation on the deep-reasoning model.

pub mod ai_client;
pub mod analysis;
pub mod error;
pub mod experiment;
pub mod logging;
pub mod papers;
pub mod session;
pub mod settings;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{LabError, LabResult};
pub use session::{LabServices, LabSession, MenuChoice, SessionState, UiEvent, View};
