//! Adaptive question selection: session phases, skill statistics, feature
//! encoding, the logistic scoring model and the two selection policies.

pub mod config;
pub mod engine;
pub mod features;
pub mod model;
pub mod policy;
pub mod session;
pub mod stats;
pub mod types;

pub use config::SelectionConfig;
pub use engine::SelectionEngine;
pub use model::{LogisticModel, ModelError, ModelHandle};
pub use session::SessionStore;
