//! Infrastructure configuration modules.

pub mod execution;
pub mod fallback;
pub mod logging;
pub mod market;
pub mod reconnection;
pub mod settings;
pub mod strategy;
