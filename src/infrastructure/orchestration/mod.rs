//! Runtime wiring and lifecycle management.

pub mod engine;
mod feed;
mod status;

pub use engine::{Engine, EnginePorts};
