//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! business logic: configuration, exchange wiring and runtime orchestration.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Market group construction and slug resolution
//! - [`config`] - Configuration loading and validation
//! - [`exchange`] - Adapter factory and the reconnecting stream wrapper
//! - [`orchestration`] - The engine and its long-running tasks

pub mod bootstrap;
pub mod config;
pub mod exchange;
pub mod orchestration;
