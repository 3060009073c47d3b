// src/services/mod.rs
pub mod orchestrator;

pub use orchestrator::{Orchestrator, ReconcileSummary, WorkerStatus};
