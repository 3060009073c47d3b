// src/core/mod.rs
pub mod attendance;
pub mod identity;
pub mod recognition;
