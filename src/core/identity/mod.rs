// src/core/identity/mod.rs
pub mod registry;
pub mod types;

pub use registry::IdentityRegistry;
pub use types::{ContactInfo, IdentityId, IdentityRecord, IdentitySnapshot, KnownIdentity};
