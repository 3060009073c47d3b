// src/core/attendance/mod.rs
pub mod deduplicator;
pub mod recorder;
pub mod types;

pub use deduplicator::{Admission, Deduplicator, EntryWindow, RejectReason};
pub use recorder::AttendanceRecorder;
pub use types::{AttendanceEvent, Classification, RecordId};
