// src/core/recognition/mod.rs
use thiserror::Error;

pub mod http;
pub mod matcher;
pub mod recognizer;
pub mod types;

pub use recognizer::{FaceRecognizer, RecognizerAdapter};
pub use types::{BoundingBox, Candidate, FaceProbe, RecognitionResult};

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
    #[error("Recognizer backend failed: {0}")]
    Backend(String),
    #[error("Invalid recognizer response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, RecognitionError>;
