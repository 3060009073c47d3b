// tests/integration/main.rs
#[path = "../common/mod.rs"]
mod common;

mod attendance_tests;
mod orchestrator_tests;
mod pipeline_tests;
mod registry_tests;
