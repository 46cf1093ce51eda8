//! Core numeric pipeline for the Rust CT reconstruction platform.
//!
//! The modules mirror the classical filtered back-projection chain while
//! providing safe abstractions, scoped buffers, and well-defined processing
//! stages.

pub mod api_interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use prelude::{ProcessingStage, StageMetadata, StageOutput};
