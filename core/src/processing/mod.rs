pub mod backproject;
pub mod buffer_pool;
pub mod filter;
pub mod ingest;
pub mod kernel;
pub mod postprocess;

pub use backproject::BackProjectorStage;
pub use buffer_pool::BufferPool;
pub use filter::ProjectionFilterStage;
pub use ingest::IngestStage;
pub use kernel::{FilterKernel, FilterKind};
pub use postprocess::PostProcessStage;
