pub mod bridge;
pub mod model;

pub use bridge::ApiBridge;
pub use model::ReconModel;
