pub mod payload;
pub mod request;

pub use payload::{AngleSequence, FilteredSinogram, SinogramOrientation, SinogramPayload};
pub use request::{ReconFailure, ReconRequest, ReconResponse};
