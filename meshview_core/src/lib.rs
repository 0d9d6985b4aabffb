/// Tracking of the currently loaded model
pub mod session;

///The primary pipeline and functions
pub mod pipeline;
pub mod prelude;
