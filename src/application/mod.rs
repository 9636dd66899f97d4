// Application layer - use cases and orchestration.
// The recorder validates incoming expenses, the service ties validation,
// splitting and persistence together for every client (HTTP, CLI).

pub mod error;
pub mod recorder;
pub mod reporting;
pub mod service;

pub use error::*;
pub use recorder::*;
pub use reporting::*;
pub use service::*;
