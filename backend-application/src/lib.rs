// Backend Application Layer

pub mod commands;
pub mod dispatcher;
pub mod dtos;
pub mod error;
pub mod guard;
pub mod inflight;
pub mod metrics;
pub mod queries;
pub mod response;
pub mod state;

pub use error::AppError;
pub use metrics::Metrics;
pub use response::ActionResult;
pub use state::AppState;
