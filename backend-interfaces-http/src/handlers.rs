pub mod notification_handlers;
pub mod ops_handlers;
pub mod payout_handlers;
pub mod refund_handlers;
pub mod review_handlers;
pub mod webhook_handlers;

pub use notification_handlers::*;
pub use ops_handlers::*;
pub use payout_handlers::*;
pub use refund_handlers::*;
pub use review_handlers::*;
pub use webhook_handlers::*;

use axum::Json;

use backend_application::{ActionResult, AppError};

use crate::error::HttpError;

pub(crate) type Envelope<T> = Result<Json<ActionResult<T>>, HttpError>;

pub(crate) fn envelope<T>(result: Result<T, AppError>) -> Envelope<T> {
    result.map(|data| Json(ActionResult::ok(data))).map_err(HttpError::from)
}

pub(crate) fn envelope_message<T>(result: Result<T, AppError>, message: &str) -> Envelope<T> {
    result
        .map(|data| Json(ActionResult::ok_with_message(data, message)))
        .map_err(HttpError::from)
}

/// Success without a payload, for deletions.
pub(crate) fn done(result: Result<(), AppError>, message: &str) -> Envelope<()> {
    result
        .map(|_| {
            Json(ActionResult {
                success: true,
                message: Some(message.to_string()),
                data: None,
            })
        })
        .map_err(HttpError::from)
}
