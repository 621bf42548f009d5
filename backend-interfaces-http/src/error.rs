use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use backend_application::{ActionResult, AppError};

#[derive(Debug)]
pub enum HttpError {
    Unauthenticated(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    BadRequest(String),
    BadGateway(String),
    Internal(String),
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        let message = value.public_message();
        match value {
            AppError::Unauthenticated => HttpError::Unauthenticated(message),
            AppError::Forbidden(_) => HttpError::Forbidden(message),
            AppError::NotFound(_) => HttpError::NotFound(message),
            AppError::InvalidState(_) => HttpError::Conflict(message),
            AppError::Validation(_) => HttpError::BadRequest(message),
            AppError::ExternalFailure(_) => HttpError::BadGateway(message),
            AppError::Internal(err) => {
                error!("internal error: {:#}", err);
                HttpError::Internal(message)
            }
        }
    }
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            HttpError::Forbidden(_) => StatusCode::FORBIDDEN,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Conflict(_) => StatusCode::CONFLICT,
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            HttpError::Unauthenticated(msg)
            | HttpError::Forbidden(msg)
            | HttpError::NotFound(msg)
            | HttpError::Conflict(msg)
            | HttpError::BadRequest(msg)
            | HttpError::BadGateway(msg)
            | HttpError::Internal(msg) => msg,
        };
        (status, Json(ActionResult::<()>::failure(message))).into_response()
    }
}
