//! Mapping of engine errors and unreadable bodies onto HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use deployd_engine::DeployError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// JSON body of every error response.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub details: Vec<String>,
}

/// A failure on its way out of a handler.
#[derive(Debug)]
pub enum ApiError {
    /// The engine refused or failed the operation.
    Engine(DeployError),
    /// The request body was not a readable JSON document of the expected shape.
    Body(JsonRejection),
}

impl From<DeployError> for ApiError {
    fn from(err: DeployError) -> Self {
        Self::Engine(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Engine(e) if e.is_validation_failure() => StatusCode::BAD_REQUEST,
            Self::Engine(DeployError::UnknownPlan { .. }) => StatusCode::NOT_FOUND,
            Self::Engine(DeployError::FilterService(_) | DeployError::ComponentService(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Body(JsonRejection::MissingJsonContentType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::Body(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::Engine(e) => ErrorBody {
                error: e.to_string(),
                details: e.details().to_vec(),
            },
            Self::Body(rejection) => ErrorBody {
                error: format!("malformed request body: {}", rejection.body_text()),
                details: Vec::new(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.body();
        if status.is_server_error() {
            error!(%status, error = %body.error, "request failed");
        } else {
            warn!(%status, error = %body.error, "request rejected");
        }
        (status, Json(body)).into_response()
    }
}
