use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::{
    accounts::{StoreError, UniqueField},
    response::ApiResponse,
};

pub const CONFLICT_MESSAGE: &str = "User already exists with this email or username.";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("conflict on {0}")]
    Conflict(UniqueField),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("no valid session")]
    Unauthorized,
    #[error("sign-in denied by provider policy")]
    ProviderDenied,
    #[error("store failure: {0}")]
    StoreFailure(#[source] StoreError),
    #[error("internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(field) => AuthError::Conflict(field),
            other => AuthError::StoreFailure(other),
        }
    }
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidInput(_) | AuthError::Conflict(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::ProviderDenied => StatusCode::FORBIDDEN,
            AuthError::StoreFailure(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. Server-side failures stay opaque.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::InvalidInput(msg) => msg.clone(),
            AuthError::Conflict(_) => CONFLICT_MESSAGE.into(),
            AuthError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.into(),
            AuthError::Unauthorized => "Unauthorized".into(),
            AuthError::ProviderDenied => "Access denied".into(),
            AuthError::StoreFailure(_) | AuthError::Internal(_) => {
                "Internal Server Error.".into()
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        ApiResponse::error(status, self.public_message()).into_response()
    }
}
