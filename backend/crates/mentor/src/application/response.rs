//! `{data, error}` envelope returned by every public platform operation

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use kernel::error::kind::ErrorKind;
use serde::Serialize;

use crate::error::MentorError;

/// Caller-facing error payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
    pub action: Option<String>,
    pub retry_after_secs: Option<u64>,
}

impl From<&MentorError> for ServiceError {
    fn from(err: &MentorError) -> Self {
        let app = err.to_app_error();
        Self {
            kind: app.kind(),
            code: app.kind().code(),
            message: app.message().to_string(),
            action: app.action().map(str::to_string),
            retry_after_secs: app.retry_after_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceResponse<T> {
    pub data: Option<T>,
    pub error: Option<ServiceError>,
    #[serde(skip)]
    cause: Option<MentorError>,
}

impl<T> ServiceResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            cause: None,
        }
    }

    pub fn failed(err: MentorError) -> Self {
        Self {
            data: None,
            error: Some(ServiceError::from(&err)),
            cause: Some(err),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// The domain error behind `error`, for callers that branch on it
    pub fn cause(&self) -> Option<&MentorError> {
        self.cause.as_ref()
    }

    pub fn into_result(self) -> Result<T, MentorError> {
        match (self.data, self.cause) {
            (Some(data), None) => Ok(data),
            (_, Some(err)) => Err(err),
            (None, None) => Err(MentorError::Internal("empty service response".into())),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceResponse<U> {
        ServiceResponse {
            data: self.data.map(f),
            error: self.error,
            cause: self.cause,
        }
    }
}

impl<T> From<Result<T, MentorError>> for ServiceResponse<T> {
    fn from(result: Result<T, MentorError>) -> Self {
        match result {
            Ok(data) => ServiceResponse::ok(data),
            Err(err) => ServiceResponse::failed(err),
        }
    }
}

impl<T: Serialize> IntoResponse for ServiceResponse<T> {
    fn into_response(self) -> Response {
        let status = match &self.cause {
            Some(err) => StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            None => StatusCode::OK,
        };
        let retry_after = self.error.as_ref().and_then(|e| e.retry_after_secs);

        let mut response = (status, Json(self)).into_response();
        if let Some(secs) = retry_after
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}
