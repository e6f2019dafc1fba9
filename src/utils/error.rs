use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::database::StoreError;
use crate::utils::email::MailError;

/// Per-request failures of the OTP pipeline.
///
/// `Display` carries the full detail for the server log. Clients only ever
/// see the fixed text from [`OtpError::public_message`].
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("Method Not Allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Storage Failure: {0}")]
    StorageFailure(#[from] StoreError),

    #[error("Delivery Failure: {0}")]
    DeliveryFailure(#[from] MailError),
}

impl OtpError {
    pub fn public_message(&self) -> &'static str {
        match self {
            OtpError::MethodNotAllowed(..) => "Only POST is allowed",
            OtpError::InvalidRequest(..) => "userId or email is missing",
            OtpError::StorageFailure(..) | OtpError::DeliveryFailure(..) => {
                "Failed to send OTP"
            }
        }
    }
}

impl ResponseError for OtpError {
    fn status_code(&self) -> StatusCode {
        match *self {
            OtpError::MethodNotAllowed(..) => StatusCode::METHOD_NOT_ALLOWED,
            OtpError::InvalidRequest(..) => StatusCode::BAD_REQUEST,
            OtpError::StorageFailure(..) => StatusCode::INTERNAL_SERVER_ERROR,
            OtpError::DeliveryFailure(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": self.public_message(),
            "httpStatusCode": status_code.as_u16(),
        }))
    }
}
