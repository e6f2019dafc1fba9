use actix_web::{HttpRequest, HttpResponse, web};
use log::info;

use crate::otp::service::{OtpService, ensure_post};
use crate::utils::error::OtpError;

/// Same ceiling actix applies to `web::Bytes`
pub const BODY_LIMIT: usize = 256 * 1024;

pub async fn send_otp(
    req: HttpRequest,
    payload: web::Payload,
    otp_service: web::Data<OtpService>,
) -> Result<HttpResponse, OtpError> {
    info!("send-otp called");

    // The payload stays unread until the method is accepted
    ensure_post(req.method())?;

    let body = payload
        .to_bytes_limited(BODY_LIMIT)
        .await
        .map_err(|_| OtpError::InvalidRequest(format!("body exceeds {} bytes", BODY_LIMIT)))?
        .map_err(|e| OtpError::InvalidRequest(format!("failed to read body: {}", e)))?;

    let issued = otp_service.issue_otp(req.method(), &body).await?;

    Ok(HttpResponse::Ok().json(issued))
}
