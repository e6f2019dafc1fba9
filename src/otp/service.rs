use std::sync::Arc;

use actix_web::http::Method;
use chrono::{Duration, Utc};
use lettre::message::Mailbox;
use log::{error, info, warn};
use uuid::Uuid;

use crate::database::DocumentStore;
use crate::otp::model::{IssueOtpRequest, IssueOtpResponse, OtpRecord, to_iso_millis};
use crate::utils::email::{MailSender, verification_mail};
use crate::utils::error::OtpError;
use crate::utils::helpers::generate_otp_code;

/// Only POST issues codes; checked before the body is read or parsed
pub fn ensure_post(method: &Method) -> Result<(), OtpError> {
    if *method != Method::POST {
        warn!("Rejected {} request to send-otp", method);
        return Err(OtpError::MethodNotAllowed(method.to_string()));
    }
    Ok(())
}

/// Issues codes: validate, generate, store, then mail.
///
/// Holds no per-request state; one instance is shared by all workers.
pub struct OtpService {
    store: Arc<dyn DocumentStore>,
    mailer: Arc<dyn MailSender>,
    collection_id: String,
    sender: Mailbox,
    validity: Duration,
}

impl OtpService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn MailSender>,
        collection_id: String,
        sender: Mailbox,
        validity: Duration,
    ) -> Self {
        OtpService {
            store,
            mailer,
            collection_id,
            sender,
            validity,
        }
    }

    pub async fn issue_otp(
        &self,
        method: &Method,
        body: &[u8],
    ) -> Result<IssueOtpResponse, OtpError> {
        ensure_post(method)?;

        let request = IssueOtpRequest::from_body(body)
            .and_then(IssueOtpRequest::validate)
            .inspect_err(|e| warn!("Rejected send-otp request: {}", e))?;

        let code = generate_otp_code();
        let record = OtpRecord::new(&request.user_id, &code, Utc::now(), self.validity);
        let document_id = Uuid::new_v4().simple().to_string();

        // Delivery is only attempted for a code that was persisted
        let record_id = self
            .store
            .create(&self.collection_id, &document_id, &record)
            .await
            .inspect_err(|e| error!("Failed to store OTP for user {}: {}", request.user_id, e))?;
        info!(
            "Stored OTP {} for user {}, valid until {}",
            record_id,
            request.user_id,
            to_iso_millis(&record.expires_at)
        );

        // The stored record is kept even if delivery fails below
        self.deliver(&request.email, &record).await.inspect_err(|e| {
            error!("Failed to deliver OTP {} for user {}: {}", record_id, request.user_id, e)
        })?;

        Ok(IssueOtpResponse {
            success: true,
            expires_at: record.expires_at,
        })
    }

    async fn deliver(&self, email: &str, record: &OtpRecord) -> Result<(), OtpError> {
        self.mailer.verify_connection().await?;
        info!("SMTP connection verified");

        let mail = verification_mail(&self.sender, email, &record.code, record.expires_at);
        let receipt = self.mailer.send(mail).await?;
        info!(
            "OTP mail accepted by relay: smtp {} {}",
            receipt.smtp_code, receipt.message
        );

        Ok(())
    }
}
