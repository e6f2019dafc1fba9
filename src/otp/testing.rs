//! Recording doubles for the store and mail collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::Mutex;

use crate::database::{DocumentStore, RecordId, StoreError};
use crate::otp::model::OtpRecord;
use crate::otp::service::OtpService;
use crate::utils::email::{DeliveryReceipt, MailError, MailSender, OutgoingMail};

pub fn test_service(store: Arc<RecordingStore>, mailer: Arc<RecordingMailer>) -> OtpService {
    OtpService::new(
        store,
        mailer,
        "otps".to_string(),
        "Leichtes Fahren <support@leichtesfahren.pro>".parse().unwrap(),
        Duration::seconds(30),
    )
}

#[derive(Default)]
pub struct RecordingStore {
    fail: bool,
    calls: Mutex<usize>,
    created: Mutex<Vec<(String, String, OtpRecord)>>,
}

impl RecordingStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub async fn create_calls(&self) -> usize {
        *self.calls.lock().await
    }

    pub async fn created(&self) -> Vec<(String, String, OtpRecord)> {
        self.created.lock().await.clone()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn create(
        &self,
        collection_id: &str,
        document_id: &str,
        record: &OtpRecord,
    ) -> Result<RecordId, StoreError> {
        *self.calls.lock().await += 1;

        if self.fail {
            return Err(StoreError::Rejected {
                status: 503,
                message: "database quota exceeded for project proj-internal".to_string(),
            });
        }

        self.created.lock().await.push((
            collection_id.to_string(),
            document_id.to_string(),
            record.clone(),
        ));
        Ok(document_id.to_string())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    unreachable: bool,
    reject_send: bool,
    verify_calls: Mutex<usize>,
    send_calls: Mutex<usize>,
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    /// Connection check fails
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    /// Connection check passes, the message is refused
    pub fn rejecting() -> Self {
        Self {
            reject_send: true,
            ..Default::default()
        }
    }

    pub async fn verify_calls(&self) -> usize {
        *self.verify_calls.lock().await
    }

    pub async fn send_calls(&self) -> usize {
        *self.send_calls.lock().await
    }

    pub async fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn verify_connection(&self) -> Result<(), MailError> {
        *self.verify_calls.lock().await += 1;

        if self.unreachable {
            return Err(MailError::Unreachable("smtp-relay.example.com".to_string()));
        }
        Ok(())
    }

    async fn send(&self, mail: OutgoingMail) -> Result<DeliveryReceipt, MailError> {
        *self.send_calls.lock().await += 1;

        if self.reject_send {
            let err = "not-an-address".parse::<lettre::Address>().unwrap_err();
            return Err(MailError::Address(err));
        }

        self.sent.lock().await.push(mail);
        Ok(DeliveryReceipt {
            smtp_code: "250".to_string(),
            message: "2.0.0 OK: queued".to_string(),
        })
    }
}
