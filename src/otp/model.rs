use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::utils::error::OtpError;

/// ISO-8601 with millisecond precision and a `Z` suffix
pub fn to_iso_millis(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_iso_millis<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&to_iso_millis(at))
}

/// An issued code as handed to the document store.
///
/// `issued_at` stays in memory; only `userId`, `otp` and `expireAt` are
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtpRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "otp")]
    pub code: String,
    #[serde(skip)]
    pub issued_at: DateTime<Utc>,
    #[serde(rename = "expireAt", serialize_with = "serialize_iso_millis")]
    pub expires_at: DateTime<Utc>,
}

impl OtpRecord {
    pub fn new(user_id: &str, code: &str, now: DateTime<Utc>, validity: Duration) -> Self {
        let issued_at = now.trunc_subsecs(3);
        Self {
            user_id: user_id.to_string(),
            code: code.to_string(),
            issued_at,
            expires_at: issued_at + validity,
        }
    }
}

/// Raw request body; presence is checked separately
#[derive(Debug, Default, Deserialize)]
pub struct IssueOtpRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub email: Option<String>,
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidIssueOtpRequest {
    pub user_id: String,
    pub email: String,
}

impl IssueOtpRequest {
    pub fn from_body(body: &[u8]) -> Result<Self, OtpError> {
        if body.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| OtpError::InvalidRequest(format!("malformed body: {}", e)))
    }

    pub fn validate(self) -> Result<ValidIssueOtpRequest, OtpError> {
        match (non_empty(self.user_id), non_empty(self.email)) {
            (Some(user_id), Some(email)) => Ok(ValidIssueOtpRequest { user_id, email }),
            (user_id, email) => {
                let mut missing = Vec::new();
                if user_id.is_none() {
                    missing.push("userId");
                }
                if email.is_none() {
                    missing.push("email");
                }
                Err(OtpError::InvalidRequest(format!(
                    "missing {}",
                    missing.join(" and ")
                )))
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueOtpResponse {
    pub success: bool,
    #[serde(rename = "expiresAt", serialize_with = "serialize_iso_millis")]
    pub expires_at: DateTime<Utc>,
}
