use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{DocumentStore, RecordId, StoreError};
use crate::config::AppwriteConfig;
use crate::otp::model::OtpRecord;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDocumentBody<'a> {
    document_id: &'a str,
    data: &'a OtpRecord,
}

#[derive(Deserialize)]
struct CreatedDocument {
    #[serde(rename = "$id")]
    id: String,
}

#[derive(Deserialize)]
struct AppwriteErrorBody {
    message: String,
}

/// Document store backed by the Appwrite databases REST API
pub struct AppwriteStore {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: String,
    database_id: String,
}

impl AppwriteStore {
    pub fn new(config: &AppwriteConfig, database_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            database_id: database_id.to_string(),
        }
    }

    fn documents_url(&self, collection_id: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection_id
        )
    }
}

#[async_trait]
impl DocumentStore for AppwriteStore {
    async fn create(
        &self,
        collection_id: &str,
        document_id: &str,
        record: &OtpRecord,
    ) -> Result<RecordId, StoreError> {
        let response = self
            .http
            .post(self.documents_url(collection_id))
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Key", &self.api_key)
            .json(&CreateDocumentBody {
                document_id,
                data: record,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&text),
            });
        }

        let created: CreatedDocument = response.json().await?;
        Ok(created.id)
    }
}

/// Appwrite answers errors with `{"message": ..., "code": ..., "type": ...}`
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<AppwriteErrorBody>(body)
        .map(|err| err.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn store(endpoint: &str) -> AppwriteStore {
        let config = AppwriteConfig {
            endpoint: endpoint.to_string(),
            project_id: "proj".to_string(),
            api_key: "key".to_string(),
        };
        AppwriteStore::new(&config, "main")
    }

    #[test]
    fn documents_url_ignores_trailing_slash() {
        assert_eq!(
            store("https://cloud.appwrite.io/v1/").documents_url("otps"),
            "https://cloud.appwrite.io/v1/databases/main/collections/otps/documents"
        );
    }

    #[test]
    fn request_body_wraps_record_in_data() {
        let issued_at = Utc.with_ymd_and_hms(2025, 4, 23, 22, 0, 0).unwrap();
        let record = OtpRecord::new("u1", "654321", issued_at, chrono::Duration::seconds(30));

        let body = serde_json::to_value(CreateDocumentBody {
            document_id: "abc",
            data: &record,
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "documentId": "abc",
                "data": {
                    "userId": "u1",
                    "otp": "654321",
                    "expireAt": "2025-04-23T22:00:30.000Z",
                }
            })
        );
    }

    #[test]
    fn rejection_message_prefers_appwrite_message() {
        let body = r#"{"message":"Collection with the requested ID could not be found.","code":404,"type":"collection_not_found"}"#;
        assert_eq!(
            rejection_message(body),
            "Collection with the requested ID could not be found."
        );
        assert_eq!(rejection_message("bad gateway"), "bad gateway");
    }
}
