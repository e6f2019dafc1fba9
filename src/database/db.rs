use async_trait::async_trait;
use log::info;
use mongodb::bson::doc;
use mongodb::{Client, Database, options::ClientOptions};
use serde::Serialize;

use super::{DocumentStore, RecordId, StoreError};
use crate::otp::model::OtpRecord;

/// OTP record as stored in MongoDB, keyed by the generated id
#[derive(Debug, Serialize)]
struct OtpDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(flatten)]
    record: OtpRecord,
}

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let mut client_options = ClientOptions::parse(uri).await?;
        client_options.app_name = Some("otp-issuer".to_string());

        let client = Client::with_options(client_options)?;

        // Ping the server to see if you can connect to the cluster
        client.database("admin").run_command(doc! {"ping": 1}).await?;

        info!("Connected successfully to MongoDB");

        Ok(Self {
            db: client.database(database),
        })
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn create(
        &self,
        collection_id: &str,
        document_id: &str,
        record: &OtpRecord,
    ) -> Result<RecordId, StoreError> {
        let document = OtpDocument {
            id: document_id.to_string(),
            record: record.clone(),
        };

        self.db
            .collection::<OtpDocument>(collection_id)
            .insert_one(document)
            .await?;

        Ok(document_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn document_keeps_record_fields_next_to_id() {
        let issued_at = Utc.with_ymd_and_hms(2025, 4, 23, 22, 0, 0).unwrap();
        let document = OtpDocument {
            id: "0f3c".to_string(),
            record: OtpRecord::new("u1", "123456", issued_at, chrono::Duration::seconds(30)),
        };

        let bson = mongodb::bson::to_document(&document).unwrap();
        assert_eq!(bson.get_str("_id").unwrap(), "0f3c");
        assert_eq!(bson.get_str("userId").unwrap(), "u1");
        assert_eq!(bson.get_str("otp").unwrap(), "123456");
        assert_eq!(bson.get_str("expireAt").unwrap(), "2025-04-23T22:00:30.000Z");
        assert!(!bson.contains_key("issuedAt"));
    }
}
