pub mod appwrite;
pub mod db;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{StoreBackend, StoreConfig};
use crate::otp::model::OtpRecord;

pub use appwrite::AppwriteStore;
pub use db::MongoStore;

/// Identifier the store assigned to a created record
pub type RecordId = String;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request to document store failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Document store rejected the record ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// System of record for issued codes. Records are create-only.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(
        &self,
        collection_id: &str,
        document_id: &str,
        record: &OtpRecord,
    ) -> Result<RecordId, StoreError>;
}

/// Build the configured store; MongoDB is pinged before it is returned
pub async fn connect_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let store: Arc<dyn DocumentStore> = match &config.backend {
        StoreBackend::Appwrite(appwrite) => {
            Arc::new(AppwriteStore::new(appwrite, &config.database_id))
        }
        StoreBackend::Mongo { uri } => {
            Arc::new(MongoStore::connect(uri, &config.database_id).await?)
        }
    };
    Ok(store)
}
