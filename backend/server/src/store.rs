use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{RegistrationRecord, Violations};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Rejected(#[from] Violations),

    #[error("{0}")]
    Redis(#[from] redis::RedisError),

    #[error("Invalid registration document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("Registration {0} already exists")]
    Duplicate(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only collection of registration records.
#[async_trait]
pub trait RegistrationStore: Send + Sync + 'static {
    async fn insert(&self, record: &RegistrationRecord) -> Result<(), StoreError>;
}

/// In-process store, used by tests and local runs without Redis.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<RegistrationRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<RegistrationRecord> {
        self.records
            .read()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn insert(&self, record: &RegistrationRecord) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        records.push(record.clone());

        Ok(())
    }
}
