//! # Redis
//!
//! Document store for registrations.
//!
//! Core purpose is to durably keep every accepted form submission. Nothing is ever read back,
//! updated, or deleted by the server.
//!
//! ## Requirements
//!
//! - One write per accepted submission
//! - No secondary indexes or derived views
//! - Server must keep answering liveness checks while Redis is down
//!
//! ## Implementation
//!
//! - Redis hash: 1 big key (`registrations`), then id-document pairs
//! - For ids: ULID string, unique per write and roughly time ordered
//! - For documents: record as camelCase JSON with an RFC 3339 `createdAt`
//! - `HSETNX` so an id can never overwrite an earlier document
//! - Connection manager is created once and shared, one retry per connection attempt
//!
//! ## Commands
//!
//! Dump all registrations.
//! ```sh
//! redis-cli HGETALL registrations
//! ```
use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::{
    models::RegistrationRecord,
    store::{RegistrationStore, StoreError},
};

pub const REGISTRATIONS_KEY: &str = "registrations";

pub struct RedisStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
}

impl RedisStore {
    pub fn open(redis_url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::open(redis_url)?,
            connection: OnceCell::new(),
        })
    }

    /// Shared connection, established on first use if startup could not reach Redis.
    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        self.connection
            .get_or_try_init(|| {
                let config = ConnectionManagerConfig::new().set_number_of_retries(1);
                self.client.get_connection_manager_with_config(config)
            })
            .await
            .cloned()
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl RegistrationStore for RedisStore {
    async fn insert(&self, record: &RegistrationRecord) -> Result<(), StoreError> {
        let document = document(record)?;
        let mut connection = self.connection().await?;

        let inserted: bool = connection
            .hset_nx(REGISTRATIONS_KEY, &record.id, document)
            .await?;

        if !inserted {
            return Err(StoreError::Duplicate(record.id.clone()));
        }

        debug!("Stored registration {}", record.id);

        Ok(())
    }
}

fn document(record: &RegistrationRecord) -> Result<String, StoreError> {
    Ok(serde_json::to_string(record)?)
}

pub async fn init_redis(redis_url: &str) -> Result<RedisStore, StoreError> {
    let store = RedisStore::open(redis_url)?;

    match store.connection().await {
        Ok(_) => info!("Redis connected"),
        Err(e) => error!("Redis connection error: {e}"),
    }

    Ok(store)
}
