use std::sync::Arc;

use anyhow::Result;

use super::{
    config::Config,
    database::init_redis,
    sheets::{SheetMirror, SheetsClient},
    store::RegistrationStore,
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn RegistrationStore>,
    pub mirror: Arc<dyn SheetMirror>,
}

impl State {
    pub async fn new() -> Result<Arc<Self>> {
        let config = Config::load()?;

        let store = init_redis(&config.redis_url).await?;
        let mirror = SheetsClient::new(config.sheets_url.clone());

        Ok(Self::with_parts(config, Arc::new(store), Arc::new(mirror)))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn RegistrationStore>,
        mirror: Arc<dyn SheetMirror>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            mirror,
        })
    }
}
