use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::media::MANIFEST_FILENAME;
use crate::services::{AuthService, ManifestService, MediaStorage, SeaOrmAuthService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub media: Arc<MediaStorage>,

    pub manifest: Arc<ManifestService>,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let media_root = config.media_root();
        let media = Arc::new(MediaStorage::new(&media_root));
        media.ensure_dir().await?;

        let manifest = Arc::new(ManifestService::new(
            media_root.join(MANIFEST_FILENAME),
            config.media.default_timezone.clone(),
        ));

        let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            media,
            manifest,
            auth_service,
        })
    }
}
